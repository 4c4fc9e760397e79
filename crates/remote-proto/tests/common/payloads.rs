#![allow(dead_code)]

//! Trimmed-down backend responses, shaped like the real queue and search
//! answers but with only the fields the normalizer reads.

use serde_json::{json, Value};

pub fn artist_run(text: &str) -> Value {
    json!({
        "text": text,
        "navigationEndpoint": { "browseEndpoint": {
            "browseId": format!("UC-{}", text),
            "browseEndpointContextSupportedConfigs": {
                "browseEndpointContextMusicConfig": { "pageType": "MUSIC_PAGE_TYPE_ARTIST" }
            }
        }}
    })
}

pub fn plain_run(text: &str) -> Value {
    json!({ "text": text })
}

/// A queue entry as the player's queue endpoint returns it.
pub fn panel_video(video_id: &str, title: &str, artist: &str, selected: bool) -> Value {
    json!({
        "playlistPanelVideoRenderer": {
            "title": { "runs": [{ "text": title }] },
            "longBylineText": { "runs": [artist_run(artist), plain_run(" • "), plain_run("Album"), plain_run(" • "), plain_run("2019")] },
            "thumbnail": { "thumbnails": [
                { "url": format!("https://i.ytimg.com/vi/{}/sddefault.jpg", video_id), "width": 640 }
            ]},
            "lengthText": { "runs": [{ "text": "3:30" }] },
            "selected": selected,
            "navigationEndpoint": { "watchEndpoint": { "videoId": video_id, "playlistId": "RDAMVM" } },
            "videoId": video_id,
            "playlistSetVideoId": format!("set-{}", video_id)
        }
    })
}

/// The same entry wrapped the way queues with alternate versions report it.
pub fn wrapped_panel_video(video_id: &str, title: &str, artist: &str, selected: bool) -> Value {
    let primary = panel_video(video_id, title, artist, selected);
    let counterpart = panel_video(&format!("{}-alt", video_id), &format!("{} (Video)", title), artist, false);
    json!({
        "playlistPanelVideoWrapperRenderer": {
            "primaryRenderer": primary,
            "counterpart": [{
                "counterpartRenderer": counterpart,
                "segmentMap": {}
            }]
        }
    })
}

pub fn queue_payload(items: Vec<Value>) -> Value {
    json!({
        "items": items,
        "autoPlaying": false,
        "chip": null
    })
}

/// A search result row.
pub fn list_item(video_id: &str, title: &str, subtitle_runs: Vec<Value>) -> Value {
    json!({
        "musicResponsiveListItemRenderer": {
            "thumbnail": { "musicThumbnailRenderer": { "thumbnail": { "thumbnails": [
                { "url": format!("https://lh3.googleusercontent.com/{}=w60-h60", video_id), "width": 60 },
                { "url": format!("https://lh3.googleusercontent.com/{}=w120-h120", video_id), "width": 120 }
            ]}}},
            "overlay": { "musicItemThumbnailOverlayRenderer": { "content": { "musicPlayButtonRenderer": {
                "playNavigationEndpoint": { "watchEndpoint": { "videoId": video_id } }
            }}}},
            "flexColumns": [
                { "musicResponsiveListItemFlexColumnRenderer": { "text": { "runs": [{ "text": title }] } } },
                { "musicResponsiveListItemFlexColumnRenderer": { "text": { "runs": subtitle_runs } } }
            ],
            "playlistItemData": { "videoId": video_id }
        }
    })
}

/// An artist card in search results: a list item with no playable id.
pub fn artist_card(name: &str) -> Value {
    json!({
        "musicResponsiveListItemRenderer": {
            "flexColumns": [
                { "musicResponsiveListItemFlexColumnRenderer": { "text": { "runs": [{ "text": name }] } } },
                { "musicResponsiveListItemFlexColumnRenderer": { "text": { "runs": [{ "text": "Artist" }] } } }
            ],
            "navigationEndpoint": { "browseEndpoint": { "browseId": "UC-card" } }
        }
    })
}

/// Search response with results buried in tabs and shelves.
pub fn search_payload(rows: Vec<Value>) -> Value {
    json!({
        "contents": {
            "tabbedSearchResultsRenderer": {
                "tabs": [{
                    "tabRenderer": {
                        "title": "YT Music",
                        "selected": true,
                        "content": { "sectionListRenderer": { "contents": [
                            { "musicShelfRenderer": { "title": { "runs": [{ "text": "Songs" }] }, "contents": rows } }
                        ]}}
                    }
                }]
            }
        },
        "trackingParams": "abc"
    })
}
