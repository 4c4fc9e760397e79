mod common;

use common::payloads::{
    artist_card, artist_run, list_item, panel_video, plain_run, queue_payload, search_payload,
    wrapped_panel_video,
};
use remote_proto::normalize::{normalize, normalize_with_strategy, NormalizeStrategy};
use remote_proto::protocol::{QueueStatus, QueueView};
use remote_proto::queue::{
    reconcile, resolve_active_index, resolve_with_strategy, PlaybackObservation, QueueViewState,
    ResolveStrategy, EMPTY_FINGERPRINT,
};
use serde_json::{json, Value};

fn observation(id: &str, title: &str, artist: &str) -> PlaybackObservation {
    PlaybackObservation {
        identifier: id.into(),
        title: title.into(),
        artist: artist.into(),
    }
}

/// One full poll: normalize, resolve, reconcile.
fn poll(payload: &Value, obs: Option<&PlaybackObservation>, state: &mut QueueViewState) -> (bool, QueueView) {
    let tracks = normalize(payload);
    let active = resolve_active_index(&tracks, obs, payload);
    let r = reconcile(&tracks, active, state);
    (r.changed, QueueView::from_reconciliation(1, &r))
}

#[test]
fn test_two_entry_queue_with_selection() {
    let payload = json!({
        "items": [
            { "playlistPanelVideoRenderer": { "videoId": "abc", "selected": true, "title": { "simpleText": "Song A" } } },
            { "playlistPanelVideoRenderer": { "videoId": "def", "title": { "simpleText": "Song B" } } }
        ]
    });

    let tracks = normalize(&payload);
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].title, "Song A");
    assert!(tracks[0].is_selected);
    assert!(!tracks[1].is_selected);

    let active = resolve_active_index(&tracks, None, &payload);
    assert_eq!(active, Some(0));

    let r = reconcile(&tracks, active, &mut QueueViewState::new());
    assert!(r.changed);
    assert_eq!(r.start, 0);
    assert_eq!(r.visible.len(), 2);
}

#[test]
fn test_search_artist_runs_joined() {
    let payload = search_payload(vec![list_item(
        "vid00000001",
        "Collab",
        vec![artist_run("Artist X"), plain_run(" & "), artist_run("Artist Y")],
    )]);

    let tracks = normalize(&payload);
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].artist, "Artist X, Artist Y");
}

#[test]
fn test_entries_without_id_are_dropped() {
    let mut items: Vec<Value> = (0..10)
        .map(|i| panel_video(&format!("id{}", i), &format!("Track {}", i), "Band", false))
        .collect();
    items[4] = json!({ "playlistPanelVideoRenderer": { "title": { "simpleText": "No id" } } });

    let tracks = normalize(&queue_payload(items));
    assert_eq!(tracks.len(), 9);
    assert!(tracks.iter().all(|t| !t.identifier.is_empty()));
    assert!(tracks.iter().all(|t| t.title != "No id"));
}

#[test]
fn test_realistic_search_results() {
    let payload = search_payload(vec![
        artist_card("Some Artist"),
        list_item(
            "vid00000001",
            "First Hit",
            vec![
                artist_run("Some Artist"),
                plain_run(" \u{2022} "),
                plain_run("Album"),
                plain_run(" \u{2022} "),
                plain_run("3:45"),
            ],
        ),
        list_item("vid00000002", "Second Hit", vec![plain_run("Song"), plain_run(" \u{2022} "), plain_run("1.2M views")]),
    ]);

    let (strategy, tracks) = normalize_with_strategy(&payload).unwrap();
    assert_eq!(strategy, NormalizeStrategy::RendererTree);
    assert_eq!(tracks.len(), 2);

    assert_eq!(tracks[0].identifier, "vid00000001");
    assert_eq!(tracks[0].title, "First Hit");
    assert_eq!(tracks[0].artist, "Some Artist");
    assert_eq!(tracks[0].thumbnail_url, "https://lh3.googleusercontent.com/vid00000001=w120-h120");

    // No artist links: the first run stands in for the artist.
    assert_eq!(tracks[1].artist, "Song");
}

#[test]
fn test_queue_items_do_not_merge_with_tree() {
    let payload = queue_payload(vec![
        wrapped_panel_video("aaa", "Original", "Band", true),
        panel_video("bbb", "Next", "Band", false),
    ]);

    let (strategy, tracks) = normalize_with_strategy(&payload).unwrap();
    assert_eq!(strategy, NormalizeStrategy::QueueItems);
    let ids: Vec<_> = tracks.iter().map(|t| t.identifier.as_str()).collect();
    assert_eq!(ids, ["aaa", "bbb"]);
    assert_eq!(tracks[0].artist, "Band");

    // The tree walk alone would also surface the counterpart.
    let tree = NormalizeStrategy::RendererTree.apply(&payload);
    assert_eq!(tree.len(), 3);
}

#[test]
fn test_normalize_is_idempotent() {
    let payload = queue_payload(vec![
        wrapped_panel_video("aaa", "Original", "Band", false),
        panel_video("bbb", "Next", "Band", true),
        panel_video("ccc", "Later", "Other", false),
    ]);
    let first = normalize(&payload);
    let second = normalize(&payload);
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
}

#[test]
fn test_deeply_nested_renderer_ignored() {
    let mut nested = panel_video("deep", "Deep", "Band", false);
    for _ in 0..25 {
        nested = json!({ "wrap": nested });
    }
    assert!(normalize(&nested).is_empty());

    let mut shallow = panel_video("near", "Near", "Band", false);
    for _ in 0..5 {
        shallow = json!({ "wrap": [shallow] });
    }
    let tracks = normalize(&shallow);
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].identifier, "near");
}

#[test]
fn test_selection_precedence() {
    let payload = json!({
        "items": [
            panel_video("a", "Alpha", "Band", false),
            panel_video("b", "Beta", "Band", false),
            panel_video("c", "Gamma", "Band", true)
        ],
        "currentIndex": 0
    });
    let tracks = normalize(&payload);

    // Explicit selection wins over everything.
    let obs = observation("b", "Beta", "Band");
    assert_eq!(
        resolve_with_strategy(&tracks, Some(&obs), &payload),
        Some((ResolveStrategy::Selected, 2))
    );

    // Without it the observed id is next.
    let mut unselected = tracks.clone();
    unselected[2].is_selected = false;
    assert_eq!(
        resolve_with_strategy(&unselected, Some(&obs), &payload),
        Some((ResolveStrategy::Identifier, 1))
    );

    // A re-issued id still matches on title and artist.
    let reissued = observation("other-id", "GAMMA", "band");
    assert_eq!(
        resolve_with_strategy(&unselected, Some(&reissued), &payload),
        Some((ResolveStrategy::TitleArtist, 2))
    );

    // Nothing observed: fall back to the payload's own index.
    assert_eq!(
        resolve_with_strategy(&unselected, None, &payload),
        Some((ResolveStrategy::PayloadHint, 0))
    );
}

#[test]
fn test_repeated_polls_publish_once() {
    let payload = queue_payload(vec![
        panel_video("a", "Alpha", "Band", false),
        panel_video("b", "Beta", "Band", false),
        panel_video("c", "Gamma", "Band", false),
    ]);
    let obs = observation("b", "Beta", "Band");
    let mut state = QueueViewState::new();

    let (changed, view) = poll(&payload, Some(&obs), &mut state);
    assert!(changed);
    assert_eq!(view.status, QueueStatus::Ok);
    assert_eq!(view.active_index, Some(1));
    assert_eq!(view.entries.len(), 2);
    assert_eq!(view.entries[0].index, 1);

    for _ in 0..3 {
        let (changed, _) = poll(&payload, Some(&obs), &mut state);
        assert!(!changed);
    }

    // The song advanced.
    let obs = observation("c", "Gamma", "Band");
    let (changed, view) = poll(&payload, Some(&obs), &mut state);
    assert!(changed);
    assert_eq!(view.entries.len(), 1);
    assert!(view.entries[0].active);
}

#[test]
fn test_empty_queue_stays_quiet() {
    let mut state = QueueViewState::new();
    for payload in [json!({}), json!({ "items": [] }), Value::Null] {
        let tracks = normalize(&payload);
        let r = reconcile(&tracks, resolve_active_index(&tracks, None, &payload), &mut state);
        assert_eq!(r.fingerprint, EMPTY_FINGERPRINT);
    }
    assert_eq!(state.last_fingerprint, EMPTY_FINGERPRINT);

    let (changed, view) = poll(&json!({ "items": [] }), None, &mut state);
    assert!(!changed);
    assert_eq!(view.status, QueueStatus::Empty);
}

#[test]
fn test_invalidate_after_reorder() {
    let payload = queue_payload(vec![panel_video("a", "Alpha", "Band", true)]);
    let mut state = QueueViewState::new();
    assert!(poll(&payload, None, &mut state).0);
    assert!(!poll(&payload, None, &mut state).0);

    state.invalidate();
    assert!(poll(&payload, None, &mut state).0);
}

#[test]
fn test_flat_track_array() {
    let payload = json!({
        "data": {
            "tracks": [
                { "id": 42, "name": "Numeric", "artists": [{ "name": "One" }, { "name": "Two" }] },
                { "videoId": "x1", "title": "Plain", "author": "Solo", "thumbnail": "https://img/x1" },
                { "title": "No id" }
            ]
        }
    });
    let (strategy, tracks) = normalize_with_strategy(&payload).unwrap();
    assert_eq!(strategy, NormalizeStrategy::SimpleArray);
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].identifier, "42");
    assert_eq!(tracks[0].artist, "One, Two");
    assert_eq!(tracks[1].artist, "Solo");
}
