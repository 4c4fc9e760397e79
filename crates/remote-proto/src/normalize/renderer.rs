//! Innertube renderer nodes: finding them and reading a track out of one.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use super::{is_truthy, runs_text, str_at, CanonicalTrack};

/// Renderers never sit deeper than this in real responses; the bound keeps a
/// pathological payload from recursing without limit.
pub const MAX_RENDERER_DEPTH: usize = 20;

const ARTIST_PAGE_TYPE: &str = "MUSIC_PAGE_TYPE_ARTIST";
const PAGE_TYPE_POINTER: &str = "/navigationEndpoint/browseEndpoint/browseEndpointContextSupportedConfigs/browseEndpointContextMusicConfig/pageType";

/// The two renderer shapes that describe one playable entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererKind {
    /// `musicResponsiveListItemRenderer`, used by search results and shelves.
    ListItem,
    /// `playlistPanelVideoRenderer`, used by the play queue.
    PanelVideo,
}

impl RendererKind {
    pub const ALL: [RendererKind; 2] = [RendererKind::ListItem, RendererKind::PanelVideo];

    pub fn key(self) -> &'static str {
        match self {
            Self::ListItem => "musicResponsiveListItemRenderer",
            Self::PanelVideo => "playlistPanelVideoRenderer",
        }
    }
}

/// A renderer found in a payload, borrowed from it.
#[derive(Debug, Clone, Copy)]
pub struct RendererNode<'a> {
    pub kind: RendererKind,
    pub node: &'a Value,
}

/// Depth-first collection of every renderer in `value`, in document order.
///
/// A renderer's own subtree is not searched further, and nothing below
/// `max_depth` is inspected.
pub fn collect_renderers(value: &Value, max_depth: usize) -> Vec<RendererNode<'_>> {
    let mut out = Vec::new();
    walk(value, 0, max_depth, &mut out);
    out
}

fn walk<'a>(value: &'a Value, depth: usize, max_depth: usize, out: &mut Vec<RendererNode<'a>>) {
    if depth > max_depth {
        return;
    }
    match value {
        Value::Object(obj) => {
            for kind in RendererKind::ALL {
                if let Some(node) = obj.get(kind.key()).filter(|n| is_truthy(n)) {
                    out.push(RendererNode { kind, node });
                    return;
                }
            }
            for child in obj.values() {
                walk(child, depth + 1, max_depth, out);
            }
        }
        Value::Array(items) => {
            for child in items {
                walk(child, depth + 1, max_depth, out);
            }
        }
        _ => {}
    }
}

/// Read one renderer into a track. `None` when no video id can be found,
/// which is how ornamental entries (headers, automix previews) drop out.
pub fn extract_track(node: &Value) -> Option<CanonicalTrack> {
    let identifier = extract_identifier(node)?;
    Some(CanonicalTrack {
        title: extract_title(node),
        artist: extract_artist(node),
        thumbnail_url: extract_thumbnail(node),
        identifier,
        is_selected: node.get("selected").map(is_truthy).unwrap_or(false),
    })
}

const IDENTIFIER_POINTERS: [&str; 3] = [
    "/playlistItemData/videoId",
    "/overlay/musicItemThumbnailOverlayRenderer/content/musicPlayButtonRenderer/playNavigationEndpoint/watchEndpoint/videoId",
    "/videoId",
];

fn extract_identifier(node: &Value) -> Option<String> {
    IDENTIFIER_POINTERS
        .iter()
        .find_map(|p| str_at(node, p))
        .map(str::to_string)
}

fn flex_column_runs(node: &Value, column: usize) -> Option<&Vec<Value>> {
    node.pointer(&format!(
        "/flexColumns/{}/musicResponsiveListItemFlexColumnRenderer/text/runs",
        column
    ))
    .and_then(Value::as_array)
}

fn extract_title(node: &Value) -> String {
    if let Some(text) = flex_column_runs(node, 0)
        .and_then(|runs| runs.first())
        .and_then(|run| str_at(run, "/text"))
    {
        return text.to_string();
    }
    node.get("title")
        .filter(|t| is_truthy(t))
        .map(runs_text)
        .unwrap_or_default()
}

fn run_text(run: &Value) -> &str {
    run.get("text").and_then(Value::as_str).unwrap_or("")
}

fn is_artist_run(run: &Value) -> bool {
    run.pointer(PAGE_TYPE_POINTER).and_then(Value::as_str) == Some(ARTIST_PAGE_TYPE)
}

/// Runs linking to artist pages joined with ", ", else the first run's text.
fn artist_from_byline_runs(runs: &[Value]) -> String {
    let Some(first) = runs.first() else {
        return String::new();
    };
    let tagged: Vec<&str> = runs.iter().filter(|r| is_artist_run(r)).map(run_text).collect();
    if tagged.is_empty() {
        run_text(first).to_string()
    } else {
        tagged.join(", ")
    }
}

fn noise_patterns() -> &'static (Regex, Regex) {
    static PATTERNS: OnceLock<(Regex, Regex)> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        (
            Regex::new(r"^[0-9]+:[0-9]+$").expect("duration pattern"),
            Regex::new(r"(?i)wiedergabe|aufrufe|views").expect("play count pattern"),
        )
    })
}

/// Separator and metadata runs in a search result's subtitle column: the
/// bullet, the German and English "and" joiners, `mm:ss` durations and
/// play/view counts. Only English and German counts are recognised.
fn is_noise_run(text: &str) -> bool {
    if matches!(text, " \u{2022} " | " und " | " & ") {
        return true;
    }
    let (duration, play_count) = noise_patterns();
    if duration.is_match(text) {
        return true;
    }
    text.starts_with(|c: char| c.is_ascii_digit()) && play_count.is_match(text)
}

fn extract_artist(node: &Value) -> String {
    if let Some(runs) = node.pointer("/longBylineText/runs").and_then(Value::as_array) {
        let artist = artist_from_byline_runs(runs);
        if !artist.is_empty() {
            return artist;
        }
    }

    if let Some(short) = node.get("shortBylineText").filter(|s| is_truthy(s)) {
        return runs_text(short);
    }

    let Some(runs) = flex_column_runs(node, 1) else {
        return String::new();
    };
    let artist = artist_from_byline_runs(runs);
    if !artist.is_empty() {
        return artist;
    }

    runs.iter()
        .skip(1)
        .filter(|run| !is_noise_run(run_text(run)))
        .filter(|run| run.get("navigationEndpoint").map(is_truthy).unwrap_or(false))
        .map(run_text)
        .collect::<Vec<_>>()
        .join(", ")
}

fn thumbnail_url(thumb: Option<&Value>) -> String {
    thumb
        .and_then(|t| t.get("url"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

/// The second music thumbnail is the larger one in practice, so prefer it.
fn extract_thumbnail(node: &Value) -> String {
    if let Some(thumbs) = node
        .pointer("/thumbnail/musicThumbnailRenderer/thumbnail/thumbnails")
        .and_then(Value::as_array)
        .filter(|t| !t.is_empty())
    {
        let pick = thumbs.get(1).or_else(|| thumbs.first());
        // A null slot falls through to the plain thumbnail list.
        if let Some(thumb) = pick.filter(|t| !t.is_null()) {
            return thumbnail_url(Some(thumb));
        }
    }
    if let Some(thumbs) = node
        .pointer("/thumbnail/thumbnails")
        .and_then(Value::as_array)
        .filter(|t| !t.is_empty())
    {
        return thumbnail_url(thumbs.first());
    }
    String::new()
}
