//! Track-list normalization.
//!
//! The player backend answers queue and search requests with several
//! unrelated JSON shapes: innertube "renderer" trees nested arbitrarily deep,
//! a queue envelope whose `items` wrap one renderer each, and occasionally a
//! flat array of ad-hoc track objects. [`normalize`] runs an ordered list of
//! strategies over the payload and returns the first non-empty result.

pub mod renderer;
pub mod simple;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Shape-independent track record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalTrack {
    pub title: String,
    pub artist: String,
    pub thumbnail_url: String,
    /// Backend video id. Never empty.
    #[serde(rename = "videoId")]
    pub identifier: String,
    /// The payload explicitly marked this entry as playing.
    #[serde(rename = "selected")]
    pub is_selected: bool,
}

/// One way of reading a payload, tried in [`NORMALIZE_STRATEGIES`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeStrategy {
    /// Top-level `items` of a queue response, one renderer (or wrapper) each.
    QueueItems,
    /// Every renderer found anywhere in the tree.
    RendererTree,
    /// A flat array of track-like objects under a conventional key.
    SimpleArray,
}

/// The queue envelope goes first: it is unambiguous, while a tree walk over
/// the same response would also pick up the counterpart renderers that sit
/// next to the primary ones.
pub const NORMALIZE_STRATEGIES: [NormalizeStrategy; 3] = [
    NormalizeStrategy::QueueItems,
    NormalizeStrategy::RendererTree,
    NormalizeStrategy::SimpleArray,
];

impl NormalizeStrategy {
    pub fn apply(self, payload: &Value) -> Vec<CanonicalTrack> {
        match self {
            Self::QueueItems => parse_queue_items(payload),
            Self::RendererTree => renderer::collect_renderers(payload, renderer::MAX_RENDERER_DEPTH)
                .into_iter()
                .filter_map(|r| renderer::extract_track(r.node))
                .collect(),
            Self::SimpleArray => simple::locate_track_array(payload, 0)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(simple::normalize_simple_track)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::QueueItems => "queue-items",
            Self::RendererTree => "renderer-tree",
            Self::SimpleArray => "simple-array",
        }
    }
}

/// Convert any backend payload into an ordered track list. An empty list is
/// a normal answer (empty queue, no search hits), not an error.
pub fn normalize(payload: &Value) -> Vec<CanonicalTrack> {
    normalize_with_strategy(payload)
        .map(|(_, tracks)| tracks)
        .unwrap_or_default()
}

/// Like [`normalize`], also reporting which strategy produced the tracks.
pub fn normalize_with_strategy(payload: &Value) -> Option<(NormalizeStrategy, Vec<CanonicalTrack>)> {
    NORMALIZE_STRATEGIES.iter().find_map(|strategy| {
        let tracks = strategy.apply(payload);
        (!tracks.is_empty()).then_some((*strategy, tracks))
    })
}

fn parse_queue_items(payload: &Value) -> Vec<CanonicalTrack> {
    let Some(items) = payload.get("items").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|entry| {
            let wrapper = entry
                .get("playlistPanelVideoWrapperRenderer")
                .filter(|w| is_truthy(w));
            let node = match wrapper {
                Some(wrapper) => wrapper.pointer("/primaryRenderer/playlistPanelVideoRenderer"),
                None => entry.get("playlistPanelVideoRenderer"),
            };
            node.filter(|n| is_truthy(n))
                .and_then(renderer::extract_track)
        })
        .collect()
}

// ── JSON helpers ──────────────────────────────────────────────────────────────

/// Loose truthiness: `false`, `null`, `0`, `""` and absent are false, any
/// object or array is true.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Non-empty string at `pointer` below `value`.
pub(crate) fn str_at<'v>(value: &'v Value, pointer: &str) -> Option<&'v str> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Display text of a text node: a plain string, the concatenated `runs`, or
/// `simpleText`.
pub(crate) fn runs_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(obj) => {
            if let Some(runs) = obj.get("runs").filter(|r| is_truthy(r)) {
                return runs
                    .as_array()
                    .map(|runs| {
                        runs.iter()
                            .map(|r| r.get("text").and_then(Value::as_str).unwrap_or(""))
                            .collect::<String>()
                    })
                    .unwrap_or_default();
            }
            obj.get("simpleText")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string()
        }
        _ => String::new(),
    }
}
