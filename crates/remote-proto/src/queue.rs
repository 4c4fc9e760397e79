//! Which queue entry is playing, and whether the published view must change.
//!
//! Both steps run once per queue poll, after normalization. The resolver is a
//! chain of matchers from most to least trustworthy; the reconciler turns the
//! visible part of the queue into a fingerprint and reports a change only
//! when that fingerprint moves, so identical polls never re-render.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::normalize::CanonicalTrack;

/// Fingerprint of a view with nothing to show.
pub const EMPTY_FINGERPRINT: &str = "__empty__";

/// Field separator inside fingerprints (ASCII unit separator).
const FINGERPRINT_SEPARATOR: char = '\u{1f}';

/// Payload fields that sometimes carry the playing position, in the order
/// they are consulted.
const INDEX_HINT_FIELDS: [&str; 3] = ["selectedItemIndex", "currentIndex", "index"];

/// What the now-playing poll last reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackObservation {
    pub identifier: String,
    pub title: String,
    pub artist: String,
}

/// One matcher in the resolution chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStrategy {
    /// An entry the payload itself flags as selected.
    Selected,
    /// Same video id as the now-playing observation.
    Identifier,
    /// Same title (and artist, when known) as the observation; covers the
    /// backend re-issuing a different id for the same song.
    TitleArtist,
    /// A numeric index field on the payload. Often stale, hence last.
    PayloadHint,
}

pub const RESOLVE_STRATEGIES: [ResolveStrategy; 4] = [
    ResolveStrategy::Selected,
    ResolveStrategy::Identifier,
    ResolveStrategy::TitleArtist,
    ResolveStrategy::PayloadHint,
];

impl ResolveStrategy {
    /// Lowest matching position, if any.
    pub fn resolve(
        self,
        queue: &[CanonicalTrack],
        observation: Option<&PlaybackObservation>,
        payload: &Value,
    ) -> Option<usize> {
        match self {
            Self::Selected => queue.iter().position(|t| t.is_selected),
            Self::Identifier => {
                let obs = observation.filter(|o| !o.identifier.is_empty())?;
                queue.iter().position(|t| t.identifier == obs.identifier)
            }
            Self::TitleArtist => {
                let obs = observation.filter(|o| !o.title.is_empty())?;
                let title = obs.title.to_lowercase();
                let artist = obs.artist.to_lowercase();
                queue.iter().position(|t| {
                    t.title.to_lowercase() == title
                        && (artist.is_empty() || t.artist.to_lowercase() == artist)
                })
            }
            Self::PayloadHint => payload_index_hint(payload),
        }
    }
}

/// The first numeric field among [`INDEX_HINT_FIELDS`] decides. A negative or
/// fractional value there means unresolved; later fields are not consulted.
fn payload_index_hint(payload: &Value) -> Option<usize> {
    let n = INDEX_HINT_FIELDS
        .iter()
        .find_map(|field| match payload.get(*field) {
            Some(Value::Number(n)) => Some(n),
            _ => None,
        })?;
    n.as_u64().and_then(|i| usize::try_from(i).ok()).or_else(|| {
        n.as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= 0.0)
            .map(|f| f as usize)
    })
}

/// Position of the playing entry in `queue`, or `None` when nothing matches.
pub fn resolve_active_index(
    queue: &[CanonicalTrack],
    observation: Option<&PlaybackObservation>,
    payload: &Value,
) -> Option<usize> {
    resolve_with_strategy(queue, observation, payload).map(|(_, idx)| idx)
}

/// Like [`resolve_active_index`], also reporting which matcher hit.
pub fn resolve_with_strategy(
    queue: &[CanonicalTrack],
    observation: Option<&PlaybackObservation>,
    payload: &Value,
) -> Option<(ResolveStrategy, usize)> {
    RESOLVE_STRATEGIES
        .iter()
        .find_map(|s| s.resolve(queue, observation, payload).map(|idx| (*s, idx)))
}

// ── Reconciler ────────────────────────────────────────────────────────────────

/// The reconciler's memory of what it last published. Owned by the queue
/// poller and passed in by reference; never shared or persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueViewState {
    pub last_fingerprint: String,
    pub last_active_index: Option<usize>,
}

impl QueueViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the last fingerprint so the next reconcile reports a change.
    /// Call right after anything that reorders the backend queue.
    pub fn invalidate(&mut self) {
        self.last_fingerprint.clear();
    }
}

/// Outcome of one reconcile pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// False means the caller should leave the current view alone.
    pub changed: bool,
    /// Queue position of `visible[0]`.
    pub start: usize,
    /// Current and upcoming entries; earlier ones are dropped.
    pub visible: Vec<CanonicalTrack>,
    pub display_active_index: Option<usize>,
    pub fingerprint: String,
}

fn index_field(index: Option<usize>) -> String {
    index.map_or_else(|| "-1".to_string(), |i| i.to_string())
}

/// Fingerprint of a visible slice: its start, the active index, then each
/// entry's id and title.
pub fn fingerprint(visible: &[CanonicalTrack], start: usize, active: Option<usize>) -> String {
    if visible.is_empty() {
        return EMPTY_FINGERPRINT.to_string();
    }
    let mut parts = Vec::with_capacity(2 + visible.len() * 2);
    parts.push(start.to_string());
    parts.push(index_field(active));
    for track in visible {
        parts.push(track.identifier.clone());
        parts.push(track.title.clone());
    }
    parts.join(&FINGERPRINT_SEPARATOR.to_string())
}

/// Cut the visible slice out of `queue` and compare it with what `state`
/// last saw. `state` is updated only when something changed.
pub fn reconcile(
    queue: &[CanonicalTrack],
    active: Option<usize>,
    state: &mut QueueViewState,
) -> Reconciliation {
    let start = active.unwrap_or(0);
    let visible = queue.get(start..).unwrap_or_default().to_vec();
    let fingerprint = fingerprint(&visible, start, active);

    let changed = fingerprint != state.last_fingerprint;
    if changed {
        state.last_fingerprint = fingerprint.clone();
        state.last_active_index = active;
    }

    Reconciliation {
        changed,
        start,
        visible,
        display_active_index: active,
        fingerprint,
    }
}
