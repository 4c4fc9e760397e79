use serde::{Deserialize, Serialize};

use crate::normalize::CanonicalTrack;
use crate::queue::{PlaybackObservation, Reconciliation};

/// Route prefix of the player backend's API.
pub const API_PREFIX: &str = "/api/v1";

// ── Backend wire types ────────────────────────────────────────────────────────

/// Body of `GET /api/v1/song`. Every field is optional in practice.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SongInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub image_src: Option<String>,
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub song_duration: Option<f64>,
    #[serde(default)]
    pub elapsed_seconds: Option<f64>,
    #[serde(default)]
    pub is_paused: Option<bool>,
}

impl SongInfo {
    /// The matching signal handed to the queue resolver.
    pub fn observation(&self) -> PlaybackObservation {
        PlaybackObservation {
            identifier: self.video_id.clone().unwrap_or_default(),
            title: self.title.clone().unwrap_or_default(),
            artist: self.artist.clone().unwrap_or_default(),
        }
    }
}

/// Body of `GET /api/v1/volume`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VolumeState {
    #[serde(default)]
    pub state: Option<f64>,
}

impl VolumeState {
    pub fn percent(&self) -> Option<u8> {
        self.state
            .filter(|v| v.is_finite())
            .map(|v| v.round().clamp(0.0, 100.0) as u8)
    }
}

/// Body of `POST /api/v1/volume`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetVolume {
    pub volume: u8,
}

/// Body of `PATCH /api/v1/queue`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueJump {
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InsertPosition {
    InsertAfterCurrentVideo,
}

/// Body of `POST /api/v1/queue`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToQueue {
    pub video_id: String,
    pub insert_position: InsertPosition,
}

impl AddToQueue {
    /// Queue `video_id` to play right after the current song.
    pub fn play_next(video_id: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            insert_position: InsertPosition::InsertAfterCurrentVideo,
        }
    }
}

/// Body of `POST /api/v1/search`, also accepted by `/remote/search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// User actions forwarded to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd")]
pub enum Command {
    TogglePlay,
    Next,
    Previous,
    SetVolume { volume: u8 },
    RemoveFromQueue { index: usize },
    JumpTo { index: usize },
    Enqueue { video_id: String },
    RefreshQueue,
}

impl Command {
    /// Commands after which the queue view must be redrawn even if the next
    /// poll happens to look identical.
    pub fn reorders_queue(&self) -> bool {
        matches!(
            self,
            Command::Next
                | Command::Previous
                | Command::RemoveFromQueue { .. }
                | Command::JumpTo { .. }
                | Command::Enqueue { .. }
        )
    }
}

// ── Browser-facing views ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    /// Nothing fetched yet.
    #[default]
    Loading,
    Ok,
    Empty,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    /// Position in the full backend queue (what remove/jump expect).
    pub index: usize,
    pub active: bool,
    #[serde(flatten)]
    pub track: CanonicalTrack,
}

/// The published queue. `rev` only moves when the reconciler reports a
/// change, so clients can skip redraws by comparing it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueView {
    pub rev: u64,
    pub status: QueueStatus,
    pub active_index: Option<usize>,
    pub entries: Vec<QueueEntry>,
}

impl QueueView {
    pub fn from_reconciliation(rev: u64, r: &Reconciliation) -> Self {
        let entries = r
            .visible
            .iter()
            .enumerate()
            .map(|(offset, track)| {
                let index = r.start + offset;
                QueueEntry {
                    index,
                    active: r.display_active_index == Some(index),
                    track: track.clone(),
                }
            })
            .collect::<Vec<_>>();
        Self {
            rev,
            status: if entries.is_empty() {
                QueueStatus::Empty
            } else {
                QueueStatus::Ok
            },
            active_index: r.display_active_index,
            entries,
        }
    }
}

/// `GET /remote/state`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub now_playing: Option<SongInfo>,
    pub volume: Option<u8>,
    pub queue_rev: u64,
}

/// `POST /remote/search`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResults {
    pub results: Vec<CanonicalTrack>,
}

/// `POST /remote/enqueue`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnqueueRequest {
    /// A watch URL, short link or bare video id.
    pub url: String,
}
