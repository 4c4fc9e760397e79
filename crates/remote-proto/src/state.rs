use crate::protocol::{PlayerSnapshot, QueueStatus, QueueView, SongInfo};
use crate::queue::Reconciliation;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Everything the HTTP side reads. Written only by the poller loop.
#[derive(Debug, Clone, Default)]
pub struct RemoteState {
    pub now_playing: Option<SongInfo>,
    pub volume: Option<u8>,
    pub queue: QueueView,
}

pub struct StateManager {
    state: Arc<RwLock<RemoteState>>,
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StateManager {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(RemoteState::default())),
        }
    }

    pub async fn snapshot(&self) -> PlayerSnapshot {
        let state = self.state.read().await;
        PlayerSnapshot {
            now_playing: state.now_playing.clone(),
            volume: state.volume,
            queue_rev: state.queue.rev,
        }
    }

    pub async fn queue_view(&self) -> QueueView {
        self.state.read().await.queue.clone()
    }

    pub async fn set_now_playing(&self, song: Option<SongInfo>) {
        let mut state = self.state.write().await;
        state.now_playing = song;
    }

    pub async fn set_volume(&self, volume: Option<u8>) {
        let mut state = self.state.write().await;
        state.volume = volume;
    }

    /// Publish a reconcile result that reported a change. Returns the new
    /// revision.
    pub async fn publish_queue(&self, reconciliation: &Reconciliation) -> u64 {
        let mut state = self.state.write().await;
        let rev = state.queue.rev + 1;
        state.queue = QueueView::from_reconciliation(rev, reconciliation);
        rev
    }

    /// Mark the queue as unavailable, keeping the last entries so a client
    /// can still show them greyed out.
    pub async fn set_queue_error(&self) {
        let mut state = self.state.write().await;
        if state.queue.status != QueueStatus::Error {
            state.queue.status = QueueStatus::Error;
            state.queue.rev += 1;
        }
    }
}
