//! RemoteCore: single-owner event loop for everything the poller mutates.
//!
//! The loop owns the queue view state and the last playback observation
//! exclusively. Ticker tasks and HTTP handlers only send `RemoteEvent`s;
//! each event is handled to completion before the next one is received, so
//! two polls never interleave and a command is never raced by a poll that
//! started before it.
//!
//! Results are published through the shared `StateManager`, which the HTTP
//! handlers read. The queue view is only republished when the reconciler
//! reports a change.
use std::sync::Arc;
use std::time::Duration;

use remote_proto::config::PollingConfig;
use remote_proto::normalize::normalize_with_strategy;
use remote_proto::protocol::Command;
use remote_proto::queue::{reconcile, resolve_with_strategy, PlaybackObservation, QueueViewState};
use remote_proto::state::StateManager;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::backend::{BackendClient, BackendError, BackendResult};

/// Play/pause settles faster than a track change.
const TOGGLE_SETTLE: Duration = Duration::from_millis(300);

// ── RemoteEvent ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    Song,
    Queue,
    Volume,
}

/// All inputs into the RemoteCore loop.
#[derive(Debug)]
pub enum RemoteEvent {
    /// A user action from the HTTP API; the backend's answer goes to `reply`.
    Command {
        cmd: Command,
        reply: oneshot::Sender<BackendResult<()>>,
    },
    /// Periodic or follow-up poll.
    Tick(Poll),
    Shutdown,
}

/// Polls to run after `cmd`, with their delays. The backend needs a moment
/// before its answers reflect a command.
pub fn follow_up_polls(cmd: &Command, settle: Duration) -> Vec<(Poll, Duration)> {
    match cmd {
        Command::TogglePlay => vec![(Poll::Song, TOGGLE_SETTLE)],
        Command::Next | Command::Previous => vec![(Poll::Song, settle), (Poll::Queue, settle)],
        Command::RemoveFromQueue { .. } | Command::JumpTo { .. } | Command::Enqueue { .. } => {
            vec![(Poll::Queue, settle)]
        }
        Command::SetVolume { .. } => Vec::new(),
        Command::RefreshQueue => vec![(Poll::Queue, Duration::ZERO)],
    }
}

// ── RemoteCore ────────────────────────────────────────────────────────────────

pub struct RemoteCore {
    polling: PollingConfig,
    backend: Arc<BackendClient>,
    state_manager: Arc<StateManager>,
    /// Used by ticker and follow-up tasks to feed the loop.
    event_tx: mpsc::Sender<RemoteEvent>,
    view_state: QueueViewState,
    /// Last now-playing answer; `None` while nothing plays.
    observation: Option<PlaybackObservation>,
    /// Tracks reachability so an outage is logged once, not every tick.
    backend_up: bool,
}

impl RemoteCore {
    pub fn new(
        polling: PollingConfig,
        backend: Arc<BackendClient>,
        state_manager: Arc<StateManager>,
        event_tx: mpsc::Sender<RemoteEvent>,
    ) -> Self {
        Self {
            polling,
            backend,
            state_manager,
            event_tx,
            view_state: QueueViewState::new(),
            observation: None,
            backend_up: true,
        }
    }

    /// Run until `Shutdown` or until every sender is gone.
    pub async fn run(mut self, mut event_rx: mpsc::Receiver<RemoteEvent>) -> anyhow::Result<()> {
        info!("RemoteCore: starting event loop");

        self.spawn_ticker(Poll::Song, self.polling.song_interval());
        self.spawn_ticker(Poll::Queue, self.polling.queue_interval());
        self.spawn_ticker(Poll::Volume, self.polling.volume_interval());

        // Song first, so the first queue poll can already resolve the playing entry.
        self.poll(Poll::Song).await;
        self.poll(Poll::Queue).await;
        self.poll(Poll::Volume).await;

        loop {
            match event_rx.recv().await {
                None => {
                    info!("RemoteCore: event channel closed, shutting down");
                    break;
                }
                Some(RemoteEvent::Shutdown) => {
                    info!("RemoteCore: shutdown requested");
                    break;
                }
                Some(RemoteEvent::Command { cmd, reply }) => {
                    info!("RemoteCore: command {:?}", cmd);
                    let result = self.handle_command(cmd).await;
                    if let Err(e) = &result {
                        warn!("RemoteCore: command failed: {}", e);
                    }
                    // The HTTP caller may have given up; nothing to do then.
                    let _ = reply.send(result);
                }
                Some(RemoteEvent::Tick(poll)) => self.poll(poll).await,
            }
        }
        Ok(())
    }

    fn spawn_ticker(&self, poll: Poll, period: Duration) {
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(period).await;
                if tx.send(RemoteEvent::Tick(poll)).await.is_err() {
                    break;
                }
            }
        });
    }

    fn schedule(&self, poll: Poll, delay: Duration) {
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(RemoteEvent::Tick(poll)).await;
        });
    }

    async fn handle_command(&mut self, cmd: Command) -> BackendResult<()> {
        // Invalidate up front: even a rejected command may have moved things.
        if cmd.reorders_queue() || cmd == Command::RefreshQueue {
            self.view_state.invalidate();
        }

        let result = self.backend.execute(&cmd).await;

        if let (Ok(()), Command::SetVolume { volume }) = (&result, &cmd) {
            self.state_manager.set_volume(Some((*volume).min(100))).await;
        }
        for (poll, delay) in follow_up_polls(&cmd, self.polling.settle_delay()) {
            self.schedule(poll, delay);
        }
        result
    }

    async fn poll(&mut self, poll: Poll) {
        match poll {
            Poll::Song => self.poll_song().await,
            Poll::Queue => self.poll_queue().await,
            Poll::Volume => self.poll_volume().await,
        }
    }

    fn note_backend<T>(&mut self, what: &str, result: &BackendResult<T>) {
        match (result, self.backend_up) {
            (Ok(_), false) => {
                info!("backend reachable again at {}", self.backend.base_url());
                self.backend_up = true;
            }
            (Err(e @ BackendError::Transport(_)), true) => {
                warn!("{} poll: {}", what, e);
                self.backend_up = false;
            }
            (Err(e), _) => debug!("{} poll: {}", what, e),
            _ => {}
        }
    }

    async fn poll_song(&mut self) {
        let result = self.backend.song().await;
        self.note_backend("song", &result);
        let Ok(song) = result else {
            return;
        };
        self.observation = song.as_ref().map(|s| s.observation());
        self.state_manager.set_now_playing(song).await;
    }

    async fn poll_volume(&mut self) {
        let result = self.backend.volume().await;
        self.note_backend("volume", &result);
        if let Ok(Some(volume)) = result {
            self.state_manager.set_volume(Some(volume)).await;
        }
    }

    async fn poll_queue(&mut self) {
        let result = self.backend.queue().await;
        self.note_backend("queue", &result);
        match result {
            // 204 is an empty queue, not a failure.
            Ok(payload) => {
                self.apply_queue_payload(&payload.unwrap_or(Value::Null)).await;
            }
            Err(_) => {
                // Forget the fingerprint so the first good poll replaces the error.
                self.view_state.invalidate();
                self.state_manager.set_queue_error().await;
            }
        }
    }

    /// Normalize, resolve and reconcile one queue payload. Returns whether a
    /// new view was published.
    async fn apply_queue_payload(&mut self, payload: &Value) -> bool {
        let (strategy, tracks) = match normalize_with_strategy(payload) {
            Some((strategy, tracks)) => (strategy.label(), tracks),
            None => ("none", Vec::new()),
        };
        let resolved = resolve_with_strategy(&tracks, self.observation.as_ref(), payload);
        let reconciliation = reconcile(&tracks, resolved.map(|(_, idx)| idx), &mut self.view_state);
        if !reconciliation.changed {
            return false;
        }

        let rev = self.state_manager.publish_queue(&reconciliation).await;
        debug!(
            "queue rev {}: {} tracks via {}, active {:?} via {:?}, {} visible",
            rev,
            tracks.len(),
            strategy,
            reconciliation.display_active_index,
            resolved.map(|(s, _)| s),
            reconciliation.visible.len()
        );
        true
    }
}
