//! Typed client for the player backend's `/api/v1` routes.
//!
//! One `reqwest::Client` is shared by the poller and the search handler so
//! connections to the backend are pooled. Every call is bounded by
//! [`REQUEST_TIMEOUT`]; a slow backend costs one poll, never the loop.
use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use remote_proto::protocol::{
    AddToQueue, Command, QueueJump, SearchQuery, SetVolume, SongInfo, VolumeState, API_PREFIX,
};

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend answered {0}")]
    Status(StatusCode),
    #[error("backend sent malformed JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type BackendResult<T> = Result<T, BackendError>;

#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> BackendResult<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    /// Send and read the body. `None` for 204 and for empty 2xx bodies.
    async fn send(&self, request: RequestBuilder) -> BackendResult<Option<Vec<u8>>> {
        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(BackendError::Status(status));
        }
        let body = response.bytes().await?;
        Ok((!body.is_empty()).then(|| body.to_vec()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> BackendResult<Option<T>> {
        match self.send(self.client.get(self.url(path))).await? {
            Some(body) => Ok(Some(serde_json::from_slice(&body)?)),
            None => Ok(None),
        }
    }

    async fn post_empty(&self, path: &str) -> BackendResult<()> {
        self.send(self.client.post(self.url(path))).await.map(|_| ())
    }

    async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> BackendResult<()> {
        self.send(self.client.post(self.url(path)).json(body))
            .await
            .map(|_| ())
    }

    /// `None` when nothing is loaded in the player.
    pub async fn song(&self) -> BackendResult<Option<SongInfo>> {
        self.get_json("/song").await
    }

    /// Volume in percent.
    pub async fn volume(&self) -> BackendResult<Option<u8>> {
        let state: Option<VolumeState> = self.get_json("/volume").await?;
        Ok(state.and_then(|s| s.percent()))
    }

    pub async fn set_volume(&self, volume: u8) -> BackendResult<()> {
        self.post_json("/volume", &SetVolume { volume: volume.min(100) })
            .await
    }

    pub async fn toggle_play(&self) -> BackendResult<()> {
        self.post_empty("/toggle-play").await
    }

    pub async fn next(&self) -> BackendResult<()> {
        self.post_empty("/next").await
    }

    pub async fn previous(&self) -> BackendResult<()> {
        self.post_empty("/previous").await
    }

    /// Raw queue payload; `None` when the backend has no queue.
    pub async fn queue(&self) -> BackendResult<Option<Value>> {
        self.get_json("/queue").await
    }

    pub async fn remove_from_queue(&self, index: usize) -> BackendResult<()> {
        let url = self.url(&format!("/queue/{}", index));
        self.send(self.client.delete(url)).await.map(|_| ())
    }

    pub async fn jump_to(&self, index: usize) -> BackendResult<()> {
        let request = self.client.patch(self.url("/queue")).json(&QueueJump { index });
        self.send(request).await.map(|_| ())
    }

    /// Queue `video_id` right after the current song.
    pub async fn enqueue(&self, video_id: &str) -> BackendResult<()> {
        self.post_json("/queue", &AddToQueue::play_next(video_id))
            .await
    }

    /// Raw search payload, `Value::Null` when the backend had nothing.
    pub async fn search(&self, query: &str) -> BackendResult<Value> {
        let request = self.client.post(self.url("/search")).json(&SearchQuery {
            query: query.to_string(),
        });
        match self.send(request).await? {
            Some(body) => Ok(serde_json::from_slice(&body)?),
            None => Ok(Value::Null),
        }
    }

    /// Forward a user command. `RefreshQueue` has no backend call.
    pub async fn execute(&self, cmd: &Command) -> BackendResult<()> {
        debug!("backend: {:?}", cmd);
        match cmd {
            Command::TogglePlay => self.toggle_play().await,
            Command::Next => self.next().await,
            Command::Previous => self.previous().await,
            Command::SetVolume { volume } => self.set_volume(*volume).await,
            Command::RemoveFromQueue { index } => self.remove_from_queue(*index).await,
            Command::JumpTo { index } => self.jump_to(*index).await,
            Command::Enqueue { video_id } => self.enqueue(video_id).await,
            Command::RefreshQueue => Ok(()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::{delete, get, post};
    use axum::{Json, Router};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// Serve `app` on an ephemeral local port and return its base URL.
    pub(crate) async fn spawn_fake_backend(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_song_and_no_content() {
        let app = Router::new()
            .route(
                "/api/v1/song",
                get(|| async { Json(json!({ "title": "Song", "videoId": "v1", "isPaused": true })) }),
            )
            .route("/api/v1/queue", get(|| async { AxumStatus::NO_CONTENT }));
        let backend = BackendClient::new(spawn_fake_backend(app).await).unwrap();

        let song = backend.song().await.unwrap().unwrap();
        assert_eq!(song.video_id.as_deref(), Some("v1"));
        assert_eq!(song.is_paused, Some(true));
        assert!(backend.queue().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_error_status_and_bad_json() {
        let app = Router::new()
            .route("/api/v1/song", get(|| async { (AxumStatus::INTERNAL_SERVER_ERROR, "boom") }))
            .route("/api/v1/volume", get(|| async { "not json" }));
        let backend = BackendClient::new(spawn_fake_backend(app).await).unwrap();

        assert!(matches!(
            backend.song().await,
            Err(BackendError::Status(s)) if s == StatusCode::INTERNAL_SERVER_ERROR
        ));
        assert!(matches!(backend.volume().await, Err(BackendError::Decode(_))));
    }

    #[tokio::test]
    async fn test_commands_hit_expected_routes() {
        let seen = Arc::new(Mutex::new(Vec::<String>::new()));
        let log = |name: &'static str, seen: Arc<Mutex<Vec<String>>>| {
            move |body: axum::body::Bytes| async move {
                let body = String::from_utf8_lossy(&body).into_owned();
                seen.lock().unwrap().push(format!("{} {}", name, body));
                AxumStatus::NO_CONTENT
            }
        };
        let removed = Arc::clone(&seen);
        let app = Router::new()
            .route("/api/v1/next", post(log("next", Arc::clone(&seen))))
            .route("/api/v1/volume", post(log("volume", Arc::clone(&seen))))
            .route(
                "/api/v1/queue",
                post(log("enqueue", Arc::clone(&seen))).patch(log("jump", Arc::clone(&seen))),
            )
            .route(
                "/api/v1/queue/:index",
                delete(move |Path(index): Path<usize>| async move {
                    removed.lock().unwrap().push(format!("remove {}", index));
                    AxumStatus::NO_CONTENT
                }),
            );
        let backend = BackendClient::new(spawn_fake_backend(app).await).unwrap();

        backend.execute(&Command::Next).await.unwrap();
        backend.execute(&Command::SetVolume { volume: 150 }).await.unwrap();
        backend
            .execute(&Command::Enqueue { video_id: "abc".into() })
            .await
            .unwrap();
        backend.execute(&Command::JumpTo { index: 4 }).await.unwrap();
        backend.execute(&Command::RemoveFromQueue { index: 2 }).await.unwrap();
        backend.execute(&Command::RefreshQueue).await.unwrap();

        let seen = seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            [
                "next ".to_string(),
                r#"volume {"volume":100}"#.to_string(),
                r#"enqueue {"videoId":"abc","insertPosition":"INSERT_AFTER_CURRENT_VIDEO"}"#.to_string(),
                r#"jump {"index":4}"#.to_string(),
                "remove 2".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let backend = BackendClient::new(format!("http://{}", addr)).unwrap();
        assert!(matches!(backend.song().await, Err(BackendError::Transport(_))));
    }
}
