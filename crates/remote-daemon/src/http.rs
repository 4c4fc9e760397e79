use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::{Query, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{any, delete, get, post};
use axum::Router;
use remote_proto::links::parse_video_id;
use remote_proto::normalize::normalize;
use remote_proto::protocol::{
    Command, EnqueueRequest, PlayerSnapshot, QueueView, SearchQuery, SearchResults,
};
use remote_proto::state::StateManager;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{error, info, warn};

use crate::backend::BackendClient;
use crate::core::RemoteEvent;
use crate::image_cache::{sniff_content_type, ImageCache, CACHE_CONTROL};
use crate::proxy::{self, ProxyState};

#[derive(Clone)]
pub struct HttpState {
    pub state_manager: Arc<StateManager>,
    pub event_tx: mpsc::Sender<RemoteEvent>,
    pub backend: Arc<BackendClient>,
    pub images: Arc<ImageCache>,
    pub proxy: ProxyState,
    pub max_results: usize,
}

#[derive(Deserialize)]
struct ImageQuery {
    url: String,
}

pub fn router(state: HttpState, web_root: &Path) -> Router {
    Router::new()
        .route("/remote/state", get(get_state))
        .route("/remote/queue", get(get_queue))
        .route("/remote/search", post(search))
        .route("/remote/toggle-play", post(toggle_play))
        .route("/remote/next", post(next))
        .route("/remote/previous", post(previous))
        .route("/remote/volume/:value", post(set_volume))
        .route("/remote/queue/:index", delete(remove_from_queue))
        .route("/remote/queue/:index/jump", post(jump_to))
        .route("/remote/enqueue", post(enqueue))
        .route("/remote/refresh", post(refresh))
        .route("/img", get(image))
        .route("/api/*rest", any(api_proxy))
        .fallback_service(ServeDir::new(web_root))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub fn start_server(
    bind_address: String,
    port: u16,
    state: HttpState,
    web_root: PathBuf,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let app = router(state, &web_root);

        let addr = format!("{}:{}", bind_address, port);
        let listener = match TcpListener::bind(&addr).await {
            Ok(l) => l,
            Err(e) => {
                error!("Failed to bind HTTP server to {}: {}", addr, e);
                return;
            }
        };

        info!("HTTP server listening on http://{} (web root {:?})", addr, web_root);

        if let Err(e) = axum::serve(listener, app).await {
            error!("HTTP server error: {}", e);
        }
    })
}

/// Hand `cmd` to the core loop and wait for the backend's verdict.
async fn dispatch(state: &HttpState, cmd: Command) -> StatusCode {
    let (reply_tx, reply_rx) = oneshot::channel();
    let event = RemoteEvent::Command {
        cmd,
        reply: reply_tx,
    };
    if state.event_tx.send(event).await.is_err() {
        error!("HTTP: core loop is gone");
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    match reply_rx.await {
        Ok(Ok(())) => StatusCode::OK,
        Ok(Err(_)) => StatusCode::BAD_GATEWAY,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn get_state(State(state): State<HttpState>) -> Json<PlayerSnapshot> {
    Json(state.state_manager.snapshot().await)
}

async fn get_queue(State(state): State<HttpState>) -> Json<QueueView> {
    Json(state.state_manager.queue_view().await)
}

async fn search(
    State(state): State<HttpState>,
    Json(body): Json<SearchQuery>,
) -> Result<Json<SearchResults>, StatusCode> {
    let query = body.query.trim();
    if query.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    info!("HTTP: search {:?}", query);

    let payload = state.backend.search(query).await.map_err(|e| {
        warn!("HTTP: search failed: {}", e);
        StatusCode::BAD_GATEWAY
    })?;
    let results = normalize(&payload)
        .into_iter()
        .take(state.max_results)
        .collect();
    Ok(Json(SearchResults { results }))
}

async fn toggle_play(State(state): State<HttpState>) -> StatusCode {
    dispatch(&state, Command::TogglePlay).await
}

async fn next(State(state): State<HttpState>) -> StatusCode {
    dispatch(&state, Command::Next).await
}

async fn previous(State(state): State<HttpState>) -> StatusCode {
    dispatch(&state, Command::Previous).await
}

async fn set_volume(
    State(state): State<HttpState>,
    axum::extract::Path(value): axum::extract::Path<i64>,
) -> StatusCode {
    let volume = value.clamp(0, 100) as u8;
    dispatch(&state, Command::SetVolume { volume }).await
}

async fn remove_from_queue(
    State(state): State<HttpState>,
    axum::extract::Path(index): axum::extract::Path<usize>,
) -> StatusCode {
    dispatch(&state, Command::RemoveFromQueue { index }).await
}

async fn jump_to(
    State(state): State<HttpState>,
    axum::extract::Path(index): axum::extract::Path<usize>,
) -> StatusCode {
    dispatch(&state, Command::JumpTo { index }).await
}

async fn enqueue(State(state): State<HttpState>, Json(body): Json<EnqueueRequest>) -> StatusCode {
    let Some(video_id) = parse_video_id(&body.url) else {
        return StatusCode::BAD_REQUEST;
    };
    dispatch(&state, Command::Enqueue { video_id }).await
}

async fn refresh(State(state): State<HttpState>) -> StatusCode {
    dispatch(&state, Command::RefreshQueue).await
}

async fn image(State(state): State<HttpState>, Query(query): Query<ImageQuery>) -> Response {
    if !ImageCache::is_fetchable(&query.url) {
        return StatusCode::BAD_REQUEST.into_response();
    }
    match state.images.get(&query.url).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, sniff_content_type(&bytes)),
                (header::CACHE_CONTROL, CACHE_CONTROL),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            warn!("HTTP: image {} failed: {:#}", query.url, e);
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}

async fn api_proxy(State(state): State<HttpState>, req: Request) -> Response {
    proxy::forward(&state.proxy, req).await
}
