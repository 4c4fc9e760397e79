//! Reverse proxy for `/api/*`.
//!
//! Browsers on the LAN cannot reach the player backend (it listens on
//! localhost only), so every `/api/...` request is replayed against
//! `{backend}/api/...` with the same method, query, body and end-to-end
//! headers. The upstream response is streamed back unbuffered.
//!
//! Design notes
//! ─────────────
//! • The request body is buffered (capped at [`MAX_BODY_BYTES`]); backend
//!   API bodies are small JSON documents.
//! • `host` is not forwarded, so the backend sees its own origin.
//! • No timeout on the proxy client: a long response body must not be cut
//!   off mid-stream.
use axum::body::Body;
use axum::extract::Request;
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::StreamExt;
use reqwest::Client;
use tokio_util::io::{ReaderStream, StreamReader};
use tracing::{debug, warn};

pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Headers that describe one connection rather than the message.
const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
];

#[derive(Clone)]
pub struct ProxyState {
    backend_base: String,
    client: Client,
}

impl ProxyState {
    pub fn new(backend_base: impl Into<String>) -> reqwest::Result<Self> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            backend_base: backend_base.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

fn is_forwarded(name: &HeaderName) -> bool {
    !HOP_BY_HOP.contains(&name.as_str())
}

fn copy_headers(from: &HeaderMap, to: &mut HeaderMap) {
    for (name, value) in from {
        if is_forwarded(name) {
            to.append(name.clone(), value.clone());
        }
    }
}

/// Replay `req` against the backend. Path and query are kept as-is.
pub async fn forward(proxy: &ProxyState, req: Request) -> Response {
    let (parts, body) = req.into_parts();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let target = format!("{}{}", proxy.backend_base, path_and_query);

    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(b) => b,
        Err(e) => {
            warn!("proxy: rejecting request body for {}: {}", target, e);
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    debug!("proxy: {} {}", parts.method, target);

    let mut headers = HeaderMap::new();
    copy_headers(&parts.headers, &mut headers);

    let upstream = match proxy
        .client
        .request(parts.method.clone(), &target)
        .headers(headers)
        .body(body)
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => {
            warn!("proxy: upstream request failed for {}: {}", target, e);
            return StatusCode::BAD_GATEWAY.into_response();
        }
    };

    let mut response = Response::builder().status(upstream.status());
    if let Some(out) = response.headers_mut() {
        copy_headers(upstream.headers(), out);
    }

    let reader = StreamReader::new(
        upstream
            .bytes_stream()
            .map(|result| result.map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))),
    );
    let body = Body::from_stream(ReaderStream::new(reader));

    response
        .body(body)
        .unwrap_or_else(|_| StatusCode::BAD_GATEWAY.into_response())
}
