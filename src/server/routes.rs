// src/server/routes.rs

use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures::stream::{self, Stream, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::server::reload::{ReloadEvent, ReloadHub};

pub const EVENTS_PATH: &str = "/__assetflow/events";
pub const CLIENT_PATH: &str = "/__assetflow/client.js";

const CLIENT_JS: &str = include_str!("client.js");

/// Injected into every HTML page.
pub fn client_tag() -> String {
    format!(r#"<script src="{CLIENT_PATH}"></script>"#)
}

#[derive(Debug, Clone)]
pub struct ServerState {
    dir: Arc<PathBuf>,
    hub: ReloadHub,
    /// Ends open event streams so graceful shutdown can complete.
    shutdown: CancellationToken,
}

impl ServerState {
    pub fn new(dir: impl Into<PathBuf>, hub: ReloadHub, shutdown: CancellationToken) -> Self {
        Self {
            dir: Arc::new(dir.into()),
            hub,
            shutdown,
        }
    }
}

pub fn create_router(state: ServerState) -> Router {
    Router::new()
        .route(EVENTS_PATH, get(events))
        .route(CLIENT_PATH, get(client_script))
        .fallback(static_file)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn client_script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        CLIENT_JS,
    )
}

async fn events(
    State(state): State<ServerState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!(clients = state.hub.clients() + 1, "reload client connected");
    let rx = state.hub.subscribe();

    let stream = stream::unfold(rx, |mut rx| async move {
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                // Missed some; a full reload covers whatever they were.
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "reload client lagged");
                    ReloadEvent::Reload
                }
                Err(RecvError::Closed) => return None,
            };
            match Event::default().json_data(&event) {
                Ok(sse) => return Some((Ok(sse), rx)),
                Err(err) => warn!(error = %err, "cannot encode reload event"),
            }
        }
    })
    .take_until(state.shutdown.clone().cancelled_owned());

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Serve a file from the app directory; full HTML pages get the reload
/// client. Partial (range) and `HEAD` responses pass through untouched.
async fn static_file(State(state): State<ServerState>, req: Request) -> Response {
    if req.uri().path().split('/').any(|segment| segment == "..") {
        return StatusCode::BAD_REQUEST.into_response();
    }
    let is_head = req.method() == Method::HEAD;

    let response = match ServeDir::new(state.dir.as_path()).oneshot(req).await {
        Ok(response) => response,
        Err(never) => match never {},
    };

    let is_html = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/html"));
    if !is_html || is_head || response.status() != StatusCode::OK {
        return response.map(Body::new);
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(Body::new(body), usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(error = %err, "cannot read page for script injection");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let page = inject_client(&String::from_utf8_lossy(&bytes));
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache"),
    );
    Response::from_parts(parts, Body::from(page))
}

/// Insert the client script before the last `</body>`, or append it.
pub fn inject_client(html: &str) -> String {
    let tag = client_tag();
    match html.to_ascii_lowercase().rfind("</body>") {
        Some(idx) => format!("{}{}{}", &html[..idx], tag, &html[idx..]),
        None => format!("{html}{tag}"),
    }
}
