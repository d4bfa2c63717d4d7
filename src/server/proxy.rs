//! HTTP host for the worker.
//!
//! Every request outside `/__worker/` becomes a fetch event. The control
//! routes deliver the remaining event kinds and expose what the host recorded:
//! - POST /__worker/message
//! - POST /__worker/push
//! - POST /__worker/notificationclick
//! - GET /__worker/notifications
//! - GET /__worker/windows
//! - GET /__worker/caches
//! - GET /__worker/health
//! - GET /__worker/metrics

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use url::Url;

use crate::cache::storage::PartitionStats;
use crate::net::request::{Destination, Request};
use crate::server::metrics::Metrics;
use crate::worker::host::{ClientRegistry, NotificationCenter};
use crate::worker::lifecycle::WorkerState;
use crate::worker::message::{ControlMessage, WORKER_VERSION};
use crate::worker::push::Notification;
use crate::worker::strategy::classify;
use crate::worker::ServiceWorker;

/// Header telling the caller whether the response came from cache or network.
pub const SOURCE_HEADER: &str = "x-worker-source";

/// Application state shared across handlers.
pub struct AppState {
    pub worker: Arc<ServiceWorker>,
    pub clients: Arc<ClientRegistry>,
    pub notifications: Arc<NotificationCenter>,
    pub metrics: Metrics,
    pub start_time: Instant,
}

/// Build the axum router with the control routes and the intercepting fallback.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/__worker/message", post(message))
        .route("/__worker/push", post(push))
        .route("/__worker/notificationclick", post(notification_click))
        .route("/__worker/notifications", get(list_notifications))
        .route("/__worker/windows", get(list_windows))
        .route("/__worker/caches", get(cache_stats))
        .route("/__worker/health", get(health))
        .route("/__worker/metrics", get(metrics))
        .fallback(intercept)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─── Request/Response Types ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NotificationClickRequest {
    pub notification_id: String,
    #[serde(default)]
    pub action: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub state: WorkerState,
    pub version: String,
    pub cache_version: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ─── Fetch Interception ────────────────────────────────────────────────────

/// Build the worker request for an incoming one, addressed to the origin.
///
/// Only the path and query of the incoming URI are used; the scheme and host
/// always come from the origin, even for paths like `//other.host/x`.
fn to_worker_request(
    origin: &str,
    method: Method,
    uri: &Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Request, url::ParseError> {
    let mut url = Url::parse(origin)?;
    url.set_path(uri.path());
    url.set_query(uri.query());

    let destination = headers
        .get("sec-fetch-dest")
        .and_then(|v| v.to_str().ok())
        .map(Destination::from_fetch_dest)
        .or_else(|| {
            headers
                .get(header::ACCEPT)
                .and_then(|v| v.to_str().ok())
                .map(Destination::from_accept)
        })
        .unwrap_or_default();

    Ok(Request {
        url,
        method,
        destination,
        headers,
        body,
    })
}

fn into_http_response(response: crate::net::request::Response, source: &'static str) -> Response {
    let mut resp = (response.status, response.headers, response.body).into_response();
    resp.headers_mut()
        .insert(SOURCE_HEADER, HeaderValue::from_static(source));
    resp
}

async fn intercept(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let origin = &state.worker.config().server.origin;
    let request = match to_worker_request(origin, method, &uri, headers, body) {
        Ok(request) => request,
        Err(e) => {
            warn!(uri = %uri, error = %e, "Cannot map request onto origin");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response();
        }
    };

    if !state.worker.state().can_intercept_fetch() {
        return match state.worker.network().fetch(&request).await {
            Ok(response) => into_http_response(response, "network"),
            Err(e) => gateway_timeout(e.to_string()),
        };
    }

    match state.worker.handle_fetch(&request).await {
        Ok(outcome) => {
            state.metrics.record(&outcome);
            into_http_response(outcome.response, outcome.source.as_str())
        }
        Err(e) => {
            state
                .metrics
                .record_failure(classify(&state.worker.config().worker, &request));
            warn!(url = %request.url, error = %e, "Fetch failed");
            gateway_timeout(e.to_string())
        }
    }
}

fn gateway_timeout(error: String) -> Response {
    (StatusCode::GATEWAY_TIMEOUT, Json(ErrorResponse { error })).into_response()
}

// ─── Control Routes ────────────────────────────────────────────────────────

async fn message(
    State(state): State<Arc<AppState>>,
    Json(data): Json<serde_json::Value>,
) -> Response {
    let (tx, rx) = oneshot::channel();
    let handled = state.worker.handle_message(&data, Some(tx));

    if handled == Some(ControlMessage::SkipWaiting) {
        activate_if_installed(&state.worker).await;
    }

    match rx.await {
        Ok(reply) => Json(reply).into_response(),
        Err(_) => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Activate an installed worker once skip-waiting has been requested.
pub async fn activate_if_installed(worker: &ServiceWorker) {
    if worker.state() != WorkerState::Installed {
        return;
    }
    match worker.activate().await {
        Ok(removed) => info!(removed = removed.len(), "Worker activated"),
        Err(e) => warn!(error = %e, "Activation failed"),
    }
}

async fn push(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let payload = if body.is_empty() { None } else { Some(&body[..]) };
    match state.worker.handle_push(payload).await {
        Ok(Some(notification)) => (StatusCode::ACCEPTED, Json(notification)).into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn notification_click(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NotificationClickRequest>,
) -> StatusCode {
    state
        .worker
        .handle_notification_click(&req.notification_id, req.action.as_deref())
        .await;
    StatusCode::NO_CONTENT
}

async fn list_notifications(State(state): State<Arc<AppState>>) -> Json<Vec<Notification>> {
    Json(state.notifications.visible())
}

async fn list_windows(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.clients.opened_windows())
}

async fn cache_stats(State(state): State<Arc<AppState>>) -> Json<Vec<PartitionStats>> {
    Json(state.worker.storage().stats().await)
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        state: state.worker.state(),
        version: WORKER_VERSION.to_string(),
        cache_version: state.worker.config().worker.version.clone(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
