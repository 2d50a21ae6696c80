//! Structured request logging
//!
//! Emits one event per request with the client IP, method, path, status and
//! `duration_ms`. Successful requests log at `info`, client errors (including
//! rate-limit rejections) at `warn`, server errors at `error`.

use super::peer_addr;
use crate::AppState;
use crate::client_ip::client_ip;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use std::time::{Duration, Instant};
use tracing::Level;

pub async fn request_log(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let ip = client_ip(
        request.headers(),
        peer_addr(&request),
        state.trust_proxy_headers,
    )
    .unwrap_or_else(|| "-".to_string());

    let response = next.run(request).await;

    let duration = duration_ms(start.elapsed());
    let level = level_for(response.status());
    let status = response.status().as_u16();

    // `tracing` macros need the level at compile time
    if level == Level::ERROR {
        tracing::error!(%ip, %method, %path, status, duration_ms = duration, "Request failed");
    } else if level == Level::WARN {
        tracing::warn!(%ip, %method, %path, status, duration_ms = duration, "Request rejected");
    } else {
        tracing::info!(%ip, %method, %path, status, duration_ms = duration, "Request processed");
    }

    response
}

/// Log level for a finished request: server errors at `ERROR`, client errors
/// (including rate-limit rejections) at `WARN`, everything else at `INFO`
pub fn level_for(status: StatusCode) -> Level {
    if status.is_server_error() {
        Level::ERROR
    } else if status.is_client_error() {
        Level::WARN
    } else {
        Level::INFO
    }
}

/// Milliseconds, keeping sub-millisecond precision for fast requests
pub fn duration_ms(elapsed: Duration) -> f64 {
    if elapsed < Duration::from_millis(1) {
        elapsed.as_micros() as f64 / 1000.0
    } else {
        elapsed.as_millis() as f64
    }
}
