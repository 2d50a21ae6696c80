//! HTTP routes
//!
//! ## GET /health
//!
//! Health check endpoint. Returns "OK" with 200 status. Not rate limited.
//!
//! ## GET /metrics
//!
//! Prometheus text exposition of admission counters and store occupancy.
//! Not rate limited.
//!
//! ## Everything else
//!
//! Passes through the admission middleware, then answers
//! `{"status": "ok"}`. This is where an embedding application mounts its
//! own routes.

use crate::AppState;
use crate::middleware::{admission, request_log};
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::{Router, middleware};
use serde_json::{Value, json};

/// Build the full router: unprotected operational routes, the admission
/// protected fallback, and request logging around all of it
pub fn router(state: AppState) -> Router {
    protect(Router::new().fallback(index), state)
}

/// Put `routes` behind the admission middleware and add the operational
/// routes and request logging
pub fn protect(routes: Router<AppState>, state: AppState) -> Router {
    let protected = routes.layer(middleware::from_fn_with_state(state.clone(), admission));

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/metrics", get(export_metrics))
        .merge(protected)
        .layer(middleware::from_fn_with_state(state.clone(), request_log))
        .with_state(state)
}

async fn index() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn export_metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = state.metrics.export_prometheus(state.store.snapshot());
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}
