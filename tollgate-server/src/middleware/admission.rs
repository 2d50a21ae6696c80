//! Admission middleware
//!
//! Identifies the client, asks the store for a decision and either forwards
//! the request or short-circuits with an error response:
//!
//! | Situation                 | Response |
//! |---------------------------|----------|
//! | Client not identifiable   | 403      |
//! | Store error               | 500      |
//! | Bucket empty              | 429      |
//! | Admitted                  | next handler |

use super::peer_addr;
use crate::AppState;
use crate::client_ip::client_ip;
use crate::error::ApiError;
use crate::metrics::Decision;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

pub async fn admission(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let peer = peer_addr(&request);
    let Some(ip) = client_ip(request.headers(), peer, state.trust_proxy_headers) else {
        tracing::warn!("Unable to extract client IP");
        state.metrics.record(Decision::Unidentified);
        return Err(ApiError::Forbidden("Unable to identify client".into()));
    };

    match state.store.allow(&ip) {
        Ok(true) => {
            state.metrics.record(Decision::Allowed);
            Ok(next.run(request).await)
        }
        Ok(false) => {
            tracing::warn!(ip = %ip, "Rate limit exceeded");
            state.metrics.record(Decision::Denied);
            Err(ApiError::TooManyRequests("Rate limit exceeded".into()))
        }
        Err(e) => {
            tracing::error!(ip = %ip, error = %e, "Rate limiter error");
            state.metrics.record(Decision::Error);
            Err(ApiError::Internal("Rate limiter error".into()))
        }
    }
}
