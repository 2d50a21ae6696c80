//! Request-path errors and their HTTP responses
//!
//! Each [`ApiError`] variant maps to one status code and a JSON body
//! `{"error": "message"}`. The three admission outcomes stay distinct so a
//! client can tell "slow down" from "who are you" from "limiter broken".

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct HttpErrorResponse {
    /// Error message
    pub error: String,
}

/// Application-level error type that implements `IntoResponse`
///
/// - `Forbidden` → 403, the client could not be identified
/// - `TooManyRequests` → 429, the client's bucket is empty
/// - `Internal` → 500, the admission store failed
#[derive(Debug)]
pub enum ApiError {
    Forbidden(String),
    TooManyRequests(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            ApiError::Forbidden(msg) | ApiError::TooManyRequests(msg) | ApiError::Internal(msg) => msg,
        };
        (status, Json(HttpErrorResponse { error })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::Forbidden(String::new()).into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::TooManyRequests(String::new()).into_response().status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::Internal(String::new()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_body_shape() {
        let body = serde_json::to_string(&HttpErrorResponse {
            error: "Rate limit exceeded".to_string(),
        })
        .unwrap();

        assert_eq!(body, r#"{"error":"Rate limit exceeded"}"#);
    }
}
