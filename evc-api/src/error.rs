//! Error types for evc-api
//!
//! Every failure leaves the service as `{success: false, error, message?}`.
//! Validation problems map to 400, missing events to 404, and remote failures
//! to 500 carrying the upstream message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::source::SourceError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Remote event source failure (500); `context` is the user-facing summary
    #[error("{context}: {source}")]
    Upstream {
        context: String,
        #[source]
        source: SourceError,
    },

    /// evc-common error
    #[error("Common error: {0}")]
    Common(#[from] evc_common::Error),
}

impl ApiError {
    pub fn upstream(context: impl Into<String>, source: SourceError) -> Self {
        ApiError::Upstream {
            context: context.into(),
            source,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::Upstream { context, source } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                context,
                Some(source.to_string()),
            ),
            ApiError::Common(evc_common::Error::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, msg, None)
            }
            ApiError::Common(evc_common::Error::NotFound(msg)) => {
                (StatusCode::NOT_FOUND, msg, None)
            }
            ApiError::Common(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                Some(err.to_string()),
            ),
        };

        if status.is_server_error() {
            tracing::error!(status = %status, error = %error, message = ?message, "Request failed");
        }

        let body = match message {
            Some(message) => json!({ "success": false, "error": error, "message": message }),
            None => json!({ "success": false, "error": error }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn render(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_bad_request_has_no_message() {
        let (status, body) = render(ApiError::BadRequest("Invalid event ID".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "success": false, "error": "Invalid event ID" }));
    }

    #[tokio::test]
    async fn test_upstream_carries_source_message() {
        let err = ApiError::upstream(
            "Failed to fetch events",
            SourceError::Network("connection refused".to_string()),
        );
        let (status, body) = render(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch events");
        assert_eq!(body["message"], "Network error: connection refused");
    }

    #[tokio::test]
    async fn test_other_common_errors_are_internal() {
        let err = ApiError::from(evc_common::Error::Config("unreadable".to_string()));
        let (status, body) = render(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
        assert_eq!(body["message"], "Configuration error: unreadable");
    }

    #[tokio::test]
    async fn test_common_invalid_input_is_client_error() {
        let err = ApiError::from(evc_common::Error::InvalidInput("bad budget".to_string()));
        let (status, body) = render(err).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad budget");
    }
}
