//! Unified API error handling with structured responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::upstream::UpstreamError;

/// API error type with structured responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required request field is absent or empty.
    #[error("{0}")]
    MissingInput(String),

    /// The upstream provider does not know the requested thread.
    #[error("{0}")]
    ThreadNotFound(String),

    /// The supplied credential was rejected by the upstream provider.
    #[error("{0}")]
    InvalidCredential(String),

    /// Any other upstream failure or network fault.
    #[error("{0}")]
    Upstream(String),

    /// Storage-level failure.
    #[error("{0}")]
    Storage(String),
}

impl ApiError {
    pub fn missing_input(msg: impl Into<String>) -> Self {
        Self::MissingInput(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingInput(_) => StatusCode::BAD_REQUEST,
            Self::ThreadNotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidCredential(_) => StatusCode::UNAUTHORIZED,
            Self::Upstream(_) | Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingInput(_) => "MISSING_INPUT",
            Self::ThreadNotFound(_) => "THREAD_NOT_FOUND",
            Self::InvalidCredential(_) => "INVALID_CREDENTIAL",
            Self::Upstream(_) => "UPSTREAM_UNAVAILABLE",
            Self::Storage(_) => "STORAGE_FAILURE",
        }
    }
}

/// Structured error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();
        let message = self.to_string();

        match &self {
            ApiError::Upstream(msg) | ApiError::Storage(msg) => {
                error!(error_code = code, message = %msg, "API error");
            }
            ApiError::InvalidCredential(msg) => {
                warn!(error_code = code, message = %msg, "credential rejected");
            }
            _ => {
                debug!(error_code = code, message = %message, "client error");
            }
        }

        let body = ErrorResponse {
            message,
            code: code.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Translate upstream failures into wire-level codes with human-readable
/// messages at the request-handling boundary.
impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::ThreadNotFound(_) => {
                ApiError::ThreadNotFound("Thread not found. Please check the thread ID.".to_string())
            }
            UpstreamError::InvalidCredential => {
                ApiError::InvalidCredential("Invalid API key. Please check your API key.".to_string())
            }
            UpstreamError::RequestFailed(err) => ApiError::Upstream(err.to_string()),
            UpstreamError::Api { message, .. } => ApiError::Upstream(message),
            UpstreamError::Parse(msg) => ApiError::Upstream(msg),
        }
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::missing_input("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::ThreadNotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::InvalidCredential("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Upstream("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Storage("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_upstream_classification() {
        let err: ApiError = UpstreamError::ThreadNotFound("t".into()).into();
        assert!(matches!(err, ApiError::ThreadNotFound(_)));

        let err: ApiError = UpstreamError::InvalidCredential.into();
        assert!(matches!(err, ApiError::InvalidCredential(_)));

        let err: ApiError = UpstreamError::Api {
            status: 500,
            message: "boom".into(),
        }
        .into();
        assert!(matches!(err, ApiError::Upstream(msg) if msg == "boom"));
    }
}
