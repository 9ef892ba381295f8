//! Upstream client error types.

use thiserror::Error;

/// Result type for upstream operations.
pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Errors that can occur talking to the upstream thread provider.
///
/// No retries happen at this layer; retry policy belongs to the caller.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The provider does not know this thread.
    #[error("thread not found: {0}")]
    ThreadNotFound(String),

    /// The provider rejected the supplied credential.
    #[error("invalid credential")]
    InvalidCredential,

    /// Network-level failure before a status code was obtained.
    #[error("upstream request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The provider returned a non-success status other than 401/404.
    #[error("upstream error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The provider responded with a body we could not decode.
    #[error("failed to parse upstream response: {0}")]
    Parse(String),
}
