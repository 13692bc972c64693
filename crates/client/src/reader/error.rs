//! Rendering service client error types.

use std::sync::Arc;

/// Errors from the rendering service client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ReaderError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Build(String),

    /// Non-success status from the rendering service.
    #[error("rendering service returned HTTP {status}: {detail}")]
    HttpError { status: u16, detail: String },

    /// Response body larger than the configured limit.
    #[error("response of {len} bytes exceeds limit of {max}")]
    TooLarge { len: u64, max: usize },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),
}

impl From<reqwest::Error> for ReaderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { ReaderError::Timeout } else { ReaderError::Network(Arc::new(err)) }
    }
}

impl From<ReaderError> for jinamd_core::Error {
    fn from(err: ReaderError) -> Self {
        jinamd_core::Error::FetchFailed(err.to_string())
    }
}
