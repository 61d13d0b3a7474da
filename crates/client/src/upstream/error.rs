//! Upstream client error types.

use std::sync::Arc;

/// Errors from the upstream character API client.
///
/// Non-success HTTP statuses are not errors at this layer; they degrade to
/// empty or absent results.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UpstreamError {
    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { UpstreamError::Timeout } else { UpstreamError::Network(Arc::new(err)) }
    }
}

impl From<UpstreamError> for citadel_core::Error {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::InvalidRequest(msg) => citadel_core::Error::InvalidInput(msg),
            other => citadel_core::Error::Upstream(other.to_string()),
        }
    }
}
