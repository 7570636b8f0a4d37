//! Brave API client error types.

use std::sync::Arc;

use productshot_core::Error;

/// Errors from Brave Image Search API client.
#[derive(Debug, thiserror::Error)]
pub enum BraveError {
    /// Missing API key.
    #[error("missing API key: PRODUCTSHOT_BRAVE_API_KEY not set")]
    MissingApiKey,

    /// Invalid search query.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Invalid count parameter (must be 1-100).
    #[error("invalid count: must be 1-100")]
    InvalidCount,

    /// Authentication failed (invalid API key).
    #[error("authentication failed: invalid API key")]
    AuthError,

    /// Rate limited by Brave API.
    #[error("rate limited: too many requests")]
    RateLimited,

    /// HTTP error response.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

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

impl From<reqwest::Error> for BraveError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { BraveError::Timeout } else { BraveError::Network(Arc::new(err)) }
    }
}

impl From<BraveError> for Error {
    fn from(err: BraveError) -> Self {
        match err {
            BraveError::AuthError | BraveError::MissingApiKey => Error::BraveAuthError(err.to_string()),
            BraveError::RateLimited => Error::BraveRateLimited(err.to_string()),
            BraveError::InvalidQuery(_) | BraveError::InvalidCount => Error::InvalidInput(err.to_string()),
            BraveError::Timeout => Error::FetchTimeout("brave image search".into()),
            other => Error::HttpError(other.to_string()),
        }
    }
}
