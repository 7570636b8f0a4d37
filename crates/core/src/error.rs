//! Unified error types for productshot.
//!
//! Every message carries an upper-snake code prefix so log lines and run
//! summaries can be grepped by failure class.

/// Unified error type shared by the core and client crates.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty query).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// A provider failed to produce results.
    #[error("PROVIDER_FAILED: {provider}: {reason}")]
    ProviderFailed { provider: String, reason: String },

    /// Candidate location is neither an http(s) URL nor a data reference.
    #[error("INVALID_LOCATION: {0}")]
    InvalidLocation(String),

    /// SSRF blocked - private/internal address not allowed.
    #[error("SSRF_BLOCKED: {0}")]
    SsrfBlocked(String),

    /// Fetch timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// HTTP error response or transport failure.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// Brave API authentication error.
    #[error("BRAVE_AUTH_ERROR: {0}")]
    BraveAuthError(String),

    /// Brave API rate limited.
    #[error("BRAVE_RATE_LIMITED: {0}")]
    BraveRateLimited(String),

    /// Render mode is disabled.
    #[error("RENDER_DISABLED")]
    RenderDisabled,

    /// Render failed.
    #[error("RENDER_FAILED: {0}")]
    RenderFailed(String),

    /// Image bytes could not be decoded.
    #[error("DECODE_FAILED: {0}")]
    DecodeFailed(String),

    /// Filesystem operation failed.
    #[error("IO_ERROR: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The stable code prefix of this error.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "INVALID_INPUT",
            Error::ProviderFailed { .. } => "PROVIDER_FAILED",
            Error::InvalidLocation(_) => "INVALID_LOCATION",
            Error::SsrfBlocked(_) => "SSRF_BLOCKED",
            Error::FetchTimeout(_) => "FETCH_TIMEOUT",
            Error::FetchTooLarge(_) => "FETCH_TOO_LARGE",
            Error::HttpError(_) => "HTTP_ERROR",
            Error::BraveAuthError(_) => "BRAVE_AUTH_ERROR",
            Error::BraveRateLimited(_) => "BRAVE_RATE_LIMITED",
            Error::RenderDisabled => "RENDER_DISABLED",
            Error::RenderFailed(_) => "RENDER_FAILED",
            Error::DecodeFailed(_) => "DECODE_FAILED",
            Error::Io(_) => "IO_ERROR",
        }
    }

    /// Shorthand for a provider failure.
    pub fn provider(provider: impl Into<String>, reason: impl ToString) -> Self {
        Error::ProviderFailed { provider: provider.into(), reason: reason.to_string() }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::DecodeFailed(err.to_string())
    }
}
