//! Candidate location parsing.
//!
//! Providers hand back either absolute http(s) URLs or inline
//! `data:image/...;base64,...` references. Everything else is rejected
//! before any network or filesystem work happens.

use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;

static DATA_URI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^data:(image/[A-Za-z0-9.+-]+)((?:;[A-Za-z0-9=._-]+)*);base64,(.*)$").expect("valid data URI regex")
});

/// Error type for location parsing failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LocationError {
    #[error("empty location")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid data reference: {0}")]
    InvalidData(String),
}

/// A parsed candidate location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Absolute http(s) URL, host lowercased and fragment removed.
    Http(url::Url),
    /// Inline image payload.
    Data { mime: String, bytes: Vec<u8> },
}

/// Parse a candidate location string.
///
/// HTTP normalization:
/// 1. Trim leading/trailing whitespace
/// 2. Require an explicit http or https scheme (relative paths are rejected)
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
///
/// Data references must be base64 encoded and declare an `image/*` type.
pub fn parse_location(input: &str) -> Result<Location, LocationError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(LocationError::Empty);
    }

    if trimmed.starts_with("data:") {
        return parse_data(trimmed);
    }

    let mut parsed = url::Url::parse(trimmed).map_err(|e| LocationError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(LocationError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str() {
        let host = host.to_lowercase();
        parsed
            .set_host(Some(&host))
            .map_err(|e| LocationError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(Location::Http(parsed))
}

fn parse_data(input: &str) -> Result<Location, LocationError> {
    let captures = DATA_URI
        .captures(input)
        .ok_or_else(|| LocationError::InvalidData("expected data:image/<type>;base64,<payload>".into()))?;

    let mime = captures[1].to_lowercase();
    let payload: String = captures[3].chars().filter(|c| !c.is_whitespace()).collect();

    let bytes = STANDARD
        .decode(payload.as_bytes())
        .map_err(|e| LocationError::InvalidData(e.to_string()))?;

    if bytes.is_empty() {
        return Err(LocationError::InvalidData("empty payload".into()));
    }

    Ok(Location::Data { mime, bytes })
}
