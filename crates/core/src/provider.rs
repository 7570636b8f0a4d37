//! Image provider capability.
//!
//! A provider turns a product query into an ordered list of candidate image
//! locations (absolute http(s) URLs or `data:image` references). Providers are
//! responsible for dropping anything else, such as relative paths, before
//! returning.

use crate::Error;

/// Source of candidate image locations.
#[async_trait::async_trait]
pub trait ImageProvider: Send + Sync {
    /// Stable display name used in logs and fetch reports.
    fn name(&self) -> &str;

    /// Fetch candidate locations for `query`, best first.
    async fn fetch(&self, query: &str) -> Result<Vec<String>, Error>;
}

/// Whether a string is a location the pipeline can download.
pub fn is_candidate_location(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://") || location.starts_with("data:image")
}
