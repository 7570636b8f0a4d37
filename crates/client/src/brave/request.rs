//! Brave Image Search API request types and validation.

use serde::Serialize;

use crate::brave::BraveError;

/// Search request parameters for Brave Image Search API.
///
/// Based on Brave Image Search API documentation:
/// https://api-dashboard.search.brave.com/app/documentation/image-search/get-started
#[derive(Debug, Clone, Serialize, Default)]
pub struct ImageSearchRequest {
    /// Search query (required, max 400 chars / 50 words).
    pub q: String,

    /// Number of results (1-100, default 50).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u8>,

    /// Safe search: off|strict (default strict).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safesearch: Option<SafeSearch>,
}

/// Safe search filtering levels accepted by the image endpoint.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SafeSearch {
    Off,
    Strict,
}

impl ImageSearchRequest {
    /// Request for `query` with the provider's default page size and strict filtering.
    pub fn for_query(query: &str) -> Self {
        Self { q: query.trim().to_string(), count: Some(20), safesearch: Some(SafeSearch::Strict) }
    }

    /// Validate the search request parameters.
    ///
    /// Returns an error if any parameters are out of range or malformed.
    pub fn validate(&self) -> Result<(), BraveError> {
        if self.q.trim().is_empty() {
            return Err(BraveError::InvalidQuery("query cannot be empty".to_string()));
        }

        if self.q.len() > 400 {
            return Err(BraveError::InvalidQuery(format!("query too long: {} chars (max 400)", self.q.len())));
        }

        let word_count = self.q.split_whitespace().count();
        if word_count > 50 {
            return Err(BraveError::InvalidQuery(format!("query too long: {} words (max 50)", word_count)));
        }

        if let Some(count) = self.count
            && !(1..=100).contains(&count)
        {
            return Err(BraveError::InvalidCount);
        }

        Ok(())
    }
}
