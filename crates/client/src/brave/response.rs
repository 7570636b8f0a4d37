//! Brave Image Search API response types and normalization.

use serde::Deserialize;

use productshot_core::is_candidate_location;

/// Raw response from Brave Image Search API.
#[derive(Debug, Deserialize)]
pub struct BraveImageResponse {
    #[serde(default)]
    pub query: Option<QueryInfo>,
    #[serde(default)]
    pub results: Vec<ImageResult>,
}

/// Query metadata from Brave response.
#[derive(Debug, Deserialize)]
pub struct QueryInfo {
    pub original: String,
}

/// Individual image result from Brave.
#[derive(Debug, Deserialize)]
pub struct ImageResult {
    #[serde(default)]
    pub title: String,
    /// Page the image was found on.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub properties: Option<ImageProperties>,
    #[serde(default)]
    pub thumbnail: Option<Thumbnail>,
}

/// Full-size image metadata.
#[derive(Debug, Deserialize)]
pub struct ImageProperties {
    #[serde(default)]
    pub url: Option<String>,
}

/// Brave-proxied thumbnail.
#[derive(Debug, Deserialize)]
pub struct Thumbnail {
    #[serde(default)]
    pub src: Option<String>,
}

impl ImageResult {
    /// Full-size image URL, falling back to the thumbnail.
    pub fn image_location(&self) -> Option<&str> {
        self.properties
            .as_ref()
            .and_then(|p| p.url.as_deref())
            .or_else(|| self.thumbnail.as_ref().and_then(|t| t.src.as_deref()))
    }
}

impl BraveImageResponse {
    /// Candidate image locations in rank order.
    ///
    /// Only absolute http(s) locations survive; duplicates are dropped.
    pub fn candidates(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.results
            .iter()
            .filter_map(ImageResult::image_location)
            .filter(|loc| is_candidate_location(loc) && !loc.starts_with("data:"))
            .filter(|loc| seen.insert(*loc))
            .map(str::to_string)
            .collect()
    }
}
