//! Browser-driven search result scraping.
//!
//! Each [`SearchSite`] describes a results page: how to build its URL, which
//! `<img>` elements hold result thumbnails, and which `src` forms to keep.
//! [`BrowserImageProvider`] renders the page through a [`Renderer`] and
//! harvests those sources in page order.

pub mod images;

pub use images::harvest_image_sources;

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::render::{RenderOptions, Renderer};
use productshot_core::{Error, ImageProvider};

/// A search site that can be scraped for candidate images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchSite {
    BingImages,
    GoogleShopping,
}

impl SearchSite {
    /// Parse a provider name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "bing-images" => Some(Self::BingImages),
            "google-shopping" => Some(Self::GoogleShopping),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::BingImages => "bing-images",
            Self::GoogleShopping => "google-shopping",
        }
    }

    /// CSS selector for result images.
    pub fn image_selector(&self) -> &'static str {
        match self {
            Self::BingImages => "img.mimg",
            Self::GoogleShopping => "img.TL92Hc",
        }
    }

    /// `src` prefixes worth keeping. Shopping thumbnails are often inlined.
    pub fn allowed_prefixes(&self) -> &'static [&'static str] {
        match self {
            Self::BingImages => &["http"],
            Self::GoogleShopping => &["http", "data:image"],
        }
    }

    /// Results page URL for `query`.
    pub fn search_url(&self, query: &str) -> Result<Url, Error> {
        let (base, params): (&str, &[(&str, &str)]) = match self {
            Self::BingImages => ("https://www.bing.com/images/search", &[("q", query)]),
            Self::GoogleShopping => ("https://www.google.com/search", &[("tbm", "shop"), ("q", query)]),
        };

        Url::parse_with_params(base, params).map_err(|e| Error::provider(self.name(), e.to_string()))
    }
}

/// Scrapes a [`SearchSite`] through a shared renderer.
pub struct BrowserImageProvider {
    renderer: Arc<dyn Renderer>,
    site: SearchSite,
    timeout: Duration,
}

impl BrowserImageProvider {
    pub fn new(renderer: Arc<dyn Renderer>, site: SearchSite, timeout: Duration) -> Self {
        Self { renderer, site, timeout }
    }

    pub fn site(&self) -> SearchSite {
        self.site
    }
}

#[async_trait::async_trait]
impl ImageProvider for BrowserImageProvider {
    fn name(&self) -> &str {
        self.site.name()
    }

    async fn fetch(&self, query: &str) -> Result<Vec<String>, Error> {
        if query.trim().is_empty() {
            return Err(Error::InvalidInput("query cannot be empty".into()));
        }

        let url = self.site.search_url(query.trim())?;
        let opts = RenderOptions {
            timeout_ms: self.timeout.as_millis() as u64,
            wait_for: Some(self.site.image_selector().to_string()),
        };

        tracing::debug!(provider = self.site.name(), %url, "rendering results page");
        let page = self.renderer.render(&url, &opts).await?;

        let sources = harvest_image_sources(&page.html, self.site.image_selector(), self.site.allowed_prefixes());
        tracing::debug!(
            provider = self.site.name(),
            count = sources.len(),
            render_ms = page.render_time_ms,
            "harvested image sources"
        );

        Ok(sources)
    }
}
