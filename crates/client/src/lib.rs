//! Client code for productshot.
//!
//! This crate provides the network collaborators of the core pipeline: the
//! image downloader, the Brave image provider, headless rendering and
//! search result scraping.

pub mod brave;
pub mod fetch;
pub mod providers;
pub mod render;
pub mod scrape;

pub use brave::{BraveClient, BraveConfig, BraveError, BraveImageProvider};
pub use fetch::{DownloadConfig, FetchedImage, ImageDownloader};
pub use providers::{build_providers, build_providers_with};
pub use render::{RenderError, RenderOptions, RenderedPage, Renderer};
pub use scrape::{BrowserImageProvider, SearchSite, harvest_image_sources};
