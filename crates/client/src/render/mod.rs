//! Headless browser rendering for JS-heavy search result pages.
//!
//! This module provides a renderer trait and, behind the `render` feature, an
//! implementation using chromiumoxide for headless Chrome/Chromium control.

#[cfg(feature = "render")]
use std::time::Duration;
use thiserror::Error;
use url::Url;

use productshot_core::Error;

/// Errors that can occur during page rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Failed to launch or connect to browser.
    #[error("browser launch failed: {0}")]
    BrowserLaunch(String),

    /// Failed to navigate to URL.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// Failed to get page content.
    #[error("content retrieval failed: {0}")]
    ContentRetrieval(String),

    /// Timeout waiting for page to load.
    #[error("render timeout after {0}ms")]
    Timeout(u64),

    /// Wait selector not found.
    #[error("wait_for selector not found: {0}")]
    SelectorNotFound(String),

    /// Crate was built without the `render` feature or rendering is switched off.
    #[error("rendering disabled")]
    Disabled,
}

impl From<RenderError> for Error {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Disabled => Error::RenderDisabled,
            RenderError::Timeout(ms) => Error::FetchTimeout(format!("render exceeded {ms}ms")),
            other => Error::RenderFailed(other.to_string()),
        }
    }
}

/// Options for rendering a page.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Timeout in milliseconds (default: 30000).
    pub timeout_ms: u64,

    /// Optional CSS selector to wait for before extracting content.
    pub wait_for: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { timeout_ms: 30000, wait_for: None }
    }
}

/// Result of rendering a page.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Rendered HTML content.
    pub html: String,

    /// Final URL after redirects.
    pub final_url: Url,

    /// Time taken to render in milliseconds.
    pub render_time_ms: u64,
}

/// Renderer trait for headless browser page rendering.
#[async_trait::async_trait]
pub trait Renderer: Send + Sync {
    /// Render a URL to HTML via headless browser.
    async fn render(&self, url: &Url, opts: &RenderOptions) -> Result<RenderedPage, RenderError>;
}

/// Launch the default renderer for this build.
#[cfg(feature = "render")]
pub async fn launch(user_agent: &str) -> Result<std::sync::Arc<dyn Renderer>, RenderError> {
    Ok(std::sync::Arc::new(HeadlessRenderer::new(user_agent).await?))
}

/// Launch the default renderer for this build.
#[cfg(not(feature = "render"))]
pub async fn launch(_user_agent: &str) -> Result<std::sync::Arc<dyn Renderer>, RenderError> {
    Err(RenderError::Disabled)
}

/// Headless Chrome/Chromium renderer using chromiumoxide.
#[cfg(feature = "render")]
pub struct HeadlessRenderer {
    browser: chromiumoxide::Browser,
}

#[cfg(feature = "render")]
impl HeadlessRenderer {
    /// Create a new headless renderer by launching a browser instance.
    ///
    /// The browser uses a background task to handle Chrome DevTools Protocol
    /// events.
    pub async fn new(user_agent: &str) -> Result<Self, RenderError> {
        use chromiumoxide::browser::{Browser, BrowserConfig};
        use futures_util::StreamExt;

        let (browser, mut handler) = Browser::launch(
            BrowserConfig::builder()
                .window_size(1280, 720)
                .arg(format!("--user-agent={user_agent}"))
                .build()
                .map_err(RenderError::BrowserLaunch)?,
        )
        .await
        .map_err(|e| RenderError::BrowserLaunch(e.to_string()))?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("browser handler event error: {e}");
                    break;
                }
            }
        });

        Ok(Self { browser })
    }
}

#[cfg(feature = "render")]
#[async_trait::async_trait]
impl Renderer for HeadlessRenderer {
    async fn render(&self, url: &Url, opts: &RenderOptions) -> Result<RenderedPage, RenderError> {
        let start = std::time::Instant::now();
        let page = self
            .browser
            .new_page(url.as_str())
            .await
            .map_err(|e| RenderError::Navigation(e.to_string()))?;

        let waited = match &opts.wait_for {
            Some(selector) => {
                tokio::time::timeout(Duration::from_millis(opts.timeout_ms), async {
                    loop {
                        if page.find_element(selector.as_str()).await.is_ok() {
                            break;
                        }
                        tokio::time::sleep(Duration::from_millis(250)).await;
                    }
                })
                .await
            }
            None => {
                tokio::time::timeout(Duration::from_millis(opts.timeout_ms), async {
                    tokio::time::sleep(Duration::from_millis(2000)).await;
                })
                .await
            }
        };

        if waited.is_err() {
            page.close().await.ok();
            return Err(match &opts.wait_for {
                Some(selector) => RenderError::SelectorNotFound(selector.clone()),
                None => RenderError::Timeout(opts.timeout_ms),
            });
        }

        let html = page
            .content()
            .await
            .map_err(|e| RenderError::ContentRetrieval(e.to_string()))?;

        let page_url = page
            .url()
            .await
            .map_err(|e| RenderError::ContentRetrieval(e.to_string()))?;

        let final_url = Url::parse(page_url.as_deref().unwrap_or(url.as_str()))
            .map_err(|e| RenderError::Navigation(e.to_string()))?;

        let render_time_ms = start.elapsed().as_millis() as u64;

        page.close().await.ok();
        Ok(RenderedPage { html, final_url, render_time_ms })
    }
}
