//! Brave Image Search API client.
//!
//! Provides a client for the Brave Image Search API with rate limiting,
//! request validation, and candidate extraction.
//!
//! ### Specification
//!
//! - **Endpoint**: `https://api.search.brave.com/res/v1/images/search`
//! - **Authentication**: Uses `X-Subscription-Token` header.
//! - **Rate Limiting**:
//!   - Default 1s interval between requests (free tier).
//!   - 429 is surfaced as `BRAVE_RATE_LIMITED` so the fetcher falls through.
//! - **Normalization**: `properties.url` per result, else `thumbnail.src`.

pub mod error;
pub mod request;
pub mod response;

pub use error::BraveError;
pub use request::{ImageSearchRequest, SafeSearch};
pub use response::{BraveImageResponse, ImageResult};

use reqwest::header;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use productshot_core::{AppConfig, Error, ImageProvider};

/// Default base URL for Brave Search API.
const DEFAULT_BASE_URL: &str = "https://api.search.brave.com/res/v1";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "productshot/0.1";

/// Minimum interval between requests for rate limiting (1 second for free tier).
const MIN_REQUEST_INTERVAL: Duration = Duration::from_secs(1);

/// Provider name used in config and logs.
pub const PROVIDER_NAME: &str = "brave-images";

/// Brave API client configuration.
#[derive(Debug, Clone)]
pub struct BraveConfig {
    /// API subscription token.
    pub api_key: String,
    /// Base URL (default: https://api.search.brave.com/res/v1).
    pub base_url: String,
    /// Request timeout (default: 10s).
    pub timeout: Duration,
    /// User-agent string (default: productshot/0.1).
    pub user_agent: String,
}

impl Default for BraveConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl BraveConfig {
    /// Build from application config. Fails if no API key is configured.
    pub fn from_app(config: &AppConfig) -> Result<Self, BraveError> {
        let api_key = config.require_brave_api_key().map_err(|_| BraveError::MissingApiKey)?;

        Ok(Self {
            api_key: api_key.to_string(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
            ..Default::default()
        })
    }
}

/// Rate limiter to enforce request intervals.
#[derive(Debug)]
struct RateLimiter {
    last_request: Mutex<Instant>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(Instant::now().checked_sub(min_interval).unwrap_or_else(Instant::now)),
            min_interval,
        }
    }

    /// Acquire permission to make a request, waiting if necessary.
    async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        let elapsed = last.elapsed();
        if elapsed < self.min_interval {
            tokio::time::sleep(self.min_interval - elapsed).await;
        }
        *last = Instant::now();
    }
}

/// Brave Image Search API client.
#[derive(Debug, Clone)]
pub struct BraveClient {
    http: reqwest::Client,
    config: BraveConfig,
    rate_limiter: Arc<RateLimiter>,
}

impl BraveClient {
    /// Create a new Brave client with the given configuration.
    pub fn new(config: BraveConfig) -> Result<Self, BraveError> {
        if config.api_key.is_empty() {
            return Err(BraveError::MissingApiKey);
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BraveError::Network(Arc::new(e)))?;

        Ok(Self { http, config, rate_limiter: Arc::new(RateLimiter::new(MIN_REQUEST_INTERVAL)) })
    }

    /// Execute an image search query.
    ///
    /// This method handles rate limiting, request validation, and response parsing.
    pub async fn search_images(&self, req: &ImageSearchRequest) -> Result<BraveImageResponse, BraveError> {
        req.validate()?;

        self.rate_limiter.acquire().await;

        let start = Instant::now();
        let url = format!("{}/images/search", self.config.base_url);

        tracing::debug!("searching Brave images: query={}", req.q);

        let http_response = self
            .http
            .get(&url)
            .header("X-Subscription-Token", &self.config.api_key)
            .header(header::ACCEPT, "application/json")
            .header(header::USER_AGENT, &self.config.user_agent)
            .query(req)
            .send()
            .await?;

        let status = http_response.status();
        tracing::debug!("Brave API response status: {}", status);

        if status == 401 || status == 403 {
            return Err(BraveError::AuthError);
        }

        if status == 429 {
            return Err(BraveError::RateLimited);
        }

        if status.is_client_error() || status.is_server_error() {
            return Err(BraveError::HttpError { status: status.as_u16() });
        }

        let bytes = http_response.bytes().await?;
        let response = parse_response(&bytes)?;

        tracing::debug!("image search completed in {:?}, {} results", start.elapsed(), response.results.len());

        Ok(response)
    }
}

fn parse_response(bytes: &[u8]) -> Result<BraveImageResponse, BraveError> {
    serde_json::from_slice(bytes).map_err(|e| BraveError::Parse(e.to_string()))
}

/// `brave-images` provider backed by [`BraveClient`].
#[derive(Debug, Clone)]
pub struct BraveImageProvider {
    client: BraveClient,
}

impl BraveImageProvider {
    pub fn new(client: BraveClient) -> Self {
        Self { client }
    }

    pub fn from_app(config: &AppConfig) -> Result<Self, Error> {
        Ok(Self::new(BraveClient::new(BraveConfig::from_app(config)?)?))
    }
}

#[async_trait::async_trait]
impl ImageProvider for BraveImageProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn fetch(&self, query: &str) -> Result<Vec<String>, Error> {
        let response = self.client.search_images(&ImageSearchRequest::for_query(query)).await?;
        Ok(response.candidates())
    }
}
