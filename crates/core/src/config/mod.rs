//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (PRODUCTSHOT_*)
//! 2. TOML config file (if PRODUCTSHOT_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Provider names the client crate knows how to build.
pub const KNOWN_PROVIDERS: &[&str] = &["bing-images", "google-shopping", "brave-images"];

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (PRODUCTSHOT_*)
/// 2. TOML config file (if PRODUCTSHOT_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Brave API subscription token for the brave-images provider.
    ///
    /// Set via PRODUCTSHOT_BRAVE_API_KEY environment variable.
    /// Required only when brave-images is among the configured providers.
    #[serde(default)]
    pub brave_api_key: Option<String>,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via PRODUCTSHOT_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to download per candidate image.
    ///
    /// Set via PRODUCTSHOT_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via PRODUCTSHOT_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Lifetime of a cached candidate list in seconds.
    ///
    /// Set via PRODUCTSHOT_CACHE_TTL_SECS environment variable.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Directory downloaded candidates are written to.
    ///
    /// Set via PRODUCTSHOT_IMAGES_DIR environment variable.
    #[serde(default = "default_images_dir")]
    pub images_dir: PathBuf,

    /// Providers in fallback priority order.
    ///
    /// Set via PRODUCTSHOT_PROVIDERS environment variable.
    #[serde(default = "default_providers")]
    pub providers: Vec<String>,

    /// Whether the headless browser providers are enabled.
    ///
    /// Set via PRODUCTSHOT_RENDER_ENABLED environment variable.
    #[serde(default = "default_render_enabled")]
    pub render_enabled: bool,

    /// Per-page render timeout in milliseconds.
    ///
    /// Set via PRODUCTSHOT_RENDER_TIMEOUT_MS environment variable.
    #[serde(default = "default_render_timeout_ms")]
    pub render_timeout_ms: u64,
}

fn default_user_agent() -> String {
    "productshot/0.1".into()
}

fn default_max_bytes() -> usize {
    10_485_760 // 10MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_cache_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_images_dir() -> PathBuf {
    PathBuf::from("./public/images")
}

fn default_providers() -> Vec<String> {
    KNOWN_PROVIDERS.iter().map(|name| name.to_string()).collect()
}

fn default_render_enabled() -> bool {
    true
}

fn default_render_timeout_ms() -> u64 {
    30_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            brave_api_key: None,
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
            images_dir: default_images_dir(),
            providers: default_providers(),
            render_enabled: default_render_enabled(),
            render_timeout_ms: default_render_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Cache TTL as Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Load and validate configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if loading fails (see [`AppConfig::load_raw`]) or
    /// validation fails afterwards.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::load_raw()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from all sources with layered precedence, without
    /// validating it. Callers that layer their own overrides on top validate
    /// once they are done.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `PRODUCTSHOT_`
    /// 2. TOML file from `PRODUCTSHOT_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// `PRODUCTSHOT_PROVIDERS` is read as a comma-separated list.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::LoadFailed` if the configuration file cannot be
    /// read or environment variables cannot be parsed.
    pub fn load_raw() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("PRODUCTSHOT_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("PRODUCTSHOT_")
                .ignore(&["config_file", "providers"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let mut config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        if let Ok(list) = std::env::var("PRODUCTSHOT_PROVIDERS") {
            config.providers = parse_provider_list(&list);
        }

        Ok(config)
    }

    /// Check if Brave API key is available (for deferred validation).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the Brave API key is not set.
    pub fn require_brave_api_key(&self) -> Result<&str, ConfigError> {
        self.brave_api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ConfigError::Missing {
                field: "brave_api_key".into(),
                hint: "Set PRODUCTSHOT_BRAVE_API_KEY environment variable".into(),
            })
    }
}

/// Split a comma-separated provider list, dropping blanks.
pub fn parse_provider_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
