//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use std::collections::HashSet;

use crate::config::{AppConfig, KNOWN_PROVIDERS};
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `cache_ttl_secs` is 0
    /// - `user_agent` is empty
    /// - `providers` is empty, repeats a name, or names an unknown provider
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.cache_ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "cache_ttl_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.providers.is_empty() {
            return Err(ConfigError::Invalid {
                field: "providers".into(),
                reason: "must name at least one provider".into(),
            });
        }

        let mut seen = HashSet::new();
        for name in &self.providers {
            if !KNOWN_PROVIDERS.contains(&name.as_str()) {
                return Err(ConfigError::Invalid {
                    field: "providers".into(),
                    reason: format!("unknown provider '{}' (expected one of {})", name, KNOWN_PROVIDERS.join(", ")),
                });
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::Invalid {
                    field: "providers".into(),
                    reason: format!("'{}' listed twice", name),
                });
            }
        }

        for warning in self.warnings() {
            tracing::warn!(providers = ?self.providers, "{warning}");
        }

        Ok(())
    }

    /// Settings that are valid but will not behave the way they read.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let wants_browser = self.providers.iter().any(|name| name != "brave-images");
        if wants_browser && !self.render_enabled {
            warnings.push("browser providers configured while render_enabled is false; they will be skipped".into());
        }

        let wants_brave = self.providers.iter().any(|name| name == "brave-images");
        if wants_brave && self.require_brave_api_key().is_err() {
            warnings.push("brave-images configured without PRODUCTSHOT_BRAVE_API_KEY; it will be skipped".into());
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_max_bytes_zero() {
        let config = AppConfig { max_bytes: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_bytes"));
    }

    #[test]
    fn test_validate_max_bytes_exceeds_limit() {
        let config = AppConfig { max_bytes: 51 * 1024 * 1024, ..Default::default() }; // 51MB
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_bytes"));
    }

    #[test]
    fn test_validate_timeout_too_small() {
        let config = AppConfig { timeout_ms: 50, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_timeout_exceeds_limit() {
        let config = AppConfig { timeout_ms: 301_000, ..Default::default() }; // 5min 1sec
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_zero_ttl() {
        let config = AppConfig { cache_ttl_secs: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache_ttl_secs"));
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = AppConfig { user_agent: String::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "user_agent"));
    }

    #[test]
    fn test_validate_empty_providers() {
        let config = AppConfig { providers: Vec::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "providers"));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let config = AppConfig { providers: vec!["altavista".into()], ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { reason, .. }) if reason.contains("altavista")));
    }

    #[test]
    fn test_validate_duplicate_provider() {
        let config = AppConfig { providers: vec!["brave-images".into(), "brave-images".into()], ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { reason, .. }) if reason.contains("twice")));
    }

    #[test]
    fn test_validate_edge_case_values() {
        // minimum valid values
        let config = AppConfig { max_bytes: 1, timeout_ms: 100, cache_ttl_secs: 1, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_max_values() {
        // exactly 50MB
        let config = AppConfig { max_bytes: 50 * 1024 * 1024, timeout_ms: 300_000, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_warnings_default_config_without_key() {
        let warnings = AppConfig::default().warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("brave-images"));
    }

    #[test]
    fn test_warnings_render_disabled() {
        let config = AppConfig { render_enabled: false, brave_api_key: Some("token".into()), ..Default::default() };
        let warnings = config.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("render_enabled"));
    }

    #[test]
    fn test_warnings_clean_config() {
        let config = AppConfig { brave_api_key: Some("token".into()), ..Default::default() };
        assert!(config.warnings().is_empty());

        let brave_only = AppConfig { render_enabled: false, providers: vec!["brave-images".into()], ..config };
        assert!(brave_only.warnings().is_empty());
    }
}
