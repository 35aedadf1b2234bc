//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_ttl_hours` is 0 or exceeds one year
    /// - `max_file_size_mb` is 0 or exceeds 100MB
    /// - `ocr_timeout_ms` is less than 100ms or exceeds 10 minutes
    /// - `ocr_url` is empty or `redis_port` is 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_ttl_hours == 0 {
            return Err(ConfigError::Invalid {
                field: "cache_ttl_hours".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.cache_ttl_hours > 24 * 365 {
            return Err(ConfigError::Invalid {
                field: "cache_ttl_hours".into(),
                reason: "must not exceed one year (8760)".into(),
            });
        }

        if self.max_file_size_mb == 0 {
            return Err(ConfigError::Invalid { field: "max_file_size_mb".into(), reason: "must be greater than 0".into() });
        }
        if self.max_file_size_mb > 100 {
            return Err(ConfigError::Invalid { field: "max_file_size_mb".into(), reason: "must not exceed 100MB".into() });
        }

        if self.ocr_timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "ocr_timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.ocr_timeout_ms > 600_000 {
            return Err(ConfigError::Invalid {
                field: "ocr_timeout_ms".into(),
                reason: "must not exceed 10 minutes (600000ms)".into(),
            });
        }

        if self.ocr_url.is_empty() {
            return Err(ConfigError::Invalid { field: "ocr_url".into(), reason: "must not be empty".into() });
        }

        if self.redis_port == 0 {
            return Err(ConfigError::Invalid { field: "redis_port".into(), reason: "must be a valid port".into() });
        }

        Ok(())
    }
}
