//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (DOCSTASH_*)
//! 2. TOML config file (if DOCSTASH_CONFIG_FILE set)
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

/// Which backing store the extraction cache uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// One JSON file per key in `cache_dir`.
    #[default]
    File,
    /// Redis keyspace with native per-key TTL.
    Remote,
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (DOCSTASH_*)
/// 2. TOML config file (if DOCSTASH_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Cache backend selection.
    ///
    /// Set via DOCSTASH_CACHE_TYPE environment variable (`file` or `remote`).
    /// A remote store that cannot be reached at startup falls back to `file`.
    #[serde(default)]
    pub cache_type: CacheBackend,

    /// Directory for the file-backed cache.
    ///
    /// Set via DOCSTASH_CACHE_DIR environment variable.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Time-to-live for cache entries, in hours.
    ///
    /// Set via DOCSTASH_CACHE_TTL_HOURS environment variable.
    #[serde(default = "default_cache_ttl_hours")]
    pub cache_ttl_hours: u64,

    /// Redis host, used only when `cache_type` is `remote`.
    ///
    /// Set via DOCSTASH_REDIS_HOST environment variable.
    #[serde(default = "default_redis_host")]
    pub redis_host: String,

    /// Redis port.
    ///
    /// Set via DOCSTASH_REDIS_PORT environment variable.
    #[serde(default = "default_redis_port")]
    pub redis_port: u16,

    /// Redis database index.
    ///
    /// Set via DOCSTASH_REDIS_DB environment variable.
    #[serde(default)]
    pub redis_db: i64,

    /// Base URL of the OCR engine endpoint.
    ///
    /// Set via DOCSTASH_OCR_URL environment variable.
    #[serde(default = "default_ocr_url")]
    pub ocr_url: String,

    /// Optional API key sent to the OCR engine.
    ///
    /// Set via DOCSTASH_OCR_API_KEY environment variable.
    #[serde(default)]
    pub ocr_api_key: Option<String>,

    /// OCR request timeout in milliseconds.
    ///
    /// Set via DOCSTASH_OCR_TIMEOUT_MS environment variable.
    #[serde(default = "default_ocr_timeout_ms")]
    pub ocr_timeout_ms: u64,

    /// Minimum trimmed character count for a structured parse to be
    /// accepted without falling back to OCR.
    ///
    /// Set via DOCSTASH_MIN_TEXT_LEN environment variable.
    #[serde(default = "default_min_text_len")]
    pub min_text_len: usize,

    /// Maximum document size in megabytes.
    ///
    /// Set via DOCSTASH_MAX_FILE_SIZE_MB environment variable.
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./docstash-cache")
}

fn default_cache_ttl_hours() -> u64 {
    24
}

fn default_redis_host() -> String {
    "localhost".into()
}

fn default_redis_port() -> u16 {
    6379
}

fn default_ocr_url() -> String {
    "http://localhost:8000".into()
}

fn default_ocr_timeout_ms() -> u64 {
    120_000
}

fn default_min_text_len() -> usize {
    50
}

fn default_max_file_size_mb() -> u64 {
    10
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_type: CacheBackend::File,
            cache_dir: default_cache_dir(),
            cache_ttl_hours: default_cache_ttl_hours(),
            redis_host: default_redis_host(),
            redis_port: default_redis_port(),
            redis_db: 0,
            ocr_url: default_ocr_url(),
            ocr_api_key: None,
            ocr_timeout_ms: default_ocr_timeout_ms(),
            min_text_len: default_min_text_len(),
            max_file_size_mb: default_max_file_size_mb(),
        }
    }
}

impl AppConfig {
    /// OCR timeout as Duration for use with reqwest/tokio.
    pub fn ocr_timeout(&self) -> Duration {
        Duration::from_millis(self.ocr_timeout_ms)
    }

    /// Size limit in bytes.
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }

    /// Redis connection URL for the remote store.
    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}/{}", self.redis_host, self.redis_port, self.redis_db)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `DOCSTASH_`
    /// 2. TOML file from `DOCSTASH_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("DOCSTASH_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("DOCSTASH_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.cache_type, CacheBackend::File);
        assert_eq!(config.cache_dir, PathBuf::from("./docstash-cache"));
        assert_eq!(config.cache_ttl_hours, 24);
        assert_eq!(config.redis_host, "localhost");
        assert_eq!(config.redis_port, 6379);
        assert_eq!(config.redis_db, 0);
        assert_eq!(config.min_text_len, 50);
        assert_eq!(config.max_file_size_mb, 10);
        assert!(config.ocr_api_key.is_none());
    }

    #[test]
    fn test_ocr_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.ocr_timeout(), Duration::from_millis(120_000));
    }

    #[test]
    fn test_redis_url() {
        let config = AppConfig { redis_host: "cache.internal".into(), redis_port: 6380, redis_db: 2, ..Default::default() };
        assert_eq!(config.redis_url(), "redis://cache.internal:6380/2");
    }

    #[test]
    fn test_max_file_size_bytes() {
        let config = AppConfig { max_file_size_mb: 3, ..Default::default() };
        assert_eq!(config.max_file_size_bytes(), 3 * 1024 * 1024);
    }

    #[test]
    fn test_backend_deserializes_lowercase() {
        let backend: CacheBackend = serde_json::from_str("\"remote\"").unwrap();
        assert_eq!(backend, CacheBackend::Remote);
    }
}
