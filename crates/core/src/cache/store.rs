//! Backing store abstraction.
//!
//! The cache service talks to one of a sealed set of stores through this
//! trait; which one is decided once, at construction, from configuration.
//! A remote store that cannot be reached falls back to the file store so
//! callers only ever see "a store".

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::Error;
use crate::config::{AppConfig, CacheBackend};

use super::file_store::FileStore;
use super::redis_store::RedisStore;

/// Which physical store backs the cache. Reported in statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    File,
    Remote,
}

impl StoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::File => "file",
            StoreKind::Remote => "remote",
        }
    }
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Byte-level key-value store for cache entries.
///
/// Stores are dumb: they hold opaque bytes under string keys. Envelope
/// parsing and expiry policy live in the cache service. The remote variant
/// additionally enforces the passed TTL natively; the file variant ignores
/// it and relies on the service's expiry check.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read the raw bytes for a key. Absent key is `Ok(None)`.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error>;

    /// Write the full value for a key, overwriting any prior value.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), Error>;

    /// Delete a key. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), Error>;

    /// List all keys starting with `prefix`.
    async fn scan(&self, prefix: &str) -> Result<Vec<String>, Error>;

    /// Approximate total size of stored values in bytes.
    async fn approximate_size(&self) -> Result<u64, Error>;

    /// Which physical store this is.
    fn kind(&self) -> StoreKind;
}

/// Open the store selected by configuration.
///
/// `cache_type = remote` attempts a Redis connection with a ping health
/// check; if that fails the file store is used instead and the downgrade is
/// logged. Connection failure is therefore never fatal.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn CacheStore>, Error> {
    match config.cache_type {
        CacheBackend::Remote => match RedisStore::connect(&config.redis_url()).await {
            Ok(store) => {
                tracing::info!(url = %config.redis_url(), "remote cache store initialized");
                Ok(Arc::new(store))
            }
            Err(e) => {
                tracing::warn!(error = %e, "remote cache unreachable, falling back to file store");
                Ok(Arc::new(FileStore::new(&config.cache_dir).await?))
            }
        },
        CacheBackend::File => Ok(Arc::new(FileStore::new(&config.cache_dir).await?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_kind_display() {
        assert_eq!(StoreKind::File.to_string(), "file");
        assert_eq!(StoreKind::Remote.to_string(), "remote");
    }

    #[tokio::test]
    async fn test_open_store_file_backend() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig { cache_dir: dir.path().join("cache"), ..Default::default() };
        let store = open_store(&config).await.unwrap();
        assert_eq!(store.kind(), StoreKind::File);
    }

    #[tokio::test]
    async fn test_open_store_remote_falls_back_when_unreachable() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            cache_type: CacheBackend::Remote,
            cache_dir: dir.path().join("cache"),
            redis_host: "127.0.0.1".into(),
            // Reserved port nothing listens on.
            redis_port: 1,
            ..Default::default()
        };

        let store = open_store(&config).await.unwrap();
        assert_eq!(store.kind(), StoreKind::File);

        // The fallback store is fully operational.
        store.set("doc_text_content_abc", b"{}", Duration::from_secs(60)).await.unwrap();
        assert!(store.get("doc_text_content_abc").await.unwrap().is_some());

        // And the service reports the downgraded backend.
        let cache = crate::cache::CacheService::new(store);
        assert_eq!(cache.stats().cache_type, "file");
    }
}
