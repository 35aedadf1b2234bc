//! Cache service: key derivation, envelope policy, and accounting.
//!
//! This is the one reader/writer of cache entries. It derives content keys,
//! wraps payloads in the entry envelope, checks expiry on read (deleting
//! stale entries lazily), and keeps hit/miss/save counters. Anticipated
//! failures (missing, corrupt, expired, backend unreachable) never cross
//! this boundary as errors; they are logged and surfaced as misses or
//! `false` so a cache problem degrades speed, not correctness.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Error;
use crate::config::AppConfig;

use super::entry::{CacheEntry, Payload};
use super::fingerprint::{Fingerprint, KEY_NAMESPACE};
use super::store::{CacheStore, open_store};

/// Process-lifetime cache counters and derived rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub cache_type: String,
    pub hits: u64,
    pub misses: u64,
    pub saves: u64,
    /// Percentage of gets served from cache, 0.0 when no requests yet.
    pub hit_rate: f64,
    pub total_requests: u64,
}

/// Content-addressed extraction cache.
///
/// Constructed once at process start and passed to the extraction pipeline
/// and any administrative surface. Counters are atomics; the get-then-count
/// sequence is deliberately not a critical section, so concurrent callers
/// may interleave counts without affecting cached data.
pub struct CacheService {
    store: Arc<dyn CacheStore>,
    hits: AtomicU64,
    misses: AtomicU64,
    saves: AtomicU64,
}

impl CacheService {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store, hits: AtomicU64::new(0), misses: AtomicU64::new(0), saves: AtomicU64::new(0) }
    }

    /// Open the configured store (with remote-to-file fallback) and wrap it.
    pub async fn from_config(config: &AppConfig) -> Result<Self, Error> {
        Ok(Self::new(open_store(config).await?))
    }

    /// Look up the cached extraction result for a file's content.
    ///
    /// Exactly one of hits/misses is incremented per call. Expired entries
    /// are deleted best-effort and reported as misses.
    pub async fn get(&self, path: &Path) -> Option<Value> {
        let fingerprint = Fingerprint::for_file(path).await;
        let key = fingerprint.cache_key();

        let bytes = match self.store.get(&key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return self.miss(),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "cache read failed");
                return self.miss();
            }
        };

        let entry: CacheEntry = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "corrupt cache entry");
                return self.miss();
            }
        };

        if entry.is_expired(Utc::now()) {
            if let Err(e) = self.store.delete(&key).await {
                tracing::warn!(key = %key, error = %e, "failed to delete expired entry");
            }
            return self.miss();
        }

        self.hits.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(key = %key, original_path = %entry.original_path, "cache hit");
        Some(entry.result.into_value())
    }

    /// Cache an extraction result under the file's content key.
    ///
    /// Returns false on any serialization or store failure; the caller
    /// proceeds without caching. A `set` on an existing key fully
    /// overwrites it with fresh timestamps.
    pub async fn set(&self, path: &Path, payload: &Value, ttl_hours: u64) -> bool {
        let fingerprint = Fingerprint::for_file(path).await;
        let key = fingerprint.cache_key();

        let now = Utc::now();
        let method = payload.get("method").and_then(Value::as_str).unwrap_or_default().to_string();
        let result_size_kb = serde_json::to_vec(payload).ok().map(|b| b.len() as f64 / 1024.0);

        let entry = CacheEntry {
            result: Payload::wrap(payload.clone()),
            cached_at: now,
            expires_at: now + chrono::Duration::hours(ttl_hours as i64),
            original_path: path.display().to_string(),
            method,
            content_hash: fingerprint.digest,
            result_size_kb,
        };

        let bytes = match serde_json::to_vec(&entry) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "cache entry serialization failed");
                return false;
            }
        };

        match self.store.set(&key, &bytes, Duration::from_secs(ttl_hours * 3600)).await {
            Ok(()) => {
                self.saves.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key = %key, size_bytes = bytes.len(), "cached extraction result");
                true
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "cache write failed");
                false
            }
        }
    }

    /// Delete expired entries from the file-backed store.
    ///
    /// The remote store self-expires, so this is a no-op there. A corrupt
    /// entry is skipped, never fatal. Returns the number of entries removed.
    pub async fn clear_expired(&self) -> u64 {
        if self.store.kind() == super::store::StoreKind::Remote {
            tracing::debug!("remote store enforces TTL natively, skipping sweep");
            return 0;
        }

        let keys = match self.store.scan(KEY_NAMESPACE).await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!(error = %e, "cache scan failed");
                return 0;
            }
        };

        let now = Utc::now();
        let mut cleared = 0u64;

        for key in keys {
            let Ok(Some(bytes)) = self.store.get(&key).await else { continue };
            let Ok(entry) = serde_json::from_slice::<CacheEntry>(&bytes) else { continue };
            if entry.is_expired(now) && self.store.delete(&key).await.is_ok() {
                cleared += 1;
            }
        }

        if cleared > 0 {
            tracing::info!(cleared, "removed expired cache entries");
        }
        cleared
    }

    /// Delete every entry under the cache namespace and reset statistics.
    ///
    /// Scoped by prefix: in a shared remote keyspace, keys outside the
    /// namespace are untouched. Returns the number of entries removed.
    pub async fn clear_all(&self) -> u64 {
        let mut cleared = 0u64;

        match self.store.scan(KEY_NAMESPACE).await {
            Ok(keys) => {
                for key in keys {
                    if self.store.delete(&key).await.is_ok() {
                        cleared += 1;
                    }
                }
            }
            Err(e) => tracing::warn!(error = %e, "cache scan failed"),
        }

        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.saves.store(0, Ordering::Relaxed);

        tracing::info!(cleared, "cleared cache namespace");
        cleared
    }

    /// Current counters. Pure read, no side effects.
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 { hits as f64 / total as f64 * 100.0 } else { 0.0 };

        CacheStats {
            cache_type: self.store.kind().to_string(),
            hits,
            misses,
            saves: self.saves.load(Ordering::Relaxed),
            hit_rate,
            total_requests: total,
        }
    }

    /// Approximate bytes held by the backing store.
    pub async fn approximate_size(&self) -> Result<u64, Error> {
        self.store.approximate_size().await
    }

    fn miss(&self) -> Option<Value> {
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::file_store::FileStore;
    use serde_json::json;
    use std::path::PathBuf;

    async fn make_service() -> (tempfile::TempDir, CacheService, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(&dir.path().join("cache")).await.unwrap();
        let doc = dir.path().join("report.pdf");
        std::fs::write(&doc, b"%PDF-1.5 fake document bytes").unwrap();
        (dir, CacheService::new(Arc::new(store)), doc)
    }

    #[tokio::test]
    async fn test_miss_set_hit_accounting() {
        let (_dir, cache, doc) = make_service().await;
        let payload = json!({"text": "body", "method": "structured", "success": true});

        assert!(cache.get(&doc).await.is_none());
        assert!(cache.set(&doc, &payload, 24).await);
        assert_eq!(cache.get(&doc).await.unwrap(), payload);
        assert_eq!(cache.get(&doc).await.unwrap(), payload);

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.saves, 1);
        assert_eq!(stats.total_requests, 3);
        assert!((stats.hit_rate - 200.0 / 3.0).abs() < 0.01);
        assert_eq!(stats.cache_type, "file");
    }

    #[tokio::test]
    async fn test_round_trip_shapes() {
        let (dir, cache, _) = make_service().await;

        for (name, payload) in [
            ("mapping.pdf", json!({"text": "hello", "page_count": 2})),
            ("sequence.pdf", json!(["page one", "page two"])),
            ("scalar.pdf", json!("plain extracted text")),
        ] {
            let doc = dir.path().join(name);
            std::fs::write(&doc, name.as_bytes()).unwrap();
            assert!(cache.set(&doc, &payload, 24).await);
            assert_eq!(cache.get(&doc).await.unwrap(), payload, "shape mismatch for {name}");
        }
    }

    #[tokio::test]
    async fn test_zero_ttl_expires_immediately() {
        let (_dir, cache, doc) = make_service().await;
        assert!(cache.set(&doc, &json!({"text": "stale"}), 0).await);

        assert!(cache.get(&doc).await.is_none());
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 0);

        // The stale record was deleted on read.
        let key = Fingerprint::for_file(&doc).await.cache_key();
        assert!(cache.store.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overwrite_leaves_single_entry() {
        let (_dir, cache, doc) = make_service().await;
        assert!(cache.set(&doc, &json!({"text": "first"}), 24).await);
        assert!(cache.set(&doc, &json!({"text": "second"}), 24).await);

        assert_eq!(cache.get(&doc).await.unwrap()["text"], "second");
        let keys = cache.store.scan(KEY_NAMESPACE).await.unwrap();
        assert_eq!(keys.len(), 1);
    }

    #[tokio::test]
    async fn test_clear_all_scoped_to_namespace() {
        let (dir, cache, doc) = make_service().await;
        assert!(cache.set(&doc, &json!({"text": "body"}), 24).await);
        assert!(cache.get(&doc).await.is_some());

        // Foreign key in the same store directory.
        let foreign = dir.path().join("cache").join("session_state_xyz.json");
        std::fs::write(&foreign, b"{}").unwrap();

        let cleared = cache.clear_all().await;
        assert_eq!(cleared, 1);
        assert!(foreign.exists());

        let stats = cache.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.saves, 0);
        assert_eq!(stats.total_requests, 0);
    }

    #[tokio::test]
    async fn test_clear_expired_sweeps_only_stale() {
        let (dir, cache, doc) = make_service().await;
        let fresh = dir.path().join("fresh.pdf");
        std::fs::write(&fresh, b"different bytes").unwrap();

        assert!(cache.set(&doc, &json!({"text": "stale"}), 0).await);
        assert!(cache.set(&fresh, &json!({"text": "fresh"}), 24).await);

        // A corrupt namespaced entry must be skipped, not fatal.
        let corrupt = dir.path().join("cache").join(format!("{KEY_NAMESPACE}corrupt.json"));
        std::fs::write(&corrupt, b"not json {").unwrap();

        let cleared = cache.clear_expired().await;
        assert_eq!(cleared, 1);
        assert!(corrupt.exists());
        assert!(cache.get(&fresh).await.is_some());
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss() {
        let (dir, cache, doc) = make_service().await;
        let key = Fingerprint::for_file(&doc).await.cache_key();
        std::fs::write(dir.path().join("cache").join(format!("{key}.json")), b"truncated {\"res").unwrap();

        assert!(cache.get(&doc).await.is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_unreadable_document_is_a_counted_miss() {
        let (_dir, cache, _) = make_service().await;
        assert!(cache.get(Path::new("/nonexistent/doc.pdf")).await.is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_entry_envelope_fields_on_disk() {
        let (dir, cache, doc) = make_service().await;
        assert!(cache.set(&doc, &json!({"text": "body", "method": "structured"}), 24).await);

        let key = Fingerprint::for_file(&doc).await.cache_key();
        let raw = std::fs::read(dir.path().join("cache").join(format!("{key}.json"))).unwrap();
        let envelope: Value = serde_json::from_slice(&raw).unwrap();

        assert_eq!(envelope["method"], "structured");
        assert_eq!(envelope["original_path"], doc.display().to_string());
        assert_eq!(envelope["content_hash"].as_str().unwrap().len(), 32);
        assert_eq!(envelope["result"]["kind"], "mapping");
        assert!(envelope["result_size_kb"].as_f64().unwrap() > 0.0);
        assert!(envelope["cached_at"].as_str().is_some());
        assert!(envelope["expires_at"].as_str().is_some());
    }
}
