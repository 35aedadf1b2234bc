//! File-backed cache store.
//!
//! Each key maps to one `<key>.json` file in a dedicated directory. The
//! store holds opaque bytes; expiry is checked by the cache service, not
//! here. Reads are fail-safe: a missing or unreadable file is a miss.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use crate::Error;

use super::store::{CacheStore, StoreKind};

/// Extension for cache entry files.
const ENTRY_EXT: &str = "json";

/// One-file-per-key byte store.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    pub async fn new(dir: &Path) -> Result<Self, Error> {
        tokio::fs::create_dir_all(dir).await?;
        Ok(Self { dir: dir.to_path_buf() })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{ENTRY_EXT}"))
    }
}

#[async_trait]
impl CacheStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        match tokio::fs::read(self.entry_path(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &[u8], _ttl: Duration) -> Result<(), Error> {
        // TTL is enforced by the service via the envelope's expires_at.
        tokio::fs::write(self.entry_path(key), value).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        match tokio::fs::remove_file(self.entry_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<String>, Error> {
        let mut keys = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str())
                && stem.starts_with(prefix)
            {
                keys.push(stem.to_string());
            }
        }

        Ok(keys)
    }

    async fn approximate_size(&self) -> Result<u64, Error> {
        let mut total = 0u64;
        let mut entries = tokio::fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            if let Ok(meta) = entry.metadata().await
                && meta.is_file()
            {
                total += meta.len();
            }
        }

        Ok(total)
    }

    fn kind(&self) -> StoreKind {
        StoreKind::File
    }
}
