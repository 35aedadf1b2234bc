//! Redis-backed cache store.
//!
//! Entries are stored as opaque blobs under namespaced keys, with expiry
//! enforced by Redis itself via `SETEX`. The keyspace may be shared with
//! other applications, so every bulk operation goes through `SCAN MATCH`
//! restricted to the cache namespace.

use std::time::Duration;

use async_trait::async_trait;

use crate::Error;

use super::store::{CacheStore, StoreKind};

/// Remote key-value store with native per-key TTL.
#[derive(Clone)]
pub struct RedisStore {
    conn: redis::aio::MultiplexedConnection,
}

impl RedisStore {
    /// Connect and verify the server responds to PING.
    ///
    /// A failure here is expected to be handled by the caller falling back
    /// to the file store.
    pub async fn connect(url: &str) -> Result<Self, Error> {
        let client = redis::Client::open(url)?;
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(Self { conn })
    }

    /// SETEX rejects a zero expiry, so zero-TTL writes are clamped to one
    /// second; the envelope's own expires_at already marks them expired.
    fn ttl_seconds(ttl: Duration) -> u64 {
        ttl.as_secs().max(1)
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), Error> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("SETEX")
            .arg(key)
            .arg(Self::ttl_seconds(ttl))
            .arg(value)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
        Ok(())
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<String>, Error> {
        let mut conn = self.conn.clone();
        let pattern = format!("{prefix}*");
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(keys)
    }

    async fn approximate_size(&self) -> Result<u64, Error> {
        let keys = self.scan(super::KEY_NAMESPACE).await?;
        let mut conn = self.conn.clone();
        let mut total = 0u64;

        for key in &keys {
            let len: u64 = redis::cmd("STRLEN").arg(key).query_async(&mut conn).await?;
            total += len;
        }

        Ok(total)
    }

    fn kind(&self) -> StoreKind {
        StoreKind::Remote
    }
}
