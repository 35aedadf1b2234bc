//! Content-addressed cache key generation.
//!
//! Keys are derived from file bytes and size, never from the path, so two
//! byte-identical files cache under the same key regardless of where they
//! were uploaded from. MD5 is used only for content addressing here, not as
//! a security primitive; the SHA-256 pass gives keys a uniform short form.

use std::path::Path;

use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;

/// Prefix for every cache key owned by this subsystem. Bulk operations
/// (scan, clear) are scoped to this namespace and must not touch other keys.
pub const KEY_NAMESPACE: &str = "doc_text_content_";

/// Truncated length of the hex digest used in keys.
const DIGEST_LEN: usize = 32;

/// Chunk size for streaming file reads.
const READ_CHUNK: usize = 8192;

/// A content-derived document identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    /// 32-hex-char digest of content + size (or of the path, when degraded).
    pub digest: String,
    /// True when the file could not be read and the digest fell back to
    /// hashing the path string. A degraded digest does not satisfy the
    /// cross-session identity invariant.
    pub degraded: bool,
}

impl Fingerprint {
    /// Full namespaced cache key for this fingerprint.
    pub fn cache_key(&self) -> String {
        format!("{KEY_NAMESPACE}{}", self.digest)
    }

    /// Compute the fingerprint for a file.
    ///
    /// Reads the file in fixed-size chunks into a streaming MD5, then folds
    /// the digest and byte length through SHA-256 truncated to 32 hex chars.
    /// If the file cannot be opened or read, degrades to a hash of the path
    /// string instead of failing.
    pub async fn for_file(path: &Path) -> Self {
        match Self::hash_content(path).await {
            Ok(digest) => Self { digest, degraded: false },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "content unreadable, falling back to path-based cache key");
                Self { digest: truncated_sha256(path.to_string_lossy().as_bytes()), degraded: true }
            }
        }
    }

    async fn hash_content(path: &Path) -> Result<String, std::io::Error> {
        let mut file = tokio::fs::File::open(path).await?;
        let mut md5_ctx = md5::Context::new();
        let mut buf = [0u8; READ_CHUNK];

        loop {
            let n = file.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            md5_ctx.consume(&buf[..n]);
        }

        let size = tokio::fs::metadata(path).await?.len();
        let content_string = format!("{:x}_{size}", md5_ctx.compute());
        Ok(truncated_sha256(content_string.as_bytes()))
    }
}

fn truncated_sha256(input: &[u8]) -> String {
    let mut digest = hex::encode(Sha256::digest(input));
    digest.truncate(DIGEST_LEN);
    digest
}
