//! Unified error types for docstash.
//!
//! Anticipated cache failures (missing, corrupt, expired, unreachable
//! backend) never cross the cache service boundary as errors; they surface
//! as misses or `false` and are logged. This enum covers the failures that
//! callers do make an affirmative choice about.

/// Unified error type for the docstash libraries.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File could not be read or written.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Cache entry could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Remote cache backend operation failed.
    #[error("cache backend error: {0}")]
    Backend(#[from] redis::RedisError),

    /// PDF could not be parsed for structured text.
    #[error("pdf parse failed: {0}")]
    PdfParse(String),

    /// OCR engine returned an error.
    #[error("ocr failed: {0}")]
    Ocr(String),

    /// File extension is not handled by any extraction strategy.
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// File exceeds the configured size limit.
    #[error("file too large: {size_bytes} bytes exceeds {limit_bytes}")]
    FileTooLarge { size_bytes: u64, limit_bytes: u64 },
}
