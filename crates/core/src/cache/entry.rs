//! Cache entry envelope.
//!
//! The stored record wraps an opaque extraction payload with the timestamps
//! and provenance needed for expiry checks and diagnostics. Payloads are
//! shape-tagged at write time so a stored sequence comes back as a
//! sequence, a scalar as a scalar, with no re-wrapping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Shape-tagged cache payload.
///
/// The cached value may be any JSON shape; the tag makes reconstruction on
/// read lossless and explicit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum Payload {
    Mapping(serde_json::Map<String, Value>),
    Sequence(Vec<Value>),
    Scalar(Value),
}

impl Payload {
    /// Tag a JSON value with its shape.
    pub fn wrap(value: Value) -> Self {
        match value {
            Value::Object(map) => Payload::Mapping(map),
            Value::Array(items) => Payload::Sequence(items),
            other => Payload::Scalar(other),
        }
    }

    /// Undo the shape tag, restoring the original value.
    pub fn into_value(self) -> Value {
        match self {
            Payload::Mapping(map) => Value::Object(map),
            Payload::Sequence(items) => Value::Array(items),
            Payload::Scalar(value) => value,
        }
    }
}

/// A cached extraction record.
///
/// Serialized as the JSON document held by the backing store. `original_path`
/// is diagnostic only; it is never part of the key and never used for lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub result: Payload,
    pub cached_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub original_path: String,
    pub method: String,
    pub content_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_size_kb: Option<f64>,
}

impl CacheEntry {
    /// Whether the entry is past its expiry at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
