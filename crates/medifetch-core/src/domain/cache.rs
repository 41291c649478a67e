use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single row in the key-value cache store (C1).
///
/// `value` is an opaque serialization owned by the caller; the cache
/// never inspects it. Unique by `key`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub value: String,
    pub expiry: DateTime<Utc>,
}

/// Cheap diagnostic summary of the cache store's contents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: u64,
    pub expired: u64,
}
