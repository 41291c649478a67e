//! Key-value cache store port (C1).

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::CacheStats;
use crate::errors::AppError;

/// Persistent TTL cache used as the backing store for read-through
/// repository decorators (C8).
///
/// Values are opaque serialized bytes; callers own serialization. Entries
/// survive restarts. Safe for concurrent readers and writers.
#[async_trait]
pub trait KvCache: Send + Sync {
    /// Upsert `key -> value` with `expiry = now + ttl`.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), AppError>;

    /// Returns the value iff present and unexpired. On expiry the entry
    /// is deleted and `None` is returned. On deserialization failure by
    /// the caller's own inspection, callers are expected to `delete` the
    /// entry themselves; this port only handles expiry-driven deletion.
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    async fn delete(&self, key: &str) -> Result<(), AppError>;

    async fn clear(&self) -> Result<(), AppError>;

    /// Remove all expired entries; returns the count removed.
    async fn cleanup(&self) -> Result<u64, AppError>;

    async fn stats(&self) -> Result<CacheStats, AppError>;
}
