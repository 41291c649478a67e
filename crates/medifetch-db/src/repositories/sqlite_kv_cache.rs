//! `SQLite` implementation of the `KvCache` port (C1).

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::time::Duration;

use medifetch_core::{AppError, CacheStats, KvCache};

use super::row_mappers::sqlx_err;

/// Persistent TTL cache backed by the `kv_cache` table.
///
/// Expired entries are deleted lazily on read and in bulk via
/// [`KvCache::cleanup`]. Values are opaque strings; this type never
/// inspects them.
pub struct SqliteKvCache {
    pool: SqlitePool,
}

impl SqliteKvCache {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KvCache for SqliteKvCache {
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), AppError> {
        let expiry = Utc::now() + chrono::Duration::from_std(ttl).unwrap_or_default();
        sqlx::query(
            "INSERT INTO kv_cache (key, value, expiry) VALUES (?, ?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, expiry = excluded.expiry",
        )
        .bind(key)
        .bind(&value)
        .bind(expiry.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(sqlx_err)?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let row = sqlx::query("SELECT value, expiry FROM kv_cache WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(sqlx_err)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let expiry: i64 = row.try_get("expiry").map_err(sqlx_err)?;
        if expiry <= Utc::now().timestamp_millis() {
            self.delete(key).await?;
            return Ok(None);
        }

        let value: String = row.try_get("value").map_err(sqlx_err)?;
        Ok(Some(value))
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM kv_cache WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(sqlx_err)?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), AppError> {
        sqlx::query("DELETE FROM kv_cache")
            .execute(&self.pool)
            .await
            .map_err(sqlx_err)?;
        Ok(())
    }

    async fn cleanup(&self) -> Result<u64, AppError> {
        let now = Utc::now().timestamp_millis();
        let result = sqlx::query("DELETE FROM kv_cache WHERE expiry <= ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(sqlx_err)?;
        Ok(result.rows_affected())
    }

    async fn stats(&self) -> Result<CacheStats, AppError> {
        let now = Utc::now().timestamp_millis();
        let total_row = sqlx::query("SELECT COUNT(*) AS n FROM kv_cache")
            .fetch_one(&self.pool)
            .await
            .map_err(sqlx_err)?;
        let expired_row = sqlx::query("SELECT COUNT(*) AS n FROM kv_cache WHERE expiry <= ?")
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(sqlx_err)?;

        let total: i64 = total_row.try_get("n").map_err(sqlx_err)?;
        let expired: i64 = expired_row.try_get("n").map_err(sqlx_err)?;
        Ok(CacheStats {
            entries: total as u64,
            expired: expired as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::setup_test_database;

    async fn cache() -> SqliteKvCache {
        let pool = setup_test_database().await.unwrap();
        SqliteKvCache::new(pool)
    }

    #[tokio::test]
    async fn set_then_get_returns_value_before_expiry() {
        let cache = cache().await;
        cache
            .set("k", "v".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn get_returns_none_after_expiry_and_deletes_entry() {
        let cache = cache().await;
        cache
            .set("k", "v".to_string(), Duration::from_millis(0))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.entries, 0);
    }

    #[tokio::test]
    async fn cleanup_removes_only_expired() {
        let cache = cache().await;
        cache
            .set("fresh", "v".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set("stale", "v".to_string(), Duration::from_millis(0))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        let removed = cache.cleanup().await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(cache.get("fresh").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn delete_and_clear() {
        let cache = cache().await;
        cache
            .set("k1", "v".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set("k2", "v".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        cache.delete("k1").await.unwrap();
        assert_eq!(cache.get("k1").await.unwrap(), None);
        cache.clear().await.unwrap();
        assert_eq!(cache.get("k2").await.unwrap(), None);
    }
}
