//! `SQLite` implementation of the `DownloadLogRepository` port.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use medifetch_core::{AppError, DownloadId, DownloadLog, DownloadLogRepository, NewDownloadLog};

use super::row_mappers::{map_log_row, sqlx_err};

/// `SQLite` implementation of the `DownloadLogRepository` port.
///
/// `download_logs` rows are append-only; no update or single-row delete
/// operation exists on this trait, only bulk retention deletion.
pub struct SqliteDownloadLogRepository {
    pool: SqlitePool,
}

impl SqliteDownloadLogRepository {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DownloadLogRepository for SqliteDownloadLogRepository {
    async fn create(&self, data: NewDownloadLog) -> Result<DownloadLog, AppError> {
        let now = Utc::now();
        let metadata_json = data
            .metadata
            .as_ref()
            .map(|v| serde_json::to_string(v).unwrap_or_default());

        let result = sqlx::query(
            "INSERT INTO download_logs \
             (download_id, event_type, message, metadata, timestamp) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(data.download_id.0)
        .bind(data.event_type.as_str())
        .bind(&data.message)
        .bind(&metadata_json)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(sqlx_err)?;

        let row = sqlx::query("SELECT * FROM download_logs WHERE id = ?")
            .bind(result.last_insert_rowid())
            .fetch_one(&self.pool)
            .await
            .map_err(sqlx_err)?;
        map_log_row(&row)
    }

    async fn find_by_download_id(
        &self,
        download_id: DownloadId,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<DownloadLog>, AppError> {
        let offset = i64::from(page.saturating_sub(1)) * i64::from(page_size);
        let rows = sqlx::query(
            "SELECT * FROM download_logs WHERE download_id = ? \
             ORDER BY timestamp DESC LIMIT ? OFFSET ?",
        )
        .bind(download_id.0)
        .bind(i64::from(page_size))
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(sqlx_err)?;
        rows.iter().map(map_log_row).collect()
    }

    async fn count_by_download_id(&self, download_id: DownloadId) -> Result<u64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM download_logs WHERE download_id = ?")
            .bind(download_id.0)
            .fetch_one(&self.pool)
            .await
            .map_err(sqlx_err)?;
        let n: i64 = row.try_get("n").map_err(sqlx_err)?;
        Ok(n as u64)
    }

    async fn delete_old_logs(&self, days: u32) -> Result<u64, AppError> {
        let cutoff = medifetch_core::days_ago(days);
        let result = sqlx::query("DELETE FROM download_logs WHERE timestamp < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(sqlx_err)?;
        Ok(result.rows_affected())
    }
}
