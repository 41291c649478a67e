//! `SQLite` implementation of the `DownloadRepository` port.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use medifetch_core::{
    AppError, Download, DownloadId, DownloadRepository, DownloadStatus, MediaId, NewDownload,
};

use super::row_mappers::{map_download_row, sqlx_err};

/// `SQLite` implementation of the `DownloadRepository` port.
///
/// Stores `Download` rows in the `downloads` table created by
/// [`crate::setup::setup_database`].
pub struct SqliteDownloadRepository {
    pool: SqlitePool,
}

impl SqliteDownloadRepository {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DownloadRepository for SqliteDownloadRepository {
    async fn find_by_id(&self, id: DownloadId) -> Result<Option<Download>, AppError> {
        let row = sqlx::query("SELECT * FROM downloads WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(sqlx_err)?;
        row.as_ref().map(map_download_row).transpose()
    }

    async fn find_next_pending(&self) -> Result<Option<Download>, AppError> {
        let row = sqlx::query(
            "SELECT * FROM downloads WHERE status = 'pending' \
             ORDER BY created_at ASC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(sqlx_err)?;
        row.as_ref().map(map_download_row).transpose()
    }

    async fn find_active_by_normalized_url(
        &self,
        normalized_url: &str,
    ) -> Result<Option<Download>, AppError> {
        let row = sqlx::query(
            "SELECT * FROM downloads \
             WHERE normalized_url = ? AND status IN ('pending', 'in_progress') \
             LIMIT 1",
        )
        .bind(normalized_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(sqlx_err)?;
        row.as_ref().map(map_download_row).transpose()
    }

    async fn find_by_status(
        &self,
        status: DownloadStatus,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Download>, AppError> {
        let offset = i64::from(page.saturating_sub(1)) * i64::from(page_size);
        let rows = sqlx::query(
            "SELECT * FROM downloads WHERE status = ? \
             ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(status.as_str())
        .bind(i64::from(page_size))
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(sqlx_err)?;
        rows.iter().map(map_download_row).collect()
    }

    async fn find_all(&self, page: u32, page_size: u32) -> Result<Vec<Download>, AppError> {
        let offset = i64::from(page.saturating_sub(1)) * i64::from(page_size);
        let rows = sqlx::query(
            "SELECT * FROM downloads ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(i64::from(page_size))
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(sqlx_err)?;
        rows.iter().map(map_download_row).collect()
    }

    async fn find_old_completed(&self, days: u32) -> Result<Vec<Download>, AppError> {
        let cutoff = medifetch_core::days_ago(days);
        let rows = sqlx::query(
            "SELECT * FROM downloads \
             WHERE status IN ('completed', 'failed') AND finished_at < ? \
             ORDER BY created_at ASC",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(sqlx_err)?;
        rows.iter().map(map_download_row).collect()
    }

    async fn find_stalled_in_progress(
        &self,
        timeout_minutes: u32,
    ) -> Result<Vec<Download>, AppError> {
        let cutoff = Utc::now() - chrono::Duration::minutes(i64::from(timeout_minutes));
        let rows = sqlx::query(
            "SELECT * FROM downloads \
             WHERE status = 'in_progress' AND started_at < ? \
             ORDER BY started_at ASC",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(sqlx_err)?;
        rows.iter().map(map_download_row).collect()
    }

    async fn count_all(&self) -> Result<u64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM downloads")
            .fetch_one(&self.pool)
            .await
            .map_err(sqlx_err)?;
        let n: i64 = row.try_get("n").map_err(sqlx_err)?;
        Ok(n as u64)
    }

    async fn count_by_status(&self, status: DownloadStatus) -> Result<u64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM downloads WHERE status = ?")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(sqlx_err)?;
        let n: i64 = row.try_get("n").map_err(sqlx_err)?;
        Ok(n as u64)
    }

    async fn create(&self, data: NewDownload) -> Result<Download, AppError> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO downloads \
             (url, normalized_url, status, progress, created_at) \
             VALUES (?, ?, 'pending', 0, ?)",
        )
        .bind(&data.url)
        .bind(&data.normalized_url)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(sqlx_err)?;

        let id = DownloadId(result.last_insert_rowid());
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::internal("download vanished immediately after insert"))
    }

    async fn update_status(
        &self,
        id: DownloadId,
        status: DownloadStatus,
        progress: i32,
        error_message: Option<String>,
        file_path: Option<String>,
    ) -> Result<(), AppError> {
        // Terminal statuses never leave (spec.md invariant): once a row has
        // settled into one terminal status, a late-arriving write from a
        // racing caller that would move it to a *different* terminal status
        // (e.g. ProcessDownload's completion racing a concurrent Cancel)
        // must lose. Non-terminal targets (Retry reopening a failed/
        // cancelled row) and re-applying the same terminal status (e.g.
        // MoveToDestination updating `file_path` on an already-completed
        // row) are both still allowed -- those are not the race in play.
        //
        // `finished_at` is set once, the first time a row becomes terminal
        // (COALESCE keeps the original completion time across a later
        // re-apply like MoveToDestination), and is cleared unconditionally
        // when the target status is non-terminal, so Retry's terminal ->
        // pending transition restores `finishedAt == null` per the
        // `finishedAt != null <=> status in terminal` invariant.
        // `file_path` is a plain assignment, not a COALESCE: every caller
        // that passes `None` does so for a row that never had a file_path
        // yet, except Retry, which relies on `None` clearing it to null.
        let query = if status.is_terminal() {
            sqlx::query(
                "UPDATE downloads SET status = ?, progress = ?, error_message = ?, \
                 file_path = ?, finished_at = COALESCE(finished_at, ?) \
                 WHERE id = ? \
                 AND (status NOT IN ('completed', 'failed', 'cancelled') OR status = ?)",
            )
            .bind(status.as_str())
            .bind(progress)
            .bind(&error_message)
            .bind(&file_path)
            .bind(Utc::now())
            .bind(id.0)
            .bind(status.as_str())
        } else {
            sqlx::query(
                "UPDATE downloads SET status = ?, progress = ?, error_message = ?, \
                 file_path = ?, finished_at = NULL \
                 WHERE id = ?",
            )
            .bind(status.as_str())
            .bind(progress)
            .bind(&error_message)
            .bind(&file_path)
            .bind(id.0)
        };
        query.execute(&self.pool).await.map_err(sqlx_err)?;
        Ok(())
    }

    async fn update_process_id(&self, id: DownloadId, process_id: u32) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE downloads SET process_id = ?, started_at = COALESCE(started_at, ?) \
             WHERE id = ?",
        )
        .bind(i64::from(process_id))
        .bind(Utc::now())
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(sqlx_err)?;
        Ok(())
    }

    async fn update_media_id(&self, id: DownloadId, media_id: MediaId) -> Result<(), AppError> {
        sqlx::query("UPDATE downloads SET media_id = ? WHERE id = ?")
            .bind(media_id.0)
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(sqlx_err)?;
        Ok(())
    }

    async fn delete(&self, id: DownloadId) -> Result<(), AppError> {
        sqlx::query("DELETE FROM downloads WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(sqlx_err)?;
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), AppError> {
        sqlx::query("DELETE FROM downloads")
            .execute(&self.pool)
            .await
            .map_err(sqlx_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::setup_test_database;

    async fn repo() -> SqliteDownloadRepository {
        let pool = setup_test_database().await.unwrap();
        SqliteDownloadRepository::new(pool)
    }

    #[tokio::test]
    async fn create_then_find_by_id() {
        let repo = repo().await;
        let d = repo
            .create(NewDownload {
                url: "https://hosta.tld/track/x".into(),
                normalized_url: "https://hosta.tld/track/x".into(),
            })
            .await
            .unwrap();
        assert_eq!(d.status, DownloadStatus::Pending);
        assert_eq!(d.progress, 0);

        let found = repo.find_by_id(d.id).await.unwrap().unwrap();
        assert_eq!(found.id, d.id);
    }

    #[tokio::test]
    async fn find_next_pending_is_fifo() {
        let repo = repo().await;
        let first = repo
            .create(NewDownload {
                url: "https://hosta.tld/track/1".into(),
                normalized_url: "https://hosta.tld/track/1".into(),
            })
            .await
            .unwrap();
        let _second = repo
            .create(NewDownload {
                url: "https://hosta.tld/track/2".into(),
                normalized_url: "https://hosta.tld/track/2".into(),
            })
            .await
            .unwrap();

        let next = repo.find_next_pending().await.unwrap().unwrap();
        assert_eq!(next.id, first.id);
    }

    #[tokio::test]
    async fn find_active_by_normalized_url_excludes_terminal() {
        let repo = repo().await;
        let d = repo
            .create(NewDownload {
                url: "https://hosta.tld/track/x".into(),
                normalized_url: "https://hosta.tld/track/x".into(),
            })
            .await
            .unwrap();

        assert!(repo
            .find_active_by_normalized_url("https://hosta.tld/track/x")
            .await
            .unwrap()
            .is_some());

        repo.update_status(d.id, DownloadStatus::Completed, 100, None, Some("/f".into()))
            .await
            .unwrap();

        assert!(repo
            .find_active_by_normalized_url("https://hosta.tld/track/x")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn update_status_to_terminal_sets_finished_at() {
        let repo = repo().await;
        let d = repo
            .create(NewDownload {
                url: "https://hosta.tld/track/x".into(),
                normalized_url: "https://hosta.tld/track/x".into(),
            })
            .await
            .unwrap();
        assert!(d.finished_at.is_none());

        repo.update_status(d.id, DownloadStatus::Failed, 10, Some("boom".into()), None)
            .await
            .unwrap();
        let found = repo.find_by_id(d.id).await.unwrap().unwrap();
        assert!(found.finished_at.is_some());
        assert_eq!(found.error_message.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn retry_clears_finished_at_error_message_and_file_path() {
        let repo = repo().await;
        let d = repo
            .create(NewDownload {
                url: "https://hosta.tld/track/x".into(),
                normalized_url: "https://hosta.tld/track/x".into(),
            })
            .await
            .unwrap();
        repo.update_status(d.id, DownloadStatus::Failed, 70, Some("boom".into()), None)
            .await
            .unwrap();
        let failed = repo.find_by_id(d.id).await.unwrap().unwrap();
        assert!(failed.finished_at.is_some());

        repo.update_status(d.id, DownloadStatus::Pending, 0, None, None)
            .await
            .unwrap();
        let retried = repo.find_by_id(d.id).await.unwrap().unwrap();
        assert_eq!(retried.progress, 0);
        assert!(retried.error_message.is_none());
        assert!(retried.file_path.is_none());
        assert!(
            retried.finished_at.is_none(),
            "finishedAt must be null once status leaves the terminal set"
        );
    }

    #[tokio::test]
    async fn reapplying_completed_preserves_original_finished_at() {
        let repo = repo().await;
        let d = repo
            .create(NewDownload {
                url: "https://hosta.tld/track/x".into(),
                normalized_url: "https://hosta.tld/track/x".into(),
            })
            .await
            .unwrap();
        repo.update_status(d.id, DownloadStatus::Completed, 100, None, Some("/tmp/a".into()))
            .await
            .unwrap();
        let first = repo.find_by_id(d.id).await.unwrap().unwrap();
        let first_finished_at = first.finished_at.unwrap();

        // MoveToDestination re-applies the same terminal status to update
        // file_path only; the original completion time must not move.
        repo.update_status(d.id, DownloadStatus::Completed, 100, None, Some("/var/dest/a".into()))
            .await
            .unwrap();
        let moved = repo.find_by_id(d.id).await.unwrap().unwrap();
        assert_eq!(moved.file_path.as_deref(), Some("/var/dest/a"));
        assert_eq!(moved.finished_at.unwrap(), first_finished_at);
    }

    #[tokio::test]
    async fn update_process_id_sets_started_at_once() {
        let repo = repo().await;
        let d = repo
            .create(NewDownload {
                url: "https://hosta.tld/track/x".into(),
                normalized_url: "https://hosta.tld/track/x".into(),
            })
            .await
            .unwrap();

        repo.update_process_id(d.id, 1234).await.unwrap();
        let found = repo.find_by_id(d.id).await.unwrap().unwrap();
        assert_eq!(found.process_id, Some(1234));
        let first_started = found.started_at.unwrap();

        repo.update_process_id(d.id, 5678).await.unwrap();
        let found2 = repo.find_by_id(d.id).await.unwrap().unwrap();
        assert_eq!(found2.process_id, Some(5678));
        assert_eq!(found2.started_at.unwrap(), first_started);
    }

    #[tokio::test]
    async fn count_by_status() {
        let repo = repo().await;
        repo.create(NewDownload {
            url: "https://hosta.tld/track/1".into(),
            normalized_url: "https://hosta.tld/track/1".into(),
        })
        .await
        .unwrap();
        assert_eq!(repo.count_by_status(DownloadStatus::Pending).await.unwrap(), 1);
        assert_eq!(repo.count_by_status(DownloadStatus::Completed).await.unwrap(), 0);
    }
}
