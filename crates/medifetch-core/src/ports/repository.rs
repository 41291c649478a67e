//! Repository ports for the Download store (C2).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Download, DownloadId, DownloadLog, DownloadStatus, EventType, Media, MediaFields, MediaId,
    NewDownload, NewMedia,
};
use crate::errors::AppError;

/// Durable records for `Download` rows.
///
/// Single-writer per record; the store's transactional semantics make
/// multi-statement compound operations (e.g. setting `completed` with a
/// `file_path`) atomic.
#[async_trait]
pub trait DownloadRepository: Send + Sync {
    async fn find_by_id(&self, id: DownloadId) -> Result<Option<Download>, AppError>;

    /// Oldest `pending` row by `created_at` ascending.
    async fn find_next_pending(&self) -> Result<Option<Download>, AppError>;

    /// Any row with this `normalized_url` whose status is active
    /// (`pending` or `in_progress`). Used for duplicate rejection.
    async fn find_active_by_normalized_url(
        &self,
        normalized_url: &str,
    ) -> Result<Option<Download>, AppError>;

    /// `created_at` descending, paginated.
    async fn find_by_status(
        &self,
        status: DownloadStatus,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Download>, AppError>;

    /// `created_at` descending, paginated.
    async fn find_all(&self, page: u32, page_size: u32) -> Result<Vec<Download>, AppError>;

    /// Rows with status in `{completed, failed}` whose `finished_at` is
    /// older than `days`.
    async fn find_old_completed(&self, days: u32) -> Result<Vec<Download>, AppError>;

    /// Rows with `status = in_progress` whose `started_at` is older than
    /// `timeout_minutes`.
    async fn find_stalled_in_progress(
        &self,
        timeout_minutes: u32,
    ) -> Result<Vec<Download>, AppError>;

    async fn count_all(&self) -> Result<u64, AppError>;
    async fn count_by_status(&self, status: DownloadStatus) -> Result<u64, AppError>;

    /// Insert a new row with `status = pending`, `progress = 0`,
    /// `media_id = None`, and `created_at = now`.
    async fn create(&self, data: NewDownload) -> Result<Download, AppError>;

    /// Set status/progress/error_message/file_path. Sets `finished_at =
    /// now` iff the new status is terminal.
    async fn update_status(
        &self,
        id: DownloadId,
        status: DownloadStatus,
        progress: i32,
        error_message: Option<String>,
        file_path: Option<String>,
    ) -> Result<(), AppError>;

    /// Record the Extractor's OS process id. This is the sole writer of
    /// `started_at`, which it sets to `now`.
    async fn update_process_id(&self, id: DownloadId, process_id: u32) -> Result<(), AppError>;

    async fn update_media_id(&self, id: DownloadId, media_id: MediaId) -> Result<(), AppError>;

    async fn delete(&self, id: DownloadId) -> Result<(), AppError>;
    async fn delete_all(&self) -> Result<(), AppError>;
}

/// Durable records for `Media` rows.
#[async_trait]
pub trait MediaRepository: Send + Sync {
    async fn find_by_id(&self, id: MediaId) -> Result<Option<Media>, AppError>;

    /// Used for dedup on metadata import.
    async fn find_by_provider_and_provider_id(
        &self,
        provider: crate::domain::Provider,
        provider_id: &str,
    ) -> Result<Option<Media>, AppError>;

    async fn find_all(&self, page: u32, page_size: u32) -> Result<Vec<Media>, AppError>;
    async fn count_all(&self) -> Result<u64, AppError>;

    /// Rows with no `Download` referencing them. Deliberately uncached
    /// like the other cleanup-facing queries, since it must see the
    /// current state of `downloads.media_id`.
    async fn find_orphaned(&self) -> Result<Vec<Media>, AppError>;

    async fn create(&self, data: NewMedia) -> Result<Media, AppError>;

    /// Rejects attempts to change `provider`/`provider_id`; sets
    /// `updated_at = now`. No-ops (but still succeeds) if `fields` is
    /// empty.
    async fn update_metadata(&self, id: MediaId, fields: MediaFields) -> Result<(), AppError>;

    async fn delete(&self, id: MediaId) -> Result<(), AppError>;
    async fn delete_all(&self) -> Result<(), AppError>;
}

/// Fields supplied when appending a `DownloadLog` row.
#[derive(Clone, Debug, PartialEq)]
pub struct NewDownloadLog {
    pub download_id: DownloadId,
    pub event_type: EventType,
    pub message: String,
    pub metadata: Option<serde_json::Value>,
}

/// Durable records for `DownloadLog` rows.
#[async_trait]
pub trait DownloadLogRepository: Send + Sync {
    /// `timestamp = now`.
    async fn create(&self, data: NewDownloadLog) -> Result<DownloadLog, AppError>;

    /// `timestamp` descending, paginated.
    async fn find_by_download_id(
        &self,
        download_id: DownloadId,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<DownloadLog>, AppError>;

    async fn count_by_download_id(&self, download_id: DownloadId) -> Result<u64, AppError>;

    /// Delete rows older than `days`; returns the count removed.
    async fn delete_old_logs(&self, days: u32) -> Result<u64, AppError>;
}

/// Helper used by tests and adapters to compute a retention cutoff.
#[must_use]
pub fn days_ago(days: u32) -> DateTime<Utc> {
    Utc::now() - chrono::Duration::days(i64::from(days))
}
