//! Use cases (C9): enqueue, process, status, list, cancel, retry, logs,
//! media update, move, cleanup, mark-stalled.
//!
//! `DownloadService` composes the repository ports (C2, decorated by C8
//! at the composition root) with the extractor/executor/storage ports
//! (C4-C6) behind a single object the `Worker` (C10) and the HTTP layer
//! (out of core scope) both drive.

use std::path::Path;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use serde_json::json;
use tracing::warn;

use medifetch_core::{
    AppConfig, AppError, Download, DownloadExecutor, DownloadId, DownloadLogRepository,
    DownloadRepository, DownloadStatus, EventType, Media, MediaFields, MediaId, MediaRepository,
    MetadataExtractor, NewDownload, NewMedia, ProcessIdCallback, ProgressCallback, StorageProbe,
};

use crate::dto::{CleanupResult, DownloadLogPage, DownloadPage, DownloadStatusView, EnqueueResult, MoveResult};
use crate::log_writer::DownloadLogWriter;

const MAX_PAGE_SIZE: u32 = 100;

/// Orchestrates every download/media/log use case the worker and HTTP
/// layer drive: enqueue, process, inspect, cancel, retry, and the
/// periodic cleanup/stalled-detection sweeps.
#[derive(Clone)]
pub struct DownloadService {
    config: AppConfig,
    downloads: Arc<dyn DownloadRepository>,
    media: Arc<dyn MediaRepository>,
    download_logs: Arc<dyn DownloadLogRepository>,
    logs: DownloadLogWriter,
    extractor: Arc<dyn MetadataExtractor>,
    executor: Arc<dyn DownloadExecutor>,
    storage: Arc<dyn StorageProbe>,
}

impl DownloadService {
    #[must_use]
    pub fn new(
        config: AppConfig,
        downloads: Arc<dyn DownloadRepository>,
        media: Arc<dyn MediaRepository>,
        download_logs: Arc<dyn DownloadLogRepository>,
        extractor: Arc<dyn MetadataExtractor>,
        executor: Arc<dyn DownloadExecutor>,
        storage: Arc<dyn StorageProbe>,
    ) -> Self {
        let logs = DownloadLogWriter::new(Arc::clone(&download_logs));
        Self {
            config,
            downloads,
            media,
            download_logs,
            logs,
            extractor,
            executor,
            storage,
        }
    }

    fn validate_pagination(page: u32, page_size: u32) -> Result<(), AppError> {
        if page == 0 {
            return Err(AppError::bad_pagination("page must be >= 1"));
        }
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(AppError::bad_pagination(format!(
                "page_size must be in [1, {MAX_PAGE_SIZE}]"
            )));
        }
        Ok(())
    }

    // ---- Enqueue --------------------------------------------------------

    pub async fn enqueue(&self, url: &str) -> Result<EnqueueResult, AppError> {
        let normalized_url = medifetch_core::url::normalize(url);
        let detection = medifetch_core::url::detect(url)
            .ok_or_else(|| AppError::invalid_url(format!("unrecognized provider for url: {url}")))?;

        if self
            .downloads
            .find_active_by_normalized_url(&normalized_url)
            .await?
            .is_some()
        {
            return Err(AppError::duplicate_active());
        }

        let pending_count = self
            .downloads
            .count_by_status(DownloadStatus::Pending)
            .await?;
        if pending_count >= u64::from(self.config.max_pending_downloads) {
            return Err(AppError::queue_full(self.config.max_pending_downloads));
        }

        let download = self
            .downloads
            .create(NewDownload {
                url: url.to_string(),
                normalized_url,
            })
            .await?;

        self.logs
            .append(download.id, EventType::DownloadEnqueued, "download enqueued", None)
            .await?;

        self.spawn_metadata_import(download.id, url.to_string(), detection);

        Ok(EnqueueResult {
            download_id: download.id,
            media_id: download.media_id,
            url: download.url,
            status: download.status,
        })
    }

    /// Fire-and-forget metadata import. Never awaited by the caller;
    /// every failure is logged at warn level and swallowed.
    fn spawn_metadata_import(
        &self,
        download_id: DownloadId,
        url: String,
        detection: medifetch_core::url::Detection,
    ) {
        let downloads = Arc::clone(&self.downloads);
        let media = Arc::clone(&self.media);
        let extractor = Arc::clone(&self.extractor);
        let logs = self.logs.clone();

        tokio::spawn(async move {
            import_metadata(download_id, &url, detection, &downloads, &media, &extractor, &logs).await;
        });
    }

    /// Oldest pending download's id, if any. The sole entry point the
    /// worker's main loop uses to decide whether there is work to do.
    pub async fn find_next_pending(&self) -> Result<Option<DownloadId>, AppError> {
        Ok(self.downloads.find_next_pending().await?.map(|d| d.id))
    }

    // ---- ProcessDownload --------------------------------------------------

    pub async fn process_download(&self, download_id: DownloadId) -> Result<(), AppError> {
        let download = self
            .downloads
            .find_by_id(download_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("download {download_id}")))?;
        if download.status != DownloadStatus::Pending {
            return Err(AppError::invalid_state(format!(
                "download {download_id} is not pending"
            )));
        }

        let result = self.process_download_inner(&download).await;

        if let Err(ref err) = result {
            let last_progress = self.current_progress(download_id).await.unwrap_or(download.progress);
            if let Err(update_err) = self
                .downloads
                .update_status(
                    download_id,
                    DownloadStatus::Failed,
                    last_progress,
                    Some(err.to_string()),
                    None,
                )
                .await
            {
                warn!(%download_id, %update_err, "failed to persist terminal failed status");
            }
            self.logs
                .append_best_effort(
                    download_id,
                    EventType::DownloadFailed,
                    err.to_string(),
                    Some(json!({"error": err.to_string()})),
                )
                .await;
        }

        result
    }

    async fn current_progress(&self, download_id: DownloadId) -> Option<i32> {
        self.downloads
            .find_by_id(download_id)
            .await
            .ok()
            .flatten()
            .map(|d| d.progress)
    }

    async fn process_download_inner(&self, download: &Download) -> Result<(), AppError> {
        let download_id = download.id;

        if !self
            .storage
            .has_at_least(&self.config.download_temp_dir, self.config.min_storage_gb)
            .await?
        {
            let available = self
                .storage
                .available_bytes(&self.config.download_temp_dir)
                .await
                .unwrap_or(0);
            #[allow(clippy::cast_precision_loss)]
            let available_gb = available as f64 / 1_000_000_000.0;
            self.logs
                .append_best_effort(
                    download_id,
                    EventType::StorageLow,
                    "insufficient storage to start download",
                    Some(json!({
                        "availableGB": available_gb,
                        "requiredGB": self.config.min_storage_gb,
                    })),
                )
                .await;
            return Err(AppError::insufficient_storage(
                available_gb,
                self.config.min_storage_gb,
            ));
        }

        self.downloads
            .update_status(download_id, DownloadStatus::InProgress, 0, None, None)
            .await?;
        self.logs
            .append(download_id, EventType::DownloadStarted, "download started", None)
            .await?;

        let detection = medifetch_core::url::detect(&download.url)
            .ok_or_else(|| AppError::invalid_url(format!("unrecognized provider for url: {}", download.url)))?;

        let last_logged = Arc::new(AtomicI32::new(0));
        let last_progress = Arc::new(AtomicI32::new(0));
        let on_progress: ProgressCallback = {
            let downloads = Arc::clone(&self.downloads);
            let logs = self.logs.clone();
            let threshold = self.config.progress_log_threshold;
            let last_logged = Arc::clone(&last_logged);
            let last_progress = Arc::clone(&last_progress);
            Arc::new(move |progress: i32| {
                last_progress.store(progress, Ordering::SeqCst);
                let downloads = Arc::clone(&downloads);
                let logs = logs.clone();
                let last_logged = Arc::clone(&last_logged);
                tokio::spawn(async move {
                    if let Err(err) = downloads
                        .update_status(download_id, DownloadStatus::InProgress, progress, None, None)
                        .await
                    {
                        warn!(%download_id, %err, "failed to persist progress update");
                    }

                    let previous = last_logged.load(Ordering::SeqCst);
                    if progress - previous >= threshold || progress == 100 {
                        last_logged.store(progress, Ordering::SeqCst);
                        logs.append_best_effort(
                            download_id,
                            EventType::DownloadProgress,
                            format!("progress {progress}%"),
                            Some(json!({"progress": progress})),
                        )
                        .await;
                    }
                });
            })
        };

        let on_process_id: ProcessIdCallback = {
            let downloads = Arc::clone(&self.downloads);
            Arc::new(move |process_id: u32| {
                let downloads = Arc::clone(&downloads);
                tokio::spawn(async move {
                    if let Err(err) = downloads.update_process_id(download_id, process_id).await {
                        warn!(%download_id, %err, "failed to record process id");
                    }
                });
            })
        };

        let outcome = self
            .executor
            .execute(&download.url, detection.provider, on_progress, on_process_id)
            .await?;

        if download.media_id.is_none() {
            import_metadata(
                download_id,
                &download.url,
                detection,
                &self.downloads,
                &self.media,
                &self.extractor,
                &self.logs,
            )
            .await;
        }

        self.downloads
            .update_status(
                download_id,
                DownloadStatus::Completed,
                100,
                None,
                Some(outcome.file_path),
            )
            .await?;
        self.logs
            .append(download_id, EventType::DownloadCompleted, "download completed", None)
            .await?;

        Ok(())
    }

    // ---- Read-only use cases ----------------------------------------------

    pub async fn get_download_status(&self, id: DownloadId) -> Result<DownloadStatusView, AppError> {
        let download = self
            .downloads
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("download {id}")))?;
        let media = match download.media_id {
            Some(media_id) => self.media.find_by_id(media_id).await?,
            None => None,
        };
        Ok(DownloadStatusView { download, media })
    }

    pub async fn list_downloads(
        &self,
        status: Option<DownloadStatus>,
        page: u32,
        page_size: u32,
    ) -> Result<DownloadPage, AppError> {
        Self::validate_pagination(page, page_size)?;
        let (items, total) = match status {
            Some(status) => (
                self.downloads.find_by_status(status, page, page_size).await?,
                self.downloads.count_by_status(status).await?,
            ),
            None => (
                self.downloads.find_all(page, page_size).await?,
                self.downloads.count_all().await?,
            ),
        };
        Ok(DownloadPage { items, total, page, page_size })
    }

    pub async fn get_download_logs(
        &self,
        id: DownloadId,
        page: u32,
        limit: u32,
    ) -> Result<DownloadLogPage, AppError> {
        Self::validate_pagination(page, limit)?;
        if self.downloads.find_by_id(id).await?.is_none() {
            return Err(AppError::not_found(format!("download {id}")));
        }
        let items = self.download_logs.find_by_download_id(id, page, limit).await?;
        let total = self.download_logs.count_by_download_id(id).await?;
        Ok(DownloadLogPage { items, total, page, page_size: limit })
    }

    pub async fn cancel_download(&self, id: DownloadId) -> Result<(), AppError> {
        let download = self
            .downloads
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("download {id}")))?;

        if !matches!(download.status, DownloadStatus::Pending | DownloadStatus::InProgress) {
            return Err(AppError::invalid_state(format!(
                "download {id} is not pending or in_progress"
            )));
        }

        if download.status == DownloadStatus::InProgress {
            if let Some(process_id) = download.process_id {
                self.executor.cancel(process_id).await?;
            }
        }

        self.downloads
            .update_status(id, DownloadStatus::Cancelled, download.progress, Some("Cancelled by user".to_string()), None)
            .await?;
        self.logs
            .append(id, EventType::DownloadCancelled, "cancelled by user", None)
            .await?;
        Ok(())
    }

    pub async fn retry_download(&self, id: DownloadId) -> Result<(), AppError> {
        let download = self
            .downloads
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("download {id}")))?;

        if !matches!(download.status, DownloadStatus::Failed | DownloadStatus::Cancelled) {
            return Err(AppError::invalid_state(format!(
                "download {id} is not failed or cancelled"
            )));
        }

        self.downloads
            .update_status(id, DownloadStatus::Pending, 0, None, None)
            .await?;
        Ok(())
    }

    pub async fn move_to_destination(&self, id: DownloadId) -> Result<MoveResult, AppError> {
        let download = self
            .downloads
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("download {id}")))?;

        if download.status != DownloadStatus::Completed {
            return Err(AppError::invalid_state(format!("download {id} is not completed")));
        }
        let file_path = download
            .file_path
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::invalid_state(format!("download {id} has no file_path")))?;

        let source = Path::new(&file_path);
        if !tokio::fs::try_exists(source).await.unwrap_or(false) {
            return Err(AppError::invalid_state(format!("{file_path} does not exist on disk")));
        }

        let temp_root = Path::new(&self.config.download_temp_dir);
        let relative = source.strip_prefix(temp_root).unwrap_or(source);
        let dest_path = Path::new(&self.config.download_dest_dir).join(relative);

        if let Some(parent) = dest_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::internal(format!("failed to create destination directory: {e}")))?;
        }
        tokio::fs::rename(source, &dest_path)
            .await
            .map_err(|e| AppError::internal(format!("failed to move download: {e}")))?;

        let dest_path_str = dest_path.to_string_lossy().to_string();
        self.downloads
            .update_status(id, DownloadStatus::Completed, download.progress, None, Some(dest_path_str.clone()))
            .await?;

        Ok(MoveResult { dest_path: dest_path_str })
    }

    pub async fn update_media_metadata(&self, id: MediaId, fields: MediaFields) -> Result<(), AppError> {
        if self.media.find_by_id(id).await?.is_none() {
            return Err(AppError::not_found(format!("media {id}")));
        }
        self.media.update_metadata(id, fields).await
    }

    pub async fn get_media_details(&self, id: MediaId) -> Result<Media, AppError> {
        self.media
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("media {id}")))
    }

    pub async fn cleanup_orphaned_files(&self, retention_days: u32) -> Result<CleanupResult, AppError> {
        let mut result = CleanupResult::default();

        for download in self.downloads.find_old_completed(retention_days).await? {
            if let Some(file_path) = &download.file_path {
                if tokio::fs::try_exists(file_path).await.unwrap_or(false) {
                    match tokio::fs::remove_dir_all(file_path).await {
                        Ok(()) => result.files_deleted += 1,
                        Err(err) => warn!(download_id = %download.id, %err, "failed to remove download directory"),
                    }
                }
            }
            match self.downloads.delete(download.id).await {
                Ok(()) => result.downloads_deleted += 1,
                Err(err) => warn!(download_id = %download.id, %err, "failed to delete download row"),
            }
        }

        for media in self.media.find_orphaned().await? {
            match self.media.delete(media.id).await {
                Ok(()) => result.media_deleted += 1,
                Err(err) => warn!(media_id = %media.id, %err, "failed to delete orphaned media"),
            }
        }

        Ok(result)
    }

    pub async fn cleanup_old_logs(&self, retention_days: u32) -> Result<u64, AppError> {
        self.download_logs.delete_old_logs(retention_days).await
    }

    pub async fn mark_stalled_downloads(&self, timeout_minutes: u32) -> Result<u64, AppError> {
        let stalled = self.downloads.find_stalled_in_progress(timeout_minutes).await?;
        let mut count = 0u64;
        for download in stalled {
            let message = format!("Download stalled after {timeout_minutes} minutes");
            if let Err(err) = self
                .downloads
                .update_status(download.id, DownloadStatus::Failed, download.progress, Some(message.clone()), None)
                .await
            {
                warn!(download_id = %download.id, %err, "failed to mark stalled download as failed");
                continue;
            }
            self.logs
                .append_best_effort(download.id, EventType::DownloadStalled, message, None)
                .await;
            count += 1;
        }
        Ok(count)
    }
}

/// Shared metadata-import flow used by both Enqueue's background task
/// and ProcessDownload's synchronous fallback for downloads that raced
/// ahead of the background import. Never returns an error -- every
/// failure is logged at warn level and swallowed, since the download
/// lifecycle must never depend on metadata extraction succeeding.
async fn import_metadata(
    download_id: DownloadId,
    url: &str,
    detection: medifetch_core::url::Detection,
    downloads: &Arc<dyn DownloadRepository>,
    media: &Arc<dyn MediaRepository>,
    extractor: &Arc<dyn MetadataExtractor>,
    logs: &DownloadLogWriter,
) {
    logs.append_best_effort(download_id, EventType::MetadataFetching, "fetching metadata", None)
        .await;

    let candidate = match extractor
        .fetch_metadata(url, detection.provider, detection.kind)
        .await
    {
        Ok(candidate) => candidate,
        Err(err) => {
            warn!(%download_id, %err, "metadata extraction failed, proceeding without it");
            return;
        }
    };

    let existing = if candidate.provider_id.is_empty() {
        None
    } else {
        media
            .find_by_provider_and_provider_id(detection.provider, &candidate.provider_id)
            .await
            .unwrap_or(None)
    };

    let media_record = match existing {
        Some(existing) => existing,
        None => {
            let new_media = NewMedia {
                title: candidate.title,
                artist: candidate.artist,
                album: candidate.album,
                album_artist: candidate.album_artist,
                year: candidate.year,
                cover_url: candidate.cover_url,
                duration: candidate.duration,
                provider: detection.provider,
                provider_id: candidate.provider_id,
                kind: detection.kind,
                tracks: candidate.tracks,
            };
            match media.create(new_media).await {
                Ok(created) => created,
                Err(err) => {
                    warn!(%download_id, %err, "failed to persist fetched media metadata");
                    return;
                }
            }
        }
    };

    logs.append_best_effort(
        download_id,
        EventType::MetadataFound,
        "metadata found",
        Some(json!({"mediaId": media_record.id.0})),
    )
    .await;

    // Only link if still pending -- if the worker already moved the
    // download past pending, ProcessDownload's own synchronous fallback
    // owns the link from here.
    if let Ok(Some(current)) = downloads.find_by_id(download_id).await {
        if current.status == DownloadStatus::Pending || current.media_id.is_none() {
            if let Err(err) = downloads.update_media_id(download_id, media_record.id).await {
                warn!(%download_id, %err, "failed to link media to download");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medifetch_core::{MediaCandidate, MediaKind};
    use medifetch_db::setup::setup_test_database;
    use medifetch_db::{SqliteDownloadLogRepository, SqliteDownloadRepository, SqliteMediaRepository};
    use std::sync::atomic::AtomicBool;
    use tokio::time::timeout;

    struct FakeStorage {
        available_bytes: u64,
    }

    #[async_trait::async_trait]
    impl StorageProbe for FakeStorage {
        async fn available_bytes(&self, _path: &str) -> Result<u64, AppError> {
            Ok(self.available_bytes)
        }
    }

    struct FakeExtractor {
        candidate: Option<MediaCandidate>,
    }

    #[async_trait::async_trait]
    impl MetadataExtractor for FakeExtractor {
        async fn fetch_metadata(
            &self,
            _url: &str,
            _provider: medifetch_core::Provider,
            _kind: MediaKind,
        ) -> Result<MediaCandidate, AppError> {
            self.candidate
                .clone()
                .ok_or_else(|| AppError::internal("no metadata available"))
        }
    }

    struct FakeExecutor {
        should_fail: bool,
        cancelled: Arc<AtomicBool>,
    }

    #[async_trait::async_trait]
    impl DownloadExecutor for FakeExecutor {
        async fn execute(
            &self,
            _url: &str,
            _provider: medifetch_core::Provider,
            on_progress: medifetch_core::ProgressCallback,
            on_process_id: medifetch_core::ProcessIdCallback,
        ) -> Result<medifetch_core::ExecuteOutcome, AppError> {
            on_process_id(4242);
            on_progress(50);
            if self.should_fail {
                return Err(AppError::internal("extractor exited with code 1"));
            }
            Ok(medifetch_core::ExecuteOutcome {
                file_path: "/tmp/out/file.flac".to_string(),
                process_id: 4242,
            })
        }

        async fn cancel(&self, _process_id: u32) -> Result<(), AppError> {
            self.cancelled.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    async fn service_with(
        extractor: FakeExtractor,
        executor: FakeExecutor,
        available_bytes: u64,
    ) -> (DownloadService, sqlx::SqlitePool) {
        let pool = setup_test_database().await.unwrap();
        let downloads: Arc<dyn DownloadRepository> = Arc::new(SqliteDownloadRepository::new(pool.clone()));
        let media: Arc<dyn MediaRepository> = Arc::new(SqliteMediaRepository::new(pool.clone()));
        let download_logs: Arc<dyn DownloadLogRepository> = Arc::new(SqliteDownloadLogRepository::new(pool.clone()));
        let service = DownloadService::new(
            AppConfig::default(),
            downloads,
            media,
            download_logs,
            Arc::new(extractor),
            Arc::new(executor),
            Arc::new(FakeStorage { available_bytes }),
        );
        (service, pool)
    }

    #[tokio::test]
    async fn enqueue_rejects_unrecognized_url() {
        let (service, _pool) = service_with(
            FakeExtractor { candidate: None },
            FakeExecutor { should_fail: false, cancelled: Arc::new(AtomicBool::new(false)) },
            10_000_000_000,
        )
        .await;
        let err = service.enqueue("https://example.com/nope").await.unwrap_err();
        assert_eq!(err.kind(), "invalid_url");
    }

    #[tokio::test]
    async fn enqueue_rejects_duplicate_active() {
        let (service, _pool) = service_with(
            FakeExtractor { candidate: None },
            FakeExecutor { should_fail: false, cancelled: Arc::new(AtomicBool::new(false)) },
            10_000_000_000,
        )
        .await;
        service.enqueue("https://hosta.tld/track/abc").await.unwrap();
        let err = service.enqueue("https://hosta.tld/track/abc").await.unwrap_err();
        assert_eq!(err.kind(), "duplicate_active");
    }

    #[tokio::test]
    async fn enqueue_enforces_max_pending() {
        let mut config = AppConfig::default();
        config.max_pending_downloads = 1;
        let pool = setup_test_database().await.unwrap();
        let downloads: Arc<dyn DownloadRepository> = Arc::new(SqliteDownloadRepository::new(pool.clone()));
        let media: Arc<dyn MediaRepository> = Arc::new(SqliteMediaRepository::new(pool.clone()));
        let download_logs: Arc<dyn DownloadLogRepository> = Arc::new(SqliteDownloadLogRepository::new(pool));
        let service = DownloadService::new(
            config,
            downloads,
            media,
            download_logs,
            Arc::new(FakeExtractor { candidate: None }),
            Arc::new(FakeExecutor { should_fail: false, cancelled: Arc::new(AtomicBool::new(false)) }),
            Arc::new(FakeStorage { available_bytes: 10_000_000_000 }),
        );

        service.enqueue("https://hosta.tld/track/1").await.unwrap();
        let err = service.enqueue("https://hosta.tld/track/2").await.unwrap_err();
        assert_eq!(err.kind(), "queue_full");
    }

    #[tokio::test]
    async fn process_download_fails_fast_on_insufficient_storage() {
        let (service, _pool) = service_with(
            FakeExtractor { candidate: None },
            FakeExecutor { should_fail: false, cancelled: Arc::new(AtomicBool::new(false)) },
            1_000_000,
        )
        .await;
        let enqueued = service.enqueue("https://hosta.tld/track/abc").await.unwrap();

        let err = service
            .process_download(enqueued.download_id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "insufficient_storage");

        let status = service.get_download_status(enqueued.download_id).await.unwrap();
        assert_eq!(status.download.status, DownloadStatus::Failed);
    }

    #[tokio::test]
    async fn process_download_completes_and_records_file_path() {
        let (service, _pool) = service_with(
            FakeExtractor {
                candidate: Some(MediaCandidate {
                    title: Some("Song".into()),
                    artist: Some("Artist".into()),
                    album: None,
                    album_artist: None,
                    year: None,
                    cover_url: None,
                    duration: Some(180),
                    provider_id: "abc".into(),
                    tracks: None,
                }),
            },
            FakeExecutor { should_fail: false, cancelled: Arc::new(AtomicBool::new(false)) },
            10_000_000_000,
        )
        .await;
        let enqueued = service.enqueue("https://hosta.tld/track/abc").await.unwrap();

        // Give the background metadata-import task a chance to run before
        // the synchronous process loop races it.
        timeout(std::time::Duration::from_secs(1), async {
            loop {
                if service
                    .get_download_status(enqueued.download_id)
                    .await
                    .unwrap()
                    .download
                    .media_id
                    .is_some()
                {
                    break;
                }
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        service.process_download(enqueued.download_id).await.unwrap();

        let status = service.get_download_status(enqueued.download_id).await.unwrap();
        assert_eq!(status.download.status, DownloadStatus::Completed);
        assert_eq!(status.download.file_path.as_deref(), Some("/tmp/out/file.flac"));
        assert!(status.media.is_some());
    }

    #[tokio::test]
    async fn cancel_download_invokes_executor_cancel_when_in_progress() {
        let cancelled = Arc::new(AtomicBool::new(false));
        let (service, _pool) = service_with(
            FakeExtractor { candidate: None },
            FakeExecutor { should_fail: false, cancelled: Arc::clone(&cancelled) },
            10_000_000_000,
        )
        .await;
        let enqueued = service.enqueue("https://hosta.tld/track/abc").await.unwrap();

        // Simulate a download that has started but not yet finished.
        let pool_check = service.get_download_status(enqueued.download_id).await.unwrap();
        assert_eq!(pool_check.download.status, DownloadStatus::Pending);

        service.cancel_download(enqueued.download_id).await.unwrap();
        let status = service.get_download_status(enqueued.download_id).await.unwrap();
        assert_eq!(status.download.status, DownloadStatus::Cancelled);
    }

    #[tokio::test]
    async fn cancel_download_rejects_terminal_state() {
        let (service, _pool) = service_with(
            FakeExtractor { candidate: None },
            FakeExecutor { should_fail: false, cancelled: Arc::new(AtomicBool::new(false)) },
            10_000_000_000,
        )
        .await;
        let enqueued = service.enqueue("https://hosta.tld/track/abc").await.unwrap();
        service.cancel_download(enqueued.download_id).await.unwrap();

        let err = service.cancel_download(enqueued.download_id).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_state");
    }

    #[tokio::test]
    async fn retry_download_resets_failed_to_pending() {
        let (service, _pool) = service_with(
            FakeExtractor { candidate: None },
            FakeExecutor { should_fail: true, cancelled: Arc::new(AtomicBool::new(false)) },
            10_000_000_000,
        )
        .await;
        let enqueued = service.enqueue("https://hosta.tld/track/abc").await.unwrap();
        let _ = service.process_download(enqueued.download_id).await;

        let status = service.get_download_status(enqueued.download_id).await.unwrap();
        assert_eq!(status.download.status, DownloadStatus::Failed);

        service.retry_download(enqueued.download_id).await.unwrap();
        let status = service.get_download_status(enqueued.download_id).await.unwrap();
        assert_eq!(status.download.status, DownloadStatus::Pending);
    }

    #[tokio::test]
    async fn list_downloads_rejects_zero_page() {
        let (service, _pool) = service_with(
            FakeExtractor { candidate: None },
            FakeExecutor { should_fail: false, cancelled: Arc::new(AtomicBool::new(false)) },
            10_000_000_000,
        )
        .await;
        let err = service.list_downloads(None, 0, 20).await.unwrap_err();
        assert_eq!(err.kind(), "bad_pagination");
    }

    #[tokio::test]
    async fn list_downloads_rejects_oversized_page() {
        let (service, _pool) = service_with(
            FakeExtractor { candidate: None },
            FakeExecutor { should_fail: false, cancelled: Arc::new(AtomicBool::new(false)) },
            10_000_000_000,
        )
        .await;
        let err = service.list_downloads(None, 1, 1000).await.unwrap_err();
        assert_eq!(err.kind(), "bad_pagination");
    }

    #[tokio::test]
    async fn cleanup_orphaned_files_deletes_unreferenced_media() {
        let (service, pool) = service_with(
            FakeExtractor { candidate: None },
            FakeExecutor { should_fail: false, cancelled: Arc::new(AtomicBool::new(false)) },
            10_000_000_000,
        )
        .await;

        SqliteMediaRepository::new(pool)
            .create(NewMedia {
                title: Some("Orphan".into()),
                artist: None,
                album: None,
                album_artist: None,
                year: None,
                cover_url: None,
                duration: None,
                provider: medifetch_core::Provider::A,
                provider_id: "orphan-1".into(),
                kind: MediaKind::Track,
                tracks: None,
            })
            .await
            .unwrap();

        let result = service.cleanup_orphaned_files(7).await.unwrap();
        assert_eq!(result.media_deleted, 1);
    }

    #[tokio::test]
    async fn mark_stalled_downloads_marks_nothing_when_none_are_stalled() {
        let (service, _pool) = service_with(
            FakeExtractor { candidate: None },
            FakeExecutor { should_fail: false, cancelled: Arc::new(AtomicBool::new(false)) },
            10_000_000_000,
        )
        .await;
        service.enqueue("https://hosta.tld/track/abc").await.unwrap();
        let marked = service.mark_stalled_downloads(60).await.unwrap();
        assert_eq!(marked, 0);
    }
}
