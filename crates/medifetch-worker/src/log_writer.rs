//! Event log writer (C7): thin helper in front of
//! [`DownloadLogRepository::create`], enforcing the event-type
//! enumeration and giving callers a one-line way to append a row.

use std::sync::Arc;

use medifetch_core::{AppError, DownloadId, DownloadLogRepository, EventType, NewDownloadLog};
use tracing::warn;

/// Appends lifecycle events for a `Download`. Holds the repository it
/// writes through; stateless otherwise.
#[derive(Clone)]
pub struct DownloadLogWriter {
    repo: Arc<dyn DownloadLogRepository>,
}

impl DownloadLogWriter {
    #[must_use]
    pub const fn new(repo: Arc<dyn DownloadLogRepository>) -> Self {
        Self { repo }
    }

    pub async fn append(
        &self,
        download_id: DownloadId,
        event_type: EventType,
        message: impl Into<String>,
        metadata: Option<serde_json::Value>,
    ) -> Result<(), AppError> {
        self.repo
            .create(NewDownloadLog {
                download_id,
                event_type,
                message: message.into(),
                metadata,
            })
            .await
            .map(|_| ())
    }

    /// Same as [`Self::append`], but swallows failures after logging them
    /// at warn level. Use at points in the lifecycle where a logging
    /// failure must never derail the operation it's annotating.
    pub async fn append_best_effort(
        &self,
        download_id: DownloadId,
        event_type: EventType,
        message: impl Into<String>,
        metadata: Option<serde_json::Value>,
    ) {
        if let Err(err) = self.append(download_id, event_type, message, metadata).await {
            warn!(%download_id, %event_type, %err, "failed to append download log");
        }
    }
}
