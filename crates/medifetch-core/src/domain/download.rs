use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::media::MediaId;

/// Canonical identifier for a download.
///
/// Assigned by the store on insert; monotonic within a store instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DownloadId(pub i64);

impl fmt::Display for DownloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for DownloadId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Lifecycle status of a `Download`.
///
/// Valid transitions are `pending -> in_progress -> {completed|failed}`,
/// `pending -> cancelled`, or `in_progress -> {cancelled|failed}`. Terminal
/// states never leave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl DownloadStatus {
    /// A status is terminal if the download will never transition again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// A download is "active" while it still occupies the admission slot
    /// for its normalized URL.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One user request to fetch one URL.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Download {
    pub id: DownloadId,
    pub url: String,
    pub normalized_url: String,
    pub media_id: Option<MediaId>,
    pub status: DownloadStatus,
    /// Integer percentage, 0-100.
    pub progress: i32,
    pub error_message: Option<String>,
    pub file_path: Option<String>,
    /// OS-level handle of the running Extractor. Meaningful only while
    /// `status == in_progress`; treated as advisory otherwise.
    pub process_id: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Fields supplied by the caller when creating a `Download` row.
///
/// The store assigns `id` and `created_at`, and initializes
/// `status = pending`, `progress = 0`, `media_id = None`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewDownload {
    pub url: String,
    pub normalized_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(DownloadStatus::Completed.is_terminal());
        assert!(DownloadStatus::Failed.is_terminal());
        assert!(DownloadStatus::Cancelled.is_terminal());
        assert!(!DownloadStatus::Pending.is_terminal());
        assert!(!DownloadStatus::InProgress.is_terminal());
    }

    #[test]
    fn active_statuses() {
        assert!(DownloadStatus::Pending.is_active());
        assert!(DownloadStatus::InProgress.is_active());
        assert!(!DownloadStatus::Completed.is_active());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&DownloadStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn download_id_display() {
        assert_eq!(DownloadId(42).to_string(), "42");
    }
}
