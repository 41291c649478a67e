use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::download::DownloadId;

/// The enumerated event-type vocabulary for `DownloadLog` rows and the
/// optional streaming interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    #[serde(rename = "download:enqueued")]
    DownloadEnqueued,
    #[serde(rename = "download:started")]
    DownloadStarted,
    #[serde(rename = "download:progress")]
    DownloadProgress,
    #[serde(rename = "download:completed")]
    DownloadCompleted,
    #[serde(rename = "download:failed")]
    DownloadFailed,
    #[serde(rename = "download:cancelled")]
    DownloadCancelled,
    #[serde(rename = "download:stalled")]
    DownloadStalled,
    #[serde(rename = "storage:low")]
    StorageLow,
    #[serde(rename = "metadata:fetching")]
    MetadataFetching,
    #[serde(rename = "metadata:found")]
    MetadataFound,
}

impl EventType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DownloadEnqueued => "download:enqueued",
            Self::DownloadStarted => "download:started",
            Self::DownloadProgress => "download:progress",
            Self::DownloadCompleted => "download:completed",
            Self::DownloadFailed => "download:failed",
            Self::DownloadCancelled => "download:cancelled",
            Self::DownloadStalled => "download:stalled",
            Self::StorageLow => "storage:low",
            Self::MetadataFetching => "metadata:fetching",
            Self::MetadataFound => "metadata:found",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An append-only lifecycle event for a `Download`.
///
/// Immutable once created; ordered by `timestamp` within a `download_id`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadLog {
    pub id: i64,
    pub download_id: DownloadId,
    pub event_type: EventType,
    pub message: String,
    /// Free-form structured payload (progress value, storage figures, ...).
    pub metadata: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_roundtrips_wire_format() {
        let json = serde_json::to_string(&EventType::DownloadProgress).unwrap();
        assert_eq!(json, "\"download:progress\"");
        let parsed: EventType = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, EventType::DownloadProgress);
    }
}
