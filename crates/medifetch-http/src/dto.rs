//! JSON request/response bodies for the downloads HTTP surface.

use serde::{Deserialize, Serialize};

use medifetch_core::{Download, DownloadId, DownloadLog, DownloadStatus, Media, MediaFields};
use medifetch_worker::{DownloadLogPage, DownloadPage, DownloadStatusView, EnqueueResult};

#[derive(Debug, Deserialize)]
pub struct EnqueueRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueResponse {
    pub download_id: DownloadId,
    pub media_id: Option<medifetch_core::MediaId>,
    pub url: String,
    pub status: DownloadStatus,
}

impl From<EnqueueResult> for EnqueueResponse {
    fn from(r: EnqueueResult) -> Self {
        Self {
            download_id: r.download_id,
            media_id: r.media_id,
            url: r.url,
            status: r.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DownloadStatusResponse {
    pub download: Download,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<Media>,
}

impl From<DownloadStatusView> for DownloadStatusResponse {
    fn from(v: DownloadStatusView) -> Self {
        Self {
            download: v.download,
            media: v.media,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDownloadsQuery {
    pub status: Option<DownloadStatus>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDownloadsResponse {
    pub downloads: Vec<Download>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl From<DownloadPage> for ListDownloadsResponse {
    fn from(p: DownloadPage) -> Self {
        Self {
            downloads: p.items,
            total: p.total,
            page: p.page,
            page_size: p.page_size,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsPagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub logs: Vec<DownloadLog>,
    pub pagination: LogsPagination,
}

impl From<DownloadLogPage> for LogsResponse {
    fn from(p: DownloadLogPage) -> Self {
        Self {
            logs: p.items,
            pagination: LogsPagination {
                page: p.page,
                limit: p.page_size,
                total: p.total,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    #[must_use]
    pub const fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveResponse {
    pub success: bool,
    pub dest_path: String,
}

#[derive(Debug, Serialize)]
pub struct MediaResponse {
    pub media: Media,
}

/// Body for `PATCH /media/{id}`. Carries the editable fields plus the
/// immutable `provider`/`providerId` pair purely so a caller attempting
/// to change them gets a documented `immutable_field` 400 instead of
/// having the attempt silently ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaPatchRequest {
    #[serde(flatten)]
    pub fields: MediaFields,
    pub provider: Option<String>,
    pub provider_id: Option<String>,
}

impl MediaPatchRequest {
    /// The name of the first immutable field present in the request, if
    /// any.
    #[must_use]
    pub fn immutable_field_attempted(&self) -> Option<&'static str> {
        if self.provider.is_some() {
            Some("provider")
        } else if self.provider_id.is_some() {
            Some("providerId")
        } else {
            None
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Body for the sandbox pass-through endpoint. `args` is passed to the
/// Extractor binary verbatim, one argv entry per array element -- no
/// shell is invoked, so there is no injection surface through this
/// field, only whatever the Extractor itself does with its flags.
#[derive(Debug, Deserialize)]
pub struct SandboxRequest {
    pub args: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxResponse {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub is_json_output: bool,
}

/// One event of the `/api/sandbox/yt-dlp/stream` server-push stream, the
/// streaming sibling of the buffered sandbox pass-through.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SandboxStreamEvent {
    Start,
    Stdout { line: String },
    Stderr { line: String },
    Progress { percent: f64 },
    Complete { exit_code: Option<i32> },
    Error { message: String },
}
