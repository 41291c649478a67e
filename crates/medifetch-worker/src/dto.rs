//! Value types returned by [`crate::DownloadService`] use cases.
//!
//! These are plain data, independent of any HTTP framing -- `medifetch-http`
//! maps them onto JSON response bodies.

use medifetch_core::{Download, DownloadId, DownloadLog, Media, MediaId};

/// Result of [`crate::DownloadService::enqueue`].
#[derive(Clone, Debug, PartialEq)]
pub struct EnqueueResult {
    pub download_id: DownloadId,
    pub media_id: Option<MediaId>,
    pub url: String,
    pub status: medifetch_core::DownloadStatus,
}

/// Result of [`crate::DownloadService::get_download_status`].
#[derive(Clone, Debug, PartialEq)]
pub struct DownloadStatusView {
    pub download: Download,
    pub media: Option<Media>,
}

/// A page of results plus the total row count across all pages.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

pub type DownloadPage = Page<Download>;
pub type DownloadLogPage = Page<DownloadLog>;

/// Result of [`crate::DownloadService::cleanup_orphaned_files`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CleanupResult {
    pub downloads_deleted: u64,
    pub media_deleted: u64,
    pub files_deleted: u64,
}

/// Result of [`crate::DownloadService::move_to_destination`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveResult {
    pub dest_path: String,
}
