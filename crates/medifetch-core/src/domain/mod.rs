//! Domain records for downloads, media, event logs, and the cache store.
//!
//! Pure data types with no I/O dependencies.

mod cache;
mod download;
mod log;
mod media;

pub use cache::{CacheEntry, CacheStats};
pub use download::{Download, DownloadId, DownloadStatus, NewDownload};
pub use log::{DownloadLog, EventType};
pub use media::{Media, MediaFields, MediaId, MediaKind, NewMedia, Provider, Track};
