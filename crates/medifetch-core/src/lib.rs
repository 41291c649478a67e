//! Core domain types and port definitions for medifetch.
//!
//! Pure domain logic lives here: no I/O, no networking, no runtime
//! dependencies beyond what's needed to describe async port traits.
//! Adapters (`medifetch-db`, `medifetch-extract`, `medifetch-http`) depend
//! on this crate, never the other way around.

pub mod config;
pub mod domain;
pub mod errors;
pub mod ports;
pub mod url;

pub use config::AppConfig;
pub use domain::{
    CacheEntry, CacheStats, Download, DownloadId, DownloadLog, DownloadStatus, EventType, Media,
    MediaFields, MediaId, MediaKind, NewDownload, NewMedia, Provider, Track,
};
pub use errors::AppError;
pub use ports::{
    days_ago, DownloadExecutor, DownloadLogRepository, DownloadRepository, ExecuteOutcome,
    KvCache, MediaCandidate, MediaRepository, MetadataExtractor, NewDownloadLog,
    ProcessIdCallback, ProgressCallback, StorageProbe,
};

#[cfg(test)]
use mockall as _;
