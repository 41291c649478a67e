//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the core domain expects from
//! infrastructure. They contain no implementation details and use only
//! domain types.
//!
//! # Design Rules
//!
//! - No `sqlx` types, subprocess handles, or filesystem types in any
//!   signature.
//! - Traits are minimal and CRUD-focused for repositories.
//! - Adapters (`medifetch-db`, `medifetch-extract`) implement these; the
//!   composition root (`medifetch-cli`) wires concrete types behind
//!   `Arc<dyn Trait>`.

mod cache;
mod extract;
mod repository;

pub use cache::KvCache;
pub use extract::{
    DownloadExecutor, ExecuteOutcome, MediaCandidate, MetadataExtractor, ProcessIdCallback,
    ProgressCallback, StorageProbe,
};
pub use repository::{days_ago, DownloadLogRepository, DownloadRepository, MediaRepository, NewDownloadLog};
