//! Use cases and worker main loop for medifetch.
//!
//! `medifetch-db` and `medifetch-extract` provide the concrete port
//! implementations; this crate only depends on the port traits defined
//! in `medifetch-core`, so it is composed against fakes in its own
//! tests and against the real adapters at the composition root.

mod dto;
mod log_writer;
mod service;
mod worker;

pub use dto::{CleanupResult, DownloadLogPage, DownloadPage, DownloadStatusView, EnqueueResult, MoveResult, Page};
pub use log_writer::DownloadLogWriter;
pub use service::DownloadService;
pub use worker::{Worker, WorkerState};
