//! Extractor subprocess driver.
//!
//! Implements the three ports that talk to the outside world on behalf
//! of the download engine: [`medifetch_core::StorageProbe`] (C4),
//! [`medifetch_core::MetadataExtractor`] (C5), and
//! [`medifetch_core::DownloadExecutor`] (C6). No persistence lives here;
//! this crate only spawns processes, parses their output, and reports
//! bytes free on disk.

mod argv;
mod download_executor;
mod metadata_extractor;
mod process_registry;
mod storage_probe;

pub use download_executor::ExtractorDownloadExecutor;
pub use metadata_extractor::ExtractorMetadataExtractor;
pub use storage_probe::SysinfoStorageProbe;
