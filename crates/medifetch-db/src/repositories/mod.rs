//! `SQLite` implementations of the core repository ports.
//!
//! These encapsulate all SQL queries and database access. `SqlitePool` is
//! confined to this module and never exposed through the port trait
//! signatures.

mod row_mappers;
mod sqlite_download_log_repository;
mod sqlite_download_repository;
mod sqlite_kv_cache;
mod sqlite_media_repository;

pub use sqlite_download_log_repository::SqliteDownloadLogRepository;
pub use sqlite_download_repository::SqliteDownloadRepository;
pub use sqlite_kv_cache::SqliteKvCache;
pub use sqlite_media_repository::SqliteMediaRepository;
