//! `SQLite` repository implementations for medifetch.
//!
//! Confines all `sqlx` usage to this crate. The port traits defined in
//! `medifetch-core` never leak a `SqlitePool` or row type.

#![deny(unsafe_code)]

pub mod cache_decorators;
pub mod repositories;
pub mod setup;

pub use cache_decorators::{CachedDownloadLogRepository, CachedDownloadRepository, CachedMediaRepository};
pub use repositories::{SqliteDownloadLogRepository, SqliteDownloadRepository, SqliteKvCache, SqliteMediaRepository};
pub use setup::setup_database;

#[cfg(any(test, feature = "test-utils"))]
pub use setup::setup_test_database;
