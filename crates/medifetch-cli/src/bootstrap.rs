//! Composition root: the only place concrete adapters are wired together.
//!
//! Command handlers receive the fully-composed [`AppContext`] and never
//! touch a `SqlitePool` or the filesystem directly.

use std::sync::Arc;

use anyhow::Result;

use medifetch_db::{
    setup_database, CachedDownloadLogRepository, CachedDownloadRepository, CachedMediaRepository,
    SqliteDownloadLogRepository, SqliteDownloadRepository, SqliteKvCache, SqliteMediaRepository,
};
use medifetch_extract::{ExtractorDownloadExecutor, ExtractorMetadataExtractor, SysinfoStorageProbe};
use medifetch_http::{HttpContext, SandboxConfig};
use medifetch_worker::{DownloadService, Worker};

use crate::config::RuntimeConfig;

/// Fully composed application: the domain service, the worker loop, and
/// the HTTP surface, all sharing one `Arc<DownloadService>`.
pub struct AppContext {
    pub service: Arc<DownloadService>,
    pub worker: Arc<Worker>,
    pub http: Arc<HttpContext>,
    pub host: String,
    pub port: u16,
}

/// Wire every adapter to its port and assemble the engine.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or the schema
/// cannot be created.
pub async fn bootstrap(config: RuntimeConfig) -> Result<AppContext> {
    tokio::fs::create_dir_all(&config.app.download_temp_dir).await?;
    tokio::fs::create_dir_all(&config.app.download_dest_dir).await?;

    let pool = setup_database(&config.database_path).await?;

    let cache: Arc<dyn medifetch_core::KvCache> = Arc::new(SqliteKvCache::new(pool.clone()));

    let downloads: Arc<dyn medifetch_core::DownloadRepository> = Arc::new(CachedDownloadRepository::new(
        Arc::new(SqliteDownloadRepository::new(pool.clone())),
        Arc::clone(&cache),
    ));
    let media: Arc<dyn medifetch_core::MediaRepository> = Arc::new(CachedMediaRepository::new(
        Arc::new(SqliteMediaRepository::new(pool.clone())),
        Arc::clone(&cache),
    ));
    let download_logs: Arc<dyn medifetch_core::DownloadLogRepository> = Arc::new(CachedDownloadLogRepository::new(
        Arc::new(SqliteDownloadLogRepository::new(pool)),
        cache,
    ));

    let extractor = Arc::new(ExtractorMetadataExtractor::new(config.extractor_bin.clone()));
    let executor = Arc::new(ExtractorDownloadExecutor::new(
        config.extractor_bin.clone(),
        config.app.download_temp_dir.clone(),
    ));
    let storage = Arc::new(SysinfoStorageProbe);

    let service = Arc::new(DownloadService::new(
        config.app.clone(),
        downloads,
        media,
        download_logs,
        extractor,
        executor,
        storage,
    ));

    let worker = Arc::new(Worker::new(config.app, Arc::clone(&service)));

    let http = Arc::new(HttpContext {
        service: Arc::clone(&service),
        worker: Arc::clone(&worker),
        sandbox: SandboxConfig {
            extractor_bin: config.extractor_bin,
        },
    });

    Ok(AppContext {
        service,
        worker,
        http,
        host: config.host,
        port: config.port,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bootstrap_wires_a_fresh_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = RuntimeConfig {
            database_path: dir.path().join("medifetch.db"),
            app: medifetch_core::AppConfig {
                download_temp_dir: dir.path().join("tmp").to_string_lossy().to_string(),
                download_dest_dir: dir.path().join("dest").to_string_lossy().to_string(),
                ..medifetch_core::AppConfig::default()
            },
            ..RuntimeConfig::default()
        };

        let ctx = bootstrap(config).await.unwrap();
        let page = ctx.service.list_downloads(None, 1, 20).await.unwrap();
        assert_eq!(page.total, 0);

        assert!(dir.path().join("tmp").is_dir());
        assert!(dir.path().join("dest").is_dir());
    }
}
