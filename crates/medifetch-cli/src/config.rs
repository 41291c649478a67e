//! Environment-variable loading into the typed [`medifetch_core::AppConfig`].
//!
//! This module only parses; [`crate::bootstrap`] is the one place that
//! actually reads `std::env`.

use std::path::PathBuf;
use std::time::Duration;

use medifetch_core::AppConfig;

/// Paths and network settings that sit alongside [`AppConfig`] but are
/// not part of the domain's tunables (the engine doesn't know about
/// HTTP ports or database files).
#[derive(Clone, Debug, PartialEq)]
pub struct RuntimeConfig {
    pub database_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub extractor_bin: String,
    pub app: AppConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("./data/medifetch.db"),
            host: "127.0.0.1".to_string(),
            port: 8080,
            extractor_bin: "yt-dlp".to_string(),
            app: AppConfig::default(),
        }
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Read every tunable from the environment, falling back to
/// [`RuntimeConfig::default`] for anything unset or unparsable.
#[must_use]
pub fn load() -> RuntimeConfig {
    let defaults = RuntimeConfig::default();
    let app_defaults = AppConfig::default();

    RuntimeConfig {
        database_path: PathBuf::from(env_string(
            "MEDIFETCH_DATABASE_PATH",
            &defaults.database_path.to_string_lossy(),
        )),
        host: env_string("MEDIFETCH_HOST", &defaults.host),
        port: env_parsed("MEDIFETCH_PORT", defaults.port),
        extractor_bin: env_string("MEDIFETCH_EXTRACTOR_BIN", &defaults.extractor_bin),
        app: AppConfig {
            download_temp_dir: env_string("MEDIFETCH_DOWNLOAD_TEMP_DIR", &app_defaults.download_temp_dir),
            download_dest_dir: env_string("MEDIFETCH_DOWNLOAD_DEST_DIR", &app_defaults.download_dest_dir),
            min_storage_gb: env_parsed("MEDIFETCH_MIN_STORAGE_GB", app_defaults.min_storage_gb),
            max_pending_downloads: env_parsed(
                "MEDIFETCH_MAX_PENDING_DOWNLOADS",
                app_defaults.max_pending_downloads,
            ),
            cleanup_retention_days: env_parsed(
                "MEDIFETCH_CLEANUP_RETENTION_DAYS",
                app_defaults.cleanup_retention_days,
            ),
            log_retention_days: env_parsed("MEDIFETCH_LOG_RETENTION_DAYS", app_defaults.log_retention_days),
            download_timeout_minutes: env_parsed(
                "MEDIFETCH_DOWNLOAD_TIMEOUT_MINUTES",
                app_defaults.download_timeout_minutes,
            ),
            poll_interval: Duration::from_millis(env_parsed(
                "MEDIFETCH_POLL_INTERVAL_MS",
                app_defaults.poll_interval.as_millis() as u64,
            )),
            stalled_check_interval: Duration::from_millis(env_parsed(
                "MEDIFETCH_STALLED_CHECK_INTERVAL_MS",
                app_defaults.stalled_check_interval.as_millis() as u64,
            )),
            cleanup_interval: Duration::from_secs(env_parsed(
                "MEDIFETCH_CLEANUP_INTERVAL_SECS",
                app_defaults.cleanup_interval.as_secs(),
            )),
            progress_log_threshold: env_parsed(
                "MEDIFETCH_PROGRESS_LOG_THRESHOLD",
                app_defaults.progress_log_threshold,
            ),
        },
    }
}
