//! Typed application configuration.
//!
//! Loaded from environment variables at the composition root
//! (`medifetch-cli::bootstrap`); this struct only describes the shape and
//! defaults, it does not read the environment itself.

use std::time::Duration;

/// All tunables the engine needs.
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    /// Directory downloads are written to while in progress.
    pub download_temp_dir: String,
    /// Directory completed downloads are moved to on request.
    pub download_dest_dir: String,
    /// Minimum free space required on `download_temp_dir`, in GB.
    pub min_storage_gb: f64,
    /// Admission cap on concurrently `pending` downloads.
    pub max_pending_downloads: u32,
    /// Age (days) after which completed/failed downloads are purged.
    pub cleanup_retention_days: u32,
    /// Age (days) after which `DownloadLog` rows are purged.
    pub log_retention_days: u32,
    /// Age (minutes) after which an `in_progress` download is considered
    /// stalled.
    pub download_timeout_minutes: u32,
    /// Worker main-loop poll interval when the queue is empty.
    pub poll_interval: Duration,
    /// Interval between stalled-download sweeps.
    pub stalled_check_interval: Duration,
    /// Interval between orphan/log cleanup sweeps.
    pub cleanup_interval: Duration,
    /// Minimum percentage-point delta before a `download:progress` log
    /// row is appended.
    pub progress_log_threshold: i32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            download_temp_dir: "./data/tmp".to_string(),
            download_dest_dir: "./data/dest".to_string(),
            min_storage_gb: 5.0,
            max_pending_downloads: 10,
            cleanup_retention_days: 7,
            log_retention_days: 90,
            download_timeout_minutes: 60,
            poll_interval: Duration::from_millis(2_000),
            stalled_check_interval: Duration::from_millis(300_000),
            cleanup_interval: Duration::from_secs(7 * 24 * 60 * 60),
            progress_log_threshold: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.min_storage_gb, 5.0);
        assert_eq!(cfg.max_pending_downloads, 10);
        assert_eq!(cfg.cleanup_retention_days, 7);
        assert_eq!(cfg.log_retention_days, 90);
        assert_eq!(cfg.download_timeout_minutes, 60);
        assert_eq!(cfg.poll_interval, Duration::from_secs(2));
        assert_eq!(cfg.stalled_check_interval, Duration::from_secs(300));
        assert_eq!(cfg.cleanup_interval, Duration::from_secs(604_800));
        assert_eq!(cfg.progress_log_threshold, 5);
    }
}
