//! Worker main loop (C10): single-consumer polling loop over pending
//! downloads, plus two independent periodic schedulers for cleanup and
//! stalled-download detection.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use medifetch_core::{AppConfig, DownloadId};

use crate::service::DownloadService;

/// Snapshot of the worker's run state, safe to read from any task.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkerState {
    pub is_running: bool,
    pub current_download_id: Option<DownloadId>,
    pub last_processed_at: Option<DateTime<Utc>>,
    pub processed_count: u64,
    pub error_count: u64,
}

/// Atomic-backed state shared between the main loop and observers.
struct SharedState {
    is_running: AtomicBool,
    current_download_id: AtomicI64,
    last_processed_at_unix_ms: AtomicI64,
    processed_count: AtomicU64,
    error_count: AtomicU64,
}

impl SharedState {
    fn new() -> Self {
        Self {
            is_running: AtomicBool::new(false),
            current_download_id: AtomicI64::new(0),
            last_processed_at_unix_ms: AtomicI64::new(0),
            processed_count: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
        }
    }

    fn snapshot(&self) -> WorkerState {
        let raw_id = self.current_download_id.load(Ordering::SeqCst);
        let raw_ts = self.last_processed_at_unix_ms.load(Ordering::SeqCst);
        WorkerState {
            is_running: self.is_running.load(Ordering::SeqCst),
            current_download_id: if raw_id == 0 { None } else { Some(DownloadId(raw_id)) },
            last_processed_at: if raw_ts == 0 {
                None
            } else {
                DateTime::from_timestamp_millis(raw_ts)
            },
            processed_count: self.processed_count.load(Ordering::SeqCst),
            error_count: self.error_count.load(Ordering::SeqCst),
        }
    }
}

/// Drives the download queue and the cleanup/stalled schedulers.
///
/// Each of the three loops (main, cleanup, stalled-check) is an
/// independent `tokio::select!` racing a timer against the shared
/// `CancellationToken`, so `shutdown` stops all three without needing a
/// join handle for each.
pub struct Worker {
    config: AppConfig,
    service: Arc<DownloadService>,
    state: Arc<SharedState>,
    cancel_token: CancellationToken,
}

impl Worker {
    #[must_use]
    pub fn new(config: AppConfig, service: Arc<DownloadService>) -> Self {
        Self {
            config,
            service,
            state: Arc::new(SharedState::new()),
            cancel_token: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> WorkerState {
        self.state.snapshot()
    }

    /// Signal every loop to stop after its current unit of work.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }

    /// Run the main queue loop and both schedulers concurrently. Returns
    /// once all three have observed cancellation. Each scheduler runs
    /// once immediately, then on its configured interval.
    pub async fn run(&self) {
        self.state.is_running.store(true, Ordering::SeqCst);

        let main_loop = self.run_main_loop();
        let cleanup_loop = self.run_cleanup_scheduler();
        let stalled_loop = self.run_stalled_scheduler();

        tokio::join!(main_loop, cleanup_loop, stalled_loop);

        self.state.is_running.store(false, Ordering::SeqCst);
    }

    async fn run_main_loop(&self) {
        loop {
            if self.cancel_token.is_cancelled() {
                return;
            }

            let outcome = self.run_one_cycle().await;

            let sleep_for = match outcome {
                CycleOutcome::QueueEmpty => self.config.poll_interval,
                CycleOutcome::Processed => std::time::Duration::from_secs(1),
                CycleOutcome::Error => std::time::Duration::from_secs(5),
            };

            tokio::select! {
                () = self.cancel_token.cancelled() => return,
                () = tokio::time::sleep(sleep_for) => {}
            }
        }
    }

    async fn run_one_cycle(&self) -> CycleOutcome {
        let next = match self.service.find_next_pending().await {
            Ok(next) => next,
            Err(err) => {
                error!(%err, "worker: failed to poll for next pending download");
                self.state.error_count.fetch_add(1, Ordering::SeqCst);
                return CycleOutcome::Error;
            }
        };

        let Some(download_id) = next else {
            return CycleOutcome::QueueEmpty;
        };

        self.state
            .current_download_id
            .store(download_id.0, Ordering::SeqCst);

        let result = self.service.process_download(download_id).await;

        self.state.current_download_id.store(0, Ordering::SeqCst);
        self.state
            .last_processed_at_unix_ms
            .store(Utc::now().timestamp_millis(), Ordering::SeqCst);

        match result {
            Ok(()) => {
                self.state.processed_count.fetch_add(1, Ordering::SeqCst);
                CycleOutcome::Processed
            }
            Err(err) => {
                warn!(%download_id, %err, "worker: download failed");
                self.state.error_count.fetch_add(1, Ordering::SeqCst);
                CycleOutcome::Processed
            }
        }
    }

    async fn run_cleanup_scheduler(&self) {
        let mut ticker = interval(self.config.cleanup_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => return,
                _ = ticker.tick() => {
                    self.run_cleanup_sweep().await;
                }
            }
        }
    }

    async fn run_cleanup_sweep(&self) {
        match self
            .service
            .cleanup_orphaned_files(self.config.cleanup_retention_days)
            .await
        {
            Ok(result) => info!(
                downloads_deleted = result.downloads_deleted,
                media_deleted = result.media_deleted,
                files_deleted = result.files_deleted,
                "worker: cleanup sweep complete"
            ),
            Err(err) => error!(%err, "worker: cleanup sweep failed"),
        }

        match self
            .service
            .cleanup_old_logs(self.config.log_retention_days)
            .await
        {
            Ok(deleted) => info!(deleted, "worker: log retention sweep complete"),
            Err(err) => error!(%err, "worker: log retention sweep failed"),
        }
    }

    async fn run_stalled_scheduler(&self) {
        let mut ticker = interval(self.config.stalled_check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => return,
                _ = ticker.tick() => {
                    match self
                        .service
                        .mark_stalled_downloads(self.config.download_timeout_minutes)
                        .await
                    {
                        Ok(marked) => {
                            if marked > 0 {
                                warn!(marked, "worker: marked stalled downloads as failed");
                            }
                        }
                        Err(err) => error!(%err, "worker: stalled-download sweep failed"),
                    }
                }
            }
        }
    }
}

enum CycleOutcome {
    QueueEmpty,
    Processed,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_is_idle() {
        let state = SharedState::new();
        let snap = state.snapshot();
        assert!(!snap.is_running);
        assert_eq!(snap.current_download_id, None);
        assert_eq!(snap.last_processed_at, None);
        assert_eq!(snap.processed_count, 0);
        assert_eq!(snap.error_count, 0);
    }

    #[test]
    fn snapshot_reflects_current_download() {
        let state = SharedState::new();
        state.current_download_id.store(42, Ordering::SeqCst);
        state.processed_count.store(3, Ordering::SeqCst);
        let snap = state.snapshot();
        assert_eq!(snap.current_download_id, Some(DownloadId(42)));
        assert_eq!(snap.processed_count, 3);
    }
}
