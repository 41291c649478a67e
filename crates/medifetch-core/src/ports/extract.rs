//! Storage probe (C4), metadata extractor driver (C5), and download
//! executor (C6) ports.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::{Provider, Track};
use crate::errors::AppError;

/// Query free space on a filesystem path (C4).
#[async_trait]
pub trait StorageProbe: Send + Sync {
    /// Bytes free on the filesystem containing `path`. Errors from the
    /// underlying filesystem call are surfaced as `AppError::Internal`
    /// (`storage_probe_failed`).
    async fn available_bytes(&self, path: &str) -> Result<u64, AppError>;

    /// Convenience wrapper: `available_bytes(path) >= gb * 1e9`.
    async fn has_at_least(&self, path: &str, gb: f64) -> Result<bool, AppError> {
        let available = self.available_bytes(path).await?;
        #[allow(clippy::cast_precision_loss)]
        let available_gb = available as f64 / 1_000_000_000.0;
        Ok(available_gb >= gb)
    }
}

/// Partial metadata harvested from the Extractor's probe-mode output.
///
/// All fields except `provider_id` may be absent -- incomplete metadata
/// is tolerated by the `Media` domain type.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaCandidate {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub album_artist: Option<String>,
    pub year: Option<i32>,
    pub cover_url: Option<String>,
    pub duration: Option<u32>,
    pub provider_id: String,
    pub tracks: Option<Vec<Track>>,
}

/// Invoke the Extractor in probe mode and parse its metadata output (C5).
#[async_trait]
pub trait MetadataExtractor: Send + Sync {
    /// Spawns the Extractor with dump-metadata arguments chosen by
    /// `{provider, kind}`, reads stdout to completion, and parses it as a
    /// single JSON document.
    ///
    /// Failure modes (all mapped to `AppError::Internal`, since metadata
    /// failures are always swallowed by callers): extractor exits
    /// non-zero, the output fails to parse as JSON, or the url is
    /// unclassifiable.
    async fn fetch_metadata(
        &self,
        url: &str,
        provider: Provider,
        kind: crate::domain::MediaKind,
    ) -> Result<MediaCandidate, AppError>;
}

/// Called with each throttled progress update as the Extractor reports
/// lines on stderr. `percent` is already clamped to `[0, 99]` during
/// execution; the executor emits a final `100` on success.
pub type ProgressCallback = Arc<dyn Fn(i32) + Send + Sync>;

/// Called exactly once, immediately after the subprocess is spawned and
/// before its stderr is read, so `process_id` is observable mid-run and
/// `cancel` has something to act on even while the download is still
/// streaming progress.
pub type ProcessIdCallback = Arc<dyn Fn(u32) + Send + Sync>;

/// Outcome of a successful [`DownloadExecutor::execute`] call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecuteOutcome {
    pub file_path: String,
    pub process_id: u32,
}

/// Spawn the Extractor in fetch mode, stream progress, and support
/// cancellation (C6).
#[async_trait]
pub trait DownloadExecutor: Send + Sync {
    /// Builds a provider-specific argv (audio extraction, quality,
    /// thumbnail, metadata embedding, output template), spawns the
    /// subprocess, records it in a live-process registry keyed by
    /// `process_id`, and streams throttled progress via `on_progress`.
    ///
    /// `on_process_id` is invoked as soon as the OS process id is known
    /// (immediately post-spawn), before stderr is read.
    ///
    /// On a zero exit, emits `on_progress(100)` and returns
    /// `{file_path, process_id}`. On non-zero exit, fails with
    /// `AppError::Internal` describing the exit code and a tail of
    /// stderr. The registry entry is removed on both paths.
    async fn execute(
        &self,
        url: &str,
        provider: Provider,
        on_progress: ProgressCallback,
        on_process_id: ProcessIdCallback,
    ) -> Result<ExecuteOutcome, AppError>;

    /// Terminate the process identified by `process_id` with a forceful
    /// kill signal. Safe to call concurrently with `execute`'s own
    /// completion path.
    async fn cancel(&self, process_id: u32) -> Result<(), AppError>;
}
