//! Download executor (C6): spawn the Extractor in fetch mode, stream
//! progress, and support cancellation.

use std::process::Stdio;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use medifetch_core::{
    AppError, DownloadExecutor, ExecuteOutcome, ProcessIdCallback, ProgressCallback, Provider,
};

use crate::argv::download_args;
use crate::process_registry::ProcessRegistry;

fn percent_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[download\]\s+(\d+(?:\.\d+)?)%").expect("valid regex"))
}

/// Number of trailing stderr lines kept for a failure message.
const STDERR_TAIL_LINES: usize = 20;

/// [`DownloadExecutor`] that drives a real Extractor binary.
pub struct ExtractorDownloadExecutor {
    extractor_bin: String,
    output_dir: String,
    registry: ProcessRegistry,
}

impl ExtractorDownloadExecutor {
    #[must_use]
    pub fn new(extractor_bin: impl Into<String>, output_dir: impl Into<String>) -> Self {
        Self {
            extractor_bin: extractor_bin.into(),
            output_dir: output_dir.into(),
            registry: ProcessRegistry::new(),
        }
    }
}

#[async_trait]
impl DownloadExecutor for ExtractorDownloadExecutor {
    async fn execute(
        &self,
        url: &str,
        provider: Provider,
        on_progress: ProgressCallback,
        on_process_id: ProcessIdCallback,
    ) -> Result<ExecuteOutcome, AppError> {
        let args = download_args(url, provider, &self.output_dir);

        let mut child = Command::new(&self.extractor_bin)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AppError::internal(format!("download_failed: spawn error: {e}")))?;

        let process_id = child.id().ok_or_else(|| {
            AppError::internal("download_failed: process exited before pid was observable")
        })?;

        // Surface the pid before stderr is read so a concurrent cancel
        // has something to act on even while this download is starting.
        on_process_id(process_id);
        let cancel_token = self.registry.register(process_id).await;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| AppError::internal("download_failed: missing stderr pipe"))?;
        let mut lines = BufReader::new(stderr).lines();
        let mut tail: Vec<String> = Vec::new();
        let mut last_emitted = -1i32;
        let mut was_cancelled = false;

        loop {
            tokio::select! {
                () = cancel_token.cancelled() => {
                    let _ = child.kill().await;
                    was_cancelled = true;
                    break;
                }
                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => {
                            if tail.len() >= STDERR_TAIL_LINES {
                                tail.remove(0);
                            }
                            tail.push(line.clone());

                            if let Some(caps) = percent_re().captures(&line) {
                                if let Ok(pct) = caps[1].parse::<f64>() {
                                    #[allow(clippy::cast_possible_truncation)]
                                    let clamped = pct.floor().clamp(0.0, 99.0) as i32;
                                    if clamped != last_emitted {
                                        last_emitted = clamped;
                                        on_progress(clamped);
                                    }
                                }
                            }
                        }
                        Ok(None) => break,
                        Err(e) => {
                            tail.push(format!("<stderr read error: {e}>"));
                            break;
                        }
                    }
                }
            }
        }

        let status = if was_cancelled {
            None
        } else {
            tokio::select! {
                () = cancel_token.cancelled() => {
                    let _ = child.kill().await;
                    was_cancelled = true;
                    None
                }
                status = child.wait() => Some(status.map_err(|e| {
                    AppError::internal(format!("download_failed: wait error: {e}"))
                })?),
            }
        };

        self.registry.remove(process_id).await;

        match status {
            Some(status) if status.success() => {
                on_progress(100);
                Ok(ExecuteOutcome {
                    file_path: self.output_dir.clone(),
                    process_id,
                })
            }
            Some(status) => Err(AppError::internal(format!(
                "download_failed: exit code {:?}, stderr tail: {}",
                status.code(),
                tail.join(" | ")
            ))),
            None => Err(AppError::internal(format!(
                "download_failed: cancelled, stderr tail: {}",
                tail.join(" | ")
            ))),
        }
    }

    async fn cancel(&self, process_id: u32) -> Result<(), AppError> {
        self.registry.cancel(process_id).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_regex_matches_download_lines() {
        let caps = percent_re()
            .captures("[download]  42.5% of 3.21MiB at 1.2MiB/s")
            .unwrap();
        assert_eq!(&caps[1], "42.5");
    }

    #[test]
    fn percent_regex_ignores_unrelated_lines() {
        assert!(percent_re()
            .captures("[ExtractAudio] Destination: foo.mp3")
            .is_none());
    }

    #[tokio::test]
    async fn execute_reports_completion_against_a_stub_binary() {
        // `true` on unix exits 0 immediately with no stderr output.
        let executor = ExtractorDownloadExecutor::new("true", "/tmp");
        let progress = std::sync::Arc::new(std::sync::Mutex::new(Vec::<i32>::new()));
        let progress_clone = progress.clone();
        let on_progress: ProgressCallback =
            std::sync::Arc::new(move |p| progress_clone.lock().unwrap().push(p));
        let pid_seen = std::sync::Arc::new(std::sync::Mutex::new(None));
        let pid_clone = pid_seen.clone();
        let on_pid: ProcessIdCallback = std::sync::Arc::new(move |pid| *pid_clone.lock().unwrap() = Some(pid));

        let outcome = executor
            .execute("https://hosta.tld/track/x", Provider::A, on_progress, on_pid)
            .await
            .unwrap();

        assert!(pid_seen.lock().unwrap().is_some());
        assert_eq!(outcome.file_path, "/tmp");
        assert_eq!(*progress.lock().unwrap(), vec![100]);
    }

    #[tokio::test]
    async fn execute_fails_on_nonzero_exit() {
        // `false` on unix exits 1 immediately.
        let executor = ExtractorDownloadExecutor::new("false", "/tmp");
        let on_progress: ProgressCallback = std::sync::Arc::new(|_| {});
        let on_pid: ProcessIdCallback = std::sync::Arc::new(|_| {});

        let err = executor
            .execute("https://hosta.tld/track/x", Provider::A, on_progress, on_pid)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "internal");
    }
}
