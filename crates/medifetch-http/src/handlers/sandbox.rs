//! `/api/sandbox` pass-through: runs the Extractor directly with
//! caller-supplied arguments, bypassing the download queue entirely.
//! A debugging surface only -- out of the core engine's scope, included
//! because the contract documents it.

use std::convert::Infallible;
use std::process::Stdio;
use std::sync::OnceLock;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::Json;
use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::dto::{SandboxRequest, SandboxResponse, SandboxStreamEvent};
use crate::error::HttpError;
use crate::state::AppState;
use medifetch_core::AppError;

fn percent_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[download\]\s+(\d+(?:\.\d+)?)%").expect("valid regex"))
}

pub async fn yt_dlp(
    State(state): State<AppState>,
    Json(req): Json<SandboxRequest>,
) -> Result<Json<SandboxResponse>, HttpError> {
    let output = Command::new(&state.sandbox.extractor_bin)
        .args(&req.args)
        .output()
        .await
        .map_err(|e| AppError::internal(format!("sandbox: failed to spawn extractor: {e}")))?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    let is_json_output = serde_json::from_str::<serde_json::Value>(stdout.trim()).is_ok();

    Ok(Json(SandboxResponse {
        stdout,
        stderr,
        exit_code: output.status.code(),
        is_json_output,
    }))
}

/// Streaming sibling of [`yt_dlp`]: delivers `start|stdout|stderr|
/// progress|complete|error` events over a server-push stream as the
/// Extractor runs, instead of buffering everything until exit.
pub async fn yt_dlp_stream(
    State(state): State<AppState>,
    Json(req): Json<SandboxRequest>,
) -> impl IntoResponse {
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(64);

    let extractor_bin = state.sandbox.extractor_bin.clone();
    tokio::spawn(async move {
        run_and_stream(&extractor_bin, &req.args, &tx).await;
    });

    Sse::new(ReceiverStream::new(rx)).keep_alive(KeepAlive::default())
}

async fn send_event(tx: &mpsc::Sender<Result<Event, Infallible>>, event: SandboxStreamEvent) {
    let sse_event = Event::default().json_data(&event).unwrap_or_else(|_| Event::default());
    let _ = tx.send(Ok(sse_event)).await;
}

async fn run_and_stream(extractor_bin: &str, args: &[String], tx: &mpsc::Sender<Result<Event, Infallible>>) {
    send_event(tx, SandboxStreamEvent::Start).await;

    let mut child = match Command::new(extractor_bin)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            send_event(
                tx,
                SandboxStreamEvent::Error {
                    message: format!("failed to spawn extractor: {e}"),
                },
            )
            .await;
            return;
        }
    };

    let stdout = child.stdout.take().expect("piped stdout");
    let stderr = child.stderr.take().expect("piped stderr");
    let mut stdout_lines = BufReader::new(stdout).lines();
    let mut stderr_lines = BufReader::new(stderr).lines();
    let (mut stdout_done, mut stderr_done) = (false, false);

    while !stdout_done || !stderr_done {
        tokio::select! {
            line = stdout_lines.next_line(), if !stdout_done => {
                match line {
                    Ok(Some(line)) => {
                        send_event(tx, SandboxStreamEvent::Stdout { line }).await;
                    }
                    _ => stdout_done = true,
                }
            }
            line = stderr_lines.next_line(), if !stderr_done => {
                match line {
                    Ok(Some(line)) => {
                        if let Some(captures) = percent_re().captures(&line) {
                            if let Ok(percent) = captures[1].parse::<f64>() {
                                send_event(tx, SandboxStreamEvent::Progress { percent }).await;
                            }
                        }
                        send_event(tx, SandboxStreamEvent::Stderr { line }).await;
                    }
                    _ => stderr_done = true,
                }
            }
        }
    }

    let status = child.wait().await.ok();
    send_event(
        tx,
        SandboxStreamEvent::Complete {
            exit_code: status.and_then(|s| s.code()),
        },
    )
    .await;
}
