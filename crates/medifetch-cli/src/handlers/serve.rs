//! `serve` command: runs the HTTP surface and the worker loop together,
//! shutting both down gracefully on SIGTERM/SIGINT.

use std::time::Duration;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::bootstrap::AppContext;

/// Upper bound on how long the worker loop gets to wind down after a
/// shutdown signal before we give up and exit anyway.
const WORKER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

pub async fn execute(ctx: AppContext) -> Result<()> {
    let AppContext {
        service: _service,
        worker,
        http,
        host,
        port,
    } = ctx;

    let router = medifetch_http::create_router(http);

    let worker_for_loop = worker.clone();
    let worker_task = tokio::spawn(async move { worker_for_loop.run().await });

    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "medifetch listening");

    let worker_for_shutdown = worker.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    worker_for_shutdown.shutdown();
    match tokio::time::timeout(WORKER_SHUTDOWN_TIMEOUT, worker_task).await {
        Ok(Ok(())) => info!("worker loop stopped cleanly"),
        Ok(Err(e)) => warn!(error = %e, "worker loop task panicked"),
        Err(_) => warn!("worker loop did not stop within the shutdown timeout; exiting anyway"),
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
