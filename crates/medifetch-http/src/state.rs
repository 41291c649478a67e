//! Shared application state type.

use std::sync::Arc;

use medifetch_worker::{DownloadService, Worker};

/// Configuration for the sandbox pass-through endpoint: a debugging
/// surface that runs the Extractor directly, bypassing the queue.
#[derive(Clone, Debug)]
pub struct SandboxConfig {
    /// Path to the Extractor binary invoked directly, bypassing the queue.
    pub extractor_bin: String,
}

/// Everything an HTTP handler needs: the use-case facade, a read-only
/// handle to the worker's observability state, and the sandbox's
/// extractor binary path.
pub struct HttpContext {
    pub service: Arc<DownloadService>,
    pub worker: Arc<Worker>,
    pub sandbox: SandboxConfig,
}

/// Application state shared across all handlers.
pub type AppState = Arc<HttpContext>;
