//! Live-process registry for in-flight Extractor subprocesses.
//!
//! Owned by [`crate::ExtractorDownloadExecutor`]. Keyed by OS process id
//! so `cancel()` (possibly invoked from an HTTP handler task) can reach a
//! subprocess whose stderr is being read concurrently on the worker's
//! task. The registry itself never
//! owns the `Child` handle -- it hands out a [`CancellationToken`] that
//! the task driving the subprocess selects on alongside the process's
//! own exit, so killing never has to contend with whoever is awaiting
//! the child.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

#[derive(Clone, Default)]
pub struct ProcessRegistry {
    inner: Arc<Mutex<HashMap<u32, CancellationToken>>>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `pid` and return the token the owning task should select
    /// on. Safe under concurrent registration and removal.
    pub async fn register(&self, pid: u32) -> CancellationToken {
        let token = CancellationToken::new();
        self.inner.lock().await.insert(pid, token.clone());
        token
    }

    pub async fn remove(&self, pid: u32) {
        self.inner.lock().await.remove(&pid);
    }

    /// Signal cancellation for `pid`, if still registered. Returns `true`
    /// if an entry was found.
    pub async fn cancel(&self, pid: u32) -> bool {
        if let Some(token) = self.inner.lock().await.get(&pid) {
            token.cancel();
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancel_on_unknown_pid_is_a_noop() {
        let registry = ProcessRegistry::new();
        assert!(!registry.cancel(999_999).await);
    }

    #[tokio::test]
    async fn register_then_cancel_fires_token() {
        let registry = ProcessRegistry::new();
        let token = registry.register(42).await;
        assert!(registry.cancel(42).await);
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn remove_then_cancel_is_a_noop() {
        let registry = ProcessRegistry::new();
        let token = registry.register(42).await;
        registry.remove(42).await;
        assert!(!registry.cancel(42).await);
        assert!(!token.is_cancelled());
    }
}
