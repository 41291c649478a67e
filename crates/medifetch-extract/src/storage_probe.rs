//! Storage probe (C4): query free space on a filesystem path.

use async_trait::async_trait;
use std::path::Path;
use sysinfo::Disks;

use medifetch_core::{AppError, StorageProbe};

/// [`StorageProbe`] backed by `sysinfo`'s disk listing.
///
/// Matches `path` against the mounted disk with the longest mount-point
/// prefix, mirroring how `df` resolves a path to its containing
/// filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct SysinfoStorageProbe;

impl SysinfoStorageProbe {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StorageProbe for SysinfoStorageProbe {
    async fn available_bytes(&self, path: &str) -> Result<u64, AppError> {
        let path = path.to_string();
        tokio::task::spawn_blocking(move || available_bytes_blocking(&path))
            .await
            .map_err(|e| AppError::internal(format!("storage_probe_failed: join error: {e}")))?
    }
}

fn available_bytes_blocking(path: &str) -> Result<u64, AppError> {
    let target = std::fs::canonicalize(path).unwrap_or_else(|_| Path::new(path).to_path_buf());
    let disks = Disks::new_with_refreshed_list();

    let best = disks
        .iter()
        .filter(|d| target.starts_with(d.mount_point()))
        .max_by_key(|d| d.mount_point().as_os_str().len());

    match best {
        Some(disk) => Ok(disk.available_space()),
        None => Err(AppError::internal(format!(
            "storage_probe_failed: no mounted filesystem matches {}",
            target.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn available_bytes_resolves_root() {
        let probe = SysinfoStorageProbe::new();
        let bytes = probe.available_bytes("/").await.unwrap();
        assert!(bytes > 0);
    }

    #[tokio::test]
    async fn has_at_least_is_consistent_with_available_bytes() {
        let probe = SysinfoStorageProbe::new();
        let bytes = probe.available_bytes("/").await.unwrap();
        #[allow(clippy::cast_precision_loss)]
        let available_gb = bytes as f64 / 1_000_000_000.0;
        assert!(probe.has_at_least("/", available_gb - 1.0).await.unwrap());
        assert!(!probe.has_at_least("/", available_gb + 1_000_000.0).await.unwrap());
    }
}
