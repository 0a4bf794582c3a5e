//! Per-task scratch directory.

use std::path::{Path, PathBuf};

/// Staging directory owned by a single pipeline run.
///
/// Call [`cleanup`](Self::cleanup) on the normal path. A guard dropped without
/// it (early return, panic) removes the directory synchronously instead.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
    removed: bool,
}

impl ScratchDir {
    /// Create `root/name`, clearing leftovers from an earlier run with the same name
    pub async fn create(root: &Path, name: &str) -> std::io::Result<Self> {
        let path = root.join(name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tokio::fs::remove_dir_all(&path).await?;
        }
        tokio::fs::create_dir_all(&path).await?;
        Ok(Self {
            path,
            removed: false,
        })
    }

    /// Remove the directory and its contents
    pub async fn cleanup(mut self) {
        self.removed = true;
        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => tracing::debug!(path = %self.path.display(), "removed scratch directory"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove scratch directory"
            ),
        }
    }

    /// Directory path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "removed scratch directory"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove scratch directory"
            ),
        }
    }
}
