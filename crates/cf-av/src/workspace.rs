//! Per-job scratch directories.
//!
//! A [`WorkspaceManager`] hands out one [`Workspace`] per job under a shared
//! scratch root. Names combine the job id with a random suffix, so two
//! acquisitions never share a directory. [`WorkspaceManager::release`] removes
//! the directory and only logs failures; a `Workspace` dropped without being
//! released (panic, cancelled request) still removes its directory on drop.

use std::path::{Path, PathBuf};

use cf_core::JobId;
use tempfile::TempDir;

/// A job-private scratch directory.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
    job_id: JobId,
}

impl Workspace {
    /// Path to the workspace directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Create a path for a named file inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// The job this workspace belongs to.
    pub fn job_id(&self) -> JobId {
        self.job_id
    }
}

/// Allocates and reclaims [`Workspace`]s under a scratch root.
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    root: PathBuf,
}

impl WorkspaceManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding every workspace.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a fresh, uniquely named workspace for `job_id`.
    ///
    /// # Errors
    ///
    /// Returns [`cf_core::Error::Internal`] if the scratch root or the
    /// workspace directory cannot be created.
    pub async fn acquire(&self, job_id: JobId) -> cf_core::Result<Workspace> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            cf_core::Error::Internal(format!(
                "failed to create scratch root {}: {e}",
                self.root.display()
            ))
        })?;

        let dir = tempfile::Builder::new()
            .prefix(&format!("{}-", job_id.simple()))
            .tempdir_in(&self.root)
            .map_err(|e| {
                cf_core::Error::Internal(format!("failed to create workspace: {e}"))
            })?;

        tracing::debug!("Acquired workspace {}", dir.path().display());
        Ok(Workspace { dir, job_id })
    }

    /// Recursively remove a workspace. Never fails; problems are logged.
    pub async fn release(&self, workspace: Workspace) {
        let path = workspace.path().to_path_buf();
        let job_id = workspace.job_id;

        match tokio::task::spawn_blocking(move || workspace.dir.close()).await {
            Ok(Ok(())) => tracing::debug!("Released workspace {}", path.display()),
            Ok(Err(e)) => tracing::warn!(
                job_id = %job_id,
                "Failed to remove workspace {}: {e}",
                path.display()
            ),
            Err(e) => tracing::warn!(
                job_id = %job_id,
                "Workspace removal task failed for {}: {e}",
                path.display()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn acquire_creates_unique_dirs_under_root() {
        let root = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(root.path().join("tmp"));

        let id = JobId::new();
        let a = manager.acquire(id).await.unwrap();
        let b = manager.acquire(id).await.unwrap();

        assert_ne!(a.path(), b.path());
        assert!(a.path().starts_with(manager.root()));
        assert!(a.path().is_dir());
        let name = a.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(&id.simple()), "{name}");
        assert_eq!(a.job_id(), id);
    }

    #[tokio::test]
    async fn file_paths_live_inside_workspace() {
        let root = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(root.path());
        let ws = manager.acquire(JobId::new()).await.unwrap();
        let f = ws.file("segment_0.mp4");
        assert!(f.starts_with(ws.path()));
        assert_eq!(f.file_name().unwrap(), "segment_0.mp4");
    }

    #[tokio::test]
    async fn release_removes_contents_recursively() {
        let root = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(root.path());
        let ws = manager.acquire(JobId::new()).await.unwrap();
        let path = ws.path().to_path_buf();
        fs::create_dir(path.join("nested")).unwrap();
        fs::write(path.join("nested/segment_0.mp4"), b"data").unwrap();

        manager.release(ws).await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn release_tolerates_already_removed_dir() {
        let root = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(root.path());
        let ws = manager.acquire(JobId::new()).await.unwrap();
        fs::remove_dir_all(ws.path()).unwrap();
        // Must not panic or propagate.
        manager.release(ws).await;
    }

    #[tokio::test]
    async fn dropping_unreleased_workspace_removes_it() {
        let root = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(root.path());
        let ws = manager.acquire(JobId::new()).await.unwrap();
        let path = ws.path().to_path_buf();
        drop(ws);
        assert!(!path.exists());
    }
}
