//! Disk-usage bounds: keep the newest N outputs, expire stale workspaces.
//!
//! Both passes are best-effort. Any failure is logged and the pass moves on;
//! nothing here ever fails a job.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use cf_core::config::RetentionConfig;
use serde::Serialize;

use crate::store::OutputStore;

/// Retention knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub max_outputs: usize,
    pub workspace_max_age: Duration,
}

impl From<&RetentionConfig> for RetentionPolicy {
    fn from(config: &RetentionConfig) -> Self {
        Self {
            max_outputs: config.max_outputs,
            workspace_max_age: config.workspace_max_age(),
        }
    }
}

/// What one retention pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct RetentionReport {
    pub outputs_kept: usize,
    pub outputs_removed: usize,
    pub workspaces_removed: usize,
}

/// Applies a [`RetentionPolicy`] to an output store and a scratch root.
pub struct RetentionManager {
    store: Arc<dyn OutputStore>,
    scratch_root: PathBuf,
    policy: RetentionPolicy,
}

impl RetentionManager {
    pub fn new(
        store: Arc<dyn OutputStore>,
        scratch_root: impl Into<PathBuf>,
        policy: RetentionPolicy,
    ) -> Self {
        Self {
            store,
            scratch_root: scratch_root.into(),
            policy,
        }
    }

    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    /// Pass run before a job starts: leaves room for the output the job is
    /// about to write, so the store holds at most `max_outputs` afterwards.
    pub async fn prepare_for_new_output(&self) -> RetentionReport {
        self.run(1).await
    }

    /// Standalone pass: keep exactly the newest `max_outputs`.
    pub async fn force_pass(&self) -> RetentionReport {
        self.run(0).await
    }

    async fn run(&self, reserve: usize) -> RetentionReport {
        let keep = self.policy.max_outputs.saturating_sub(reserve);
        let (outputs_kept, outputs_removed) = self.prune_outputs(keep).await;
        let workspaces_removed = self.expire_workspaces(SystemTime::now()).await;

        let report = RetentionReport {
            outputs_kept,
            outputs_removed,
            workspaces_removed,
        };
        if report.outputs_removed > 0 || report.workspaces_removed > 0 {
            tracing::info!(
                outputs_removed = report.outputs_removed,
                workspaces_removed = report.workspaces_removed,
                "Retention pass"
            );
        }
        report
    }

    /// Delete all but the `keep` most recently modified outputs. Returns
    /// `(kept, removed)`.
    pub async fn prune_outputs(&self, keep: usize) -> (usize, usize) {
        let mut artifacts = match self.store.list().await {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!("Retention: failed to list outputs: {e}");
                return (0, 0);
            }
        };

        // Newest first; ties broken by name so the order is total.
        artifacts.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| b.filename.cmp(&a.filename))
        });

        let mut removed = 0;
        let kept = artifacts.len().min(keep);
        for stale in artifacts.iter().skip(keep) {
            match self.store.remove(&stale.filename).await {
                Ok(()) => {
                    tracing::debug!("Retention: removed output {}", stale.filename);
                    removed += 1;
                }
                Err(e) => tracing::warn!("Retention: failed to remove {}: {e}", stale.filename),
            }
        }
        (kept, removed)
    }

    /// Remove every entry under the scratch root whose modification time is
    /// older than the policy's workspace age relative to `now`.
    pub async fn expire_workspaces(&self, now: SystemTime) -> usize {
        let mut entries = match tokio::fs::read_dir(&self.scratch_root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return 0,
            Err(e) => {
                tracing::warn!(
                    "Retention: failed to read scratch root {}: {e}",
                    self.scratch_root.display()
                );
                return 0;
            }
        };

        let mut removed = 0;
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Retention: scratch listing interrupted: {e}");
                    break;
                }
            };

            let Ok(meta) = entry.metadata().await else {
                continue;
            };
            let Ok(modified) = meta.modified() else {
                continue;
            };
            let age = now.duration_since(modified).unwrap_or_default();
            if age <= self.policy.workspace_max_age {
                continue;
            }

            let path = entry.path();
            let result = if meta.is_dir() {
                tokio::fs::remove_dir_all(&path).await
            } else {
                tokio::fs::remove_file(&path).await
            };
            match result {
                Ok(()) => {
                    tracing::debug!("Retention: expired workspace {}", path.display());
                    removed += 1;
                }
                Err(e) => tracing::warn!(
                    "Retention: failed to expire {}: {e}",
                    path.display()
                ),
            }
        }
        removed
    }
}
