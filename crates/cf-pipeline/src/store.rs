//! Durable store of finished clips.
//!
//! Artifacts are addressed by bare filename. Anything that could escape the
//! store root (separators, `..`, hidden names) is treated as not found rather
//! than rejected loudly, so probing for other files looks like a miss.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Directory-listing view of one stored artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub filename: String,
    pub size: u64,
    pub modified: SystemTime,
}

/// A clip produced by a completed job.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct OutputArtifact {
    pub filename: String,
    #[serde(skip)]
    pub path: PathBuf,
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

/// Storage for finished clips.
#[async_trait]
pub trait OutputStore: Send + Sync {
    /// File extension (without dot) of artifacts in this store.
    fn extension(&self) -> &str;

    /// Absolute path an artifact named `filename` lives at.
    fn path_for(&self, filename: &str) -> cf_core::Result<PathBuf>;

    /// Every artifact currently stored. Order is unspecified.
    async fn list(&self) -> cf_core::Result<Vec<StoredArtifact>>;

    /// Metadata for `filename`, or `None` if it does not exist.
    async fn stat(&self, filename: &str) -> cf_core::Result<Option<StoredArtifact>>;

    /// Delete `filename`. Deleting a missing artifact is not an error.
    async fn remove(&self, filename: &str) -> cf_core::Result<()>;

    /// Open `filename` for reading.
    async fn open(&self, filename: &str) -> cf_core::Result<(tokio::fs::File, StoredArtifact)>;
}

/// [`OutputStore`] backed by a single flat directory.
#[derive(Debug, Clone)]
pub struct FsOutputStore {
    root: PathBuf,
    extension: String,
}

impl FsOutputStore {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the store directory if needed.
    pub async fn ensure_root(&self) -> cf_core::Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    fn has_extension(&self, name: &str) -> bool {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension))
    }
}

fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
        && !name.contains("..")
}

fn not_found(filename: &str) -> cf_core::Error {
    cf_core::Error::not_found("artifact", filename)
}

fn artifact_from(filename: &str, meta: &std::fs::Metadata) -> StoredArtifact {
    StoredArtifact {
        filename: filename.to_string(),
        size: meta.len(),
        modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
    }
}

#[async_trait]
impl OutputStore for FsOutputStore {
    fn extension(&self) -> &str {
        &self.extension
    }

    fn path_for(&self, filename: &str) -> cf_core::Result<PathBuf> {
        if !is_safe_filename(filename) {
            return Err(not_found(filename));
        }
        Ok(self.root.join(filename))
    }

    async fn list(&self) -> cf_core::Result<Vec<StoredArtifact>> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut out = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !is_safe_filename(&name) || !self.has_extension(&name) {
                continue;
            }
            // Entries can disappear between readdir and stat.
            let Ok(meta) = entry.metadata().await else {
                continue;
            };
            if meta.is_file() {
                out.push(artifact_from(&name, &meta));
            }
        }
        Ok(out)
    }

    async fn stat(&self, filename: &str) -> cf_core::Result<Option<StoredArtifact>> {
        let Ok(path) = self.path_for(filename) else {
            return Ok(None);
        };
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(Some(artifact_from(filename, &meta))),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, filename: &str) -> cf_core::Result<()> {
        let path = self.path_for(filename)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn open(&self, filename: &str) -> cf_core::Result<(tokio::fs::File, StoredArtifact)> {
        let artifact = self.stat(filename).await?.ok_or_else(|| not_found(filename))?;
        let file = tokio::fs::File::open(self.path_for(filename)?)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => not_found(filename),
                _ => e.into(),
            })?;
        Ok((file, artifact))
    }
}
