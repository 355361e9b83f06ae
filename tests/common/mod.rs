//! Shared test harness for integration tests.
//!
//! [`TestHarness`] wires a real [`JobPipeline`] (filesystem output store,
//! workspace manager, retention) to fake collaborators that record every call
//! and write small placeholder files instead of running ffmpeg.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use parking_lot::Mutex;

use cf_av::{ConcatList, ToolRegistry, WorkspaceManager};
use cf_core::config::Config;
use cf_core::TimeRange;
use cf_pipeline::{
    Concatenator, FsOutputStore, JobPipeline, MediaFetcher, OutputStore, RetentionPolicy,
    SegmentExtractor, StoredArtifact,
};
use cf_server::context::AppContext;
use cf_server::router::build_router;

// ---------------------------------------------------------------------------
// Fake collaborators
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeFetcher {
    pub calls: Mutex<Vec<String>>,
    /// When set, every fetch fails; the message includes the destination dir.
    pub fail: Mutex<Option<String>>,
}

#[async_trait]
impl MediaFetcher for FakeFetcher {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn fetch(&self, source_ref: &str, dest_dir: &Path) -> cf_core::Result<PathBuf> {
        self.calls.lock().push(source_ref.to_string());
        if let Some(msg) = self.fail.lock().clone() {
            return Err(cf_core::Error::FetchFailed(format!(
                "{msg} (writing to {})",
                dest_dir.display()
            )));
        }
        let dest = dest_dir.join("src.mp4");
        tokio::fs::write(&dest, b"source media").await?;
        Ok(dest)
    }
}

/// One recorded extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractCall {
    pub start_secs: u64,
    pub duration_secs: u64,
    pub output: PathBuf,
}

#[derive(Default)]
pub struct FakeExtractor {
    pub calls: Mutex<Vec<ExtractCall>>,
    /// Zero-based segment index that fails.
    pub fail_at: Mutex<Option<usize>>,
}

#[async_trait]
impl SegmentExtractor for FakeExtractor {
    async fn extract(
        &self,
        source: &Path,
        range: &TimeRange,
        output: &Path,
    ) -> cf_core::Result<PathBuf> {
        assert!(source.exists(), "extract called without a fetched source");
        let index = {
            let mut calls = self.calls.lock();
            calls.push(ExtractCall {
                start_secs: range.start().as_secs(),
                duration_secs: range.duration().as_secs(),
                output: output.to_path_buf(),
            });
            calls.len() - 1
        };
        if *self.fail_at.lock() == Some(index) {
            return Err(cf_core::Error::tool("ffmpeg", "invalid data found"));
        }
        tokio::fs::write(output, format!("segment {range}")).await?;
        Ok(output.to_path_buf())
    }
}

/// What the concatenator should do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConcatMode {
    #[default]
    Ok,
    /// Write a partial file, then fail.
    Fail,
    /// Report success but leave an empty file.
    Empty,
}

/// One recorded concat.
#[derive(Debug, Clone)]
pub struct ConcatCall {
    pub clips: Vec<PathBuf>,
    pub list_text: String,
    pub output: PathBuf,
}

#[derive(Default)]
pub struct FakeConcatenator {
    pub calls: Mutex<Vec<ConcatCall>>,
    pub mode: Mutex<ConcatMode>,
    /// Each output gets a strictly later mtime than the previous one.
    tick: AtomicU64,
}

#[async_trait]
impl Concatenator for FakeConcatenator {
    async fn concat(
        &self,
        clips: &ConcatList,
        list_file: &Path,
        output: &Path,
    ) -> cf_core::Result<()> {
        let list_text = tokio::fs::read_to_string(list_file).await?;
        self.calls.lock().push(ConcatCall {
            clips: clips.clips().to_vec(),
            list_text,
            output: output.to_path_buf(),
        });

        let mode = *self.mode.lock();
        let payload: &[u8] = match mode {
            ConcatMode::Empty => b"",
            _ => b"joined clip bytes",
        };
        std::fs::write(output, payload)?;

        let tick = self.tick.fetch_add(1, Ordering::SeqCst);
        let mtime = SystemTime::now() + Duration::from_secs(10 * tick);
        std::fs::File::options()
            .write(true)
            .open(output)?
            .set_modified(mtime)?;

        if mode == ConcatMode::Fail {
            return Err(cf_core::Error::tool(
                "ffmpeg",
                format!("non-monotonic DTS in {}", output.display()),
            ));
        }
        Ok(())
    }
}

/// Output store whose `list` and `remove` always fail; lookups and paths go
/// to the wrapped filesystem store.
pub struct UnlistableStore {
    inner: FsOutputStore,
}

impl UnlistableStore {
    pub fn new(inner: FsOutputStore) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl OutputStore for UnlistableStore {
    fn extension(&self) -> &str {
        self.inner.extension()
    }

    fn path_for(&self, filename: &str) -> cf_core::Result<PathBuf> {
        self.inner.path_for(filename)
    }

    async fn list(&self) -> cf_core::Result<Vec<StoredArtifact>> {
        Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "listing denied").into())
    }

    async fn stat(&self, filename: &str) -> cf_core::Result<Option<StoredArtifact>> {
        self.inner.stat(filename).await
    }

    async fn remove(&self, _filename: &str) -> cf_core::Result<()> {
        Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "removal denied").into())
    }

    async fn open(&self, filename: &str) -> cf_core::Result<(tokio::fs::File, StoredArtifact)> {
        self.inner.open(filename).await
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct TestHarness {
    pub dir: tempfile::TempDir,
    pub config: Config,
    pub fetcher: Arc<FakeFetcher>,
    pub extractor: Arc<FakeExtractor>,
    pub concatenator: Arc<FakeConcatenator>,
    pub pipeline: Arc<JobPipeline>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_max_outputs(5)
    }

    pub fn with_max_outputs(max_outputs: usize) -> Self {
        Self::build(max_outputs, false)
    }

    /// Harness whose output store cannot be listed or pruned.
    pub fn with_unlistable_store() -> Self {
        Self::build(5, true)
    }

    fn build(max_outputs: usize, unlistable: bool) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let mut config = Config::default();
        config.storage.data_dir = dir.path().join("data");
        config.retention.max_outputs = max_outputs;

        let fetcher = Arc::new(FakeFetcher::default());
        let extractor = Arc::new(FakeExtractor::default());
        let concatenator = Arc::new(FakeConcatenator::default());

        let fs_store = FsOutputStore::new(config.storage.output_dir(), &config.encode.container);
        let store: Arc<dyn OutputStore> = if unlistable {
            Arc::new(UnlistableStore::new(fs_store))
        } else {
            Arc::new(fs_store)
        };

        let pipeline = JobPipeline::new(
            fetcher.clone(),
            extractor.clone(),
            concatenator.clone(),
            store,
            WorkspaceManager::new(config.storage.scratch_dir()),
            RetentionPolicy::from(&config.retention),
        );

        Self {
            dir,
            config,
            fetcher,
            extractor,
            concatenator,
            pipeline: Arc::new(pipeline),
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.config.storage.output_dir()
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.config.storage.scratch_dir()
    }

    /// Sorted file names currently in the output store directory.
    pub fn outputs(&self) -> Vec<String> {
        list_names(&self.output_dir())
    }

    /// Sorted entry names currently under the scratch root.
    pub fn workspaces(&self) -> Vec<String> {
        list_names(&self.scratch_dir())
    }

    /// Router over this harness's pipeline.
    pub fn router(&self) -> axum::Router {
        let ctx = AppContext {
            config: Arc::new(self.config.clone()),
            pipeline: self.pipeline.clone(),
            tools: Arc::new(ToolRegistry::default()),
        };
        build_router(ctx, None)
    }
}

fn list_names(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
