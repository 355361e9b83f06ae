//! Traits for the external collaborators a clip job depends on.
//!
//! The pipeline only sequences calls to these; it never decodes media or
//! talks to a download service itself. Each implementation owns its own
//! timeout and retry policy.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use cf_av::ConcatList;
use cf_core::TimeRange;

/// Resolves a source reference (URL, path) to a local media file.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// A short, human-readable name for log lines.
    fn name(&self) -> &'static str;

    /// Materialize `source_ref` as a file inside `dest_dir` and return its path.
    async fn fetch(&self, source_ref: &str, dest_dir: &Path) -> cf_core::Result<PathBuf>;
}

/// Cuts one time range out of a local source file.
#[async_trait]
pub trait SegmentExtractor: Send + Sync {
    /// Write the sub-clip for `range` to `output` and return the clip path.
    async fn extract(
        &self,
        source: &Path,
        range: &TimeRange,
        output: &Path,
    ) -> cf_core::Result<PathBuf>;
}

/// Joins clips with compatible encoding into one file without re-encoding.
#[async_trait]
pub trait Concatenator: Send + Sync {
    /// Join `clips` (whose demuxer script was written to `list_file`) into
    /// `output`.
    async fn concat(
        &self,
        clips: &ConcatList,
        list_file: &Path,
        output: &Path,
    ) -> cf_core::Result<()>;
}
