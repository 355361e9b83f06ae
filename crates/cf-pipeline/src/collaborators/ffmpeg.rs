//! ffmpeg-backed extraction and concatenation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use cf_av::{ConcatList, ToolRegistry};
use cf_core::config::EncodeConfig;
use cf_core::TimeRange;

use crate::collaborator::{Concatenator, SegmentExtractor};

/// Re-encodes each range with fixed settings so segments can be stream-copied
/// together afterwards.
#[derive(Debug, Clone)]
pub struct FfmpegExtractor {
    tools: Arc<ToolRegistry>,
    encode: EncodeConfig,
}

impl FfmpegExtractor {
    pub fn new(tools: Arc<ToolRegistry>, encode: EncodeConfig) -> Self {
        Self { tools, encode }
    }
}

#[async_trait]
impl SegmentExtractor for FfmpegExtractor {
    async fn extract(
        &self,
        source: &Path,
        range: &TimeRange,
        output: &Path,
    ) -> cf_core::Result<PathBuf> {
        cf_av::extract_segment(&self.tools, source, output, range, &self.encode).await?;
        Ok(output.to_path_buf())
    }
}

/// Joins segments with the concat demuxer and `-c copy`.
#[derive(Debug, Clone)]
pub struct FfmpegConcatenator {
    tools: Arc<ToolRegistry>,
}

impl FfmpegConcatenator {
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl Concatenator for FfmpegConcatenator {
    async fn concat(
        &self,
        clips: &ConcatList,
        list_file: &Path,
        output: &Path,
    ) -> cf_core::Result<()> {
        if clips.is_empty() {
            return Err(cf_core::Error::tool("ffmpeg", "nothing to concatenate"));
        }
        cf_av::concat_segments(&self.tools, list_file, output).await
    }
}
