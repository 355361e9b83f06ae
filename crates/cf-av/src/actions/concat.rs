//! Lossless join of already-encoded segments via ffmpeg's concat demuxer.

use std::path::{Path, PathBuf};

use super::ensure_non_empty;
use crate::command::ToolCommand;
use crate::tools::ToolRegistry;

/// Ordered list of clip files for the concat demuxer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConcatList {
    clips: Vec<PathBuf>,
}

impl ConcatList {
    pub fn new(clips: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            clips: clips.into_iter().collect(),
        }
    }

    /// Clips in join order.
    pub fn clips(&self) -> &[PathBuf] {
        &self.clips
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Render the demuxer script: one `file '<path>'` line per clip, with
    /// single quotes escaped as `'\''`.
    pub fn render(&self) -> String {
        self.clips
            .iter()
            .map(|p| format!("file '{}'", p.to_string_lossy().replace('\'', r"'\''")))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Write the rendered script to `path`.
    pub async fn write_to(&self, path: &Path) -> cf_core::Result<()> {
        tokio::fs::write(path, self.render()).await?;
        Ok(())
    }
}

/// Join the clips named in `list_file` into `output` without re-encoding.
pub async fn concat_segments(
    tools: &ToolRegistry,
    list_file: &Path,
    output: &Path,
) -> cf_core::Result<()> {
    let ffmpeg = tools.require("ffmpeg")?;

    tracing::info!("Concat: {:?} -> {:?}", list_file, output);

    let mut cmd = ToolCommand::new(ffmpeg.path.clone());
    cmd.timeout(ffmpeg.timeout);
    cmd.args(["-hide_banner", "-loglevel", "error", "-y"]);
    cmd.args(["-f", "concat", "-safe", "0"]);
    cmd.arg("-i");
    cmd.arg(list_file.to_string_lossy().as_ref());
    cmd.args(["-c", "copy"]);
    if is_mp4_family(output) {
        cmd.args(["-movflags", "+faststart"]);
    }
    cmd.arg(output.to_string_lossy().as_ref());
    cmd.execute().await?;

    ensure_non_empty("ffmpeg", output).await?;
    Ok(())
}

fn is_mp4_family(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("mp4" | "m4v" | "mov")
    )
}
