//! Cut one time range out of a source file.

use std::path::Path;

use cf_core::config::EncodeConfig;
use cf_core::TimeRange;

use super::{ensure_non_empty, ffmpeg_secs};
use crate::command::ToolCommand;
use crate::tools::ToolRegistry;

/// Extract `range` from `input` into `output`, re-encoding with `encode`.
///
/// Every segment of a job is encoded with the same settings so that the
/// later join can be a pure stream copy. A range that starts past the end of
/// the source makes ffmpeg write an empty file; that is reported as an error.
pub async fn extract_segment(
    tools: &ToolRegistry,
    input: &Path,
    output: &Path,
    range: &TimeRange,
    encode: &EncodeConfig,
) -> cf_core::Result<()> {
    let ffmpeg = tools.require("ffmpeg")?;

    tracing::info!(
        "Extract: {:?} [{}] -> {:?}",
        input.file_name().unwrap_or_default(),
        range,
        output.file_name().unwrap_or_default()
    );

    let mut cmd = ToolCommand::new(ffmpeg.path.clone());
    cmd.timeout(ffmpeg.timeout);
    cmd.args(["-hide_banner", "-loglevel", "error", "-y"]);
    cmd.args(["-ss", &ffmpeg_secs(range.start())]);
    cmd.arg("-i");
    cmd.arg(input.to_string_lossy().as_ref());
    cmd.args(["-t", &ffmpeg_secs(range.duration())]);
    cmd.args(["-c:v", &encode.video_codec]);
    cmd.args(["-preset", &encode.preset]);
    cmd.args(["-crf", &encode.crf.to_string()]);
    cmd.args(["-c:a", &encode.audio_codec]);
    cmd.args(["-avoid_negative_ts", "make_zero"]);
    cmd.arg(output.to_string_lossy().as_ref());
    cmd.execute().await?;

    ensure_non_empty("ffmpeg", output).await?;
    Ok(())
}
