//! ffmpeg actions: per-range segment extraction and stream-copy concatenation.

mod concat;
mod extract;

pub use concat::{concat_segments, ConcatList};
pub use extract::extract_segment;

use std::path::Path;
use std::time::Duration;

/// Format a duration the way ffmpeg's `-ss` / `-t` expect (seconds, ms precision).
pub(crate) fn ffmpeg_secs(d: Duration) -> String {
    format!("{:.3}", d.as_secs_f64())
}

/// Fail unless `path` exists and holds at least one byte.
pub(crate) async fn ensure_non_empty(tool: &str, path: &Path) -> cf_core::Result<u64> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.len() > 0 => Ok(meta.len()),
        Ok(_) => Err(cf_core::Error::tool(
            tool,
            format!("produced an empty file: {}", path.display()),
        )),
        Err(e) => Err(cf_core::Error::tool(
            tool,
            format!("did not produce {}: {e}", path.display()),
        )),
    }
}
