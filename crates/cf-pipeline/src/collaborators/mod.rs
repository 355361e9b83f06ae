//! Production implementations of the collaborator traits.

mod ffmpeg;
mod fetch;

pub use ffmpeg::{FfmpegConcatenator, FfmpegExtractor};
pub use fetch::{HttpMediaFetcher, LocalFileFetcher, SourceFetcher};
