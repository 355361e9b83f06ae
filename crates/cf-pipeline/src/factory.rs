//! Wire the production collaborators from a [`Config`].

use std::sync::Arc;

use cf_av::{ToolRegistry, WorkspaceManager};
use cf_core::config::Config;

use crate::collaborators::{FfmpegConcatenator, FfmpegExtractor, HttpMediaFetcher, SourceFetcher};
use crate::pipeline::JobPipeline;
use crate::retention::RetentionPolicy;
use crate::store::FsOutputStore;

/// Build a [`JobPipeline`] backed by ffmpeg, the configured download
/// service, and a filesystem output store under `storage.data_dir`.
///
/// `allow_local` lets non-URL source references be copied from the local
/// filesystem; the HTTP server leaves it off.
///
/// # Errors
///
/// Returns [`cf_core::Error::Tool`] if ffmpeg is not present in the registry,
/// or [`cf_core::Error::Internal`] if the HTTP client cannot be built.
pub fn build_pipeline(
    config: &Config,
    tools: Arc<ToolRegistry>,
    allow_local: bool,
) -> cf_core::Result<JobPipeline> {
    tools.require("ffmpeg")?;

    let remote = config
        .fetcher
        .endpoint
        .as_deref()
        .map(|endpoint| HttpMediaFetcher::new(endpoint, &config.encode.container, &config.fetcher))
        .transpose()?;

    let store = FsOutputStore::new(config.storage.output_dir(), &config.encode.container);
    let workspaces = WorkspaceManager::new(config.storage.scratch_dir());

    Ok(JobPipeline::new(
        Arc::new(SourceFetcher::new(remote, allow_local)),
        Arc::new(FfmpegExtractor::new(tools.clone(), config.encode.clone())),
        Arc::new(FfmpegConcatenator::new(tools)),
        Arc::new(store),
        workspaces,
        RetentionPolicy::from(&config.retention),
    ))
}
