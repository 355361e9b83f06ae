//! Shared application state handed to every route handler.

use std::sync::Arc;

use cf_av::ToolRegistry;
use cf_core::config::Config;
use cf_pipeline::JobPipeline;

/// Immutable infrastructure shared across requests. Cloning is cheap.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub pipeline: Arc<JobPipeline>,
    pub tools: Arc<ToolRegistry>,
}

impl AppContext {
    pub fn new(config: Config, pipeline: JobPipeline, tools: Arc<ToolRegistry>) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
            tools,
        }
    }
}
