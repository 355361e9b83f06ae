//! # cf-pipeline
//!
//! Orchestration of clip jobs.
//!
//! This crate provides:
//!
//! - **Collaborator traits** ([`MediaFetcher`], [`SegmentExtractor`],
//!   [`Concatenator`]) -- the seams to the download service and ffmpeg, with
//!   concrete adapters in [`collaborators`].
//! - **[`OutputStore`]** -- the durable store of finished clips, with a
//!   filesystem implementation ([`FsOutputStore`]).
//! - **[`RetentionManager`]** -- bounds the number of kept outputs and expires
//!   abandoned workspaces.
//! - **[`JobPipeline`]** -- parse, fetch, extract, concat, verify; one call
//!   per request.
//! - **[`build_pipeline`]** -- factory wiring the production adapters from a
//!   [`Config`](cf_core::config::Config).

pub mod collaborator;
pub mod collaborators;
pub mod factory;
pub mod job;
pub mod pipeline;
pub mod retention;
pub mod store;

// Re-export key types at the crate root.
pub use collaborator::{Concatenator, MediaFetcher, SegmentExtractor};
pub use factory::build_pipeline;
pub use job::{Job, JobState};
pub use pipeline::JobPipeline;
pub use retention::{RetentionManager, RetentionPolicy, RetentionReport};
pub use store::{FsOutputStore, OutputArtifact, OutputStore, StoredArtifact};
