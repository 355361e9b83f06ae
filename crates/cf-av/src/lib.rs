//! # cf-av
//!
//! Audio/video tooling for the clipforge pipeline.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find and cache the path to
//!   ffmpeg.
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout
//!   support for running external processes.
//! - **Workspace management** ([`WorkspaceManager`], [`Workspace`]) --
//!   per-job scratch directories that are always removed.
//! - **Action functions** ([`actions`]) -- segment extraction and stream-copy
//!   concatenation.

pub mod actions;
pub mod command;
pub mod tools;
pub mod workspace;

// ---- Re-exports for convenience ----

pub use command::{ToolCommand, ToolOutput};
pub use tools::{ToolConfig, ToolInfo, ToolRegistry};
pub use workspace::{Workspace, WorkspaceManager};

pub use actions::{concat_segments, extract_segment, ConcatList};
