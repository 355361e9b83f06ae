//! Per-request job record.

use std::fmt;
use std::path::PathBuf;

use cf_core::{JobId, RangeList};

/// Lifecycle of a clip job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Created,
    Fetching,
    Extracting { index: usize },
    Concatenating,
    Verifying,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Created => f.write_str("created"),
            JobState::Fetching => f.write_str("fetching"),
            JobState::Extracting { index } => write!(f, "extracting[{index}]"),
            JobState::Concatenating => f.write_str("concatenating"),
            JobState::Verifying => f.write_str("verifying"),
            JobState::Completed => f.write_str("completed"),
            JobState::Failed => f.write_str("failed"),
        }
    }
}

/// Everything the pipeline knows about one in-flight job. Lives only for the
/// duration of a single request.
#[derive(Debug)]
pub struct Job {
    pub id: JobId,
    /// The job's private workspace directory.
    pub workspace: PathBuf,
    pub ranges: RangeList,
    pub source_file: Option<PathBuf>,
    pub segment_files: Vec<PathBuf>,
    pub output_file: Option<PathBuf>,
    state: JobState,
}

impl Job {
    pub fn new(id: JobId, workspace: impl Into<PathBuf>, ranges: RangeList) -> Self {
        Self {
            id,
            workspace: workspace.into(),
            segment_files: Vec::with_capacity(ranges.len()),
            ranges,
            source_file: None,
            output_file: None,
            state: JobState::Created,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Advance to `next`. Terminal states are sticky.
    pub fn set_state(&mut self, next: JobState) {
        if self.state.is_terminal() {
            tracing::warn!("Ignoring transition {} -> {next} on finished job", self.state);
            return;
        }
        tracing::debug!("Job state {} -> {next}", self.state);
        self.state = next;
    }

    /// Output file name for this job: `clip_<id>.<ext>`.
    pub fn output_name(&self, extension: &str) -> String {
        format!("clip_{}.{extension}", self.id.simple())
    }
}
