//! The clip job pipeline: parse, fetch, extract, concat, verify.
//!
//! One [`JobPipeline::run`] call is one job. Stages run strictly in order;
//! segment `i` is extracted before segment `i + 1`, and the concat list names
//! segments in the order the caller supplied the ranges. The workspace is
//! released on every exit path.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use cf_av::{ConcatList, Workspace, WorkspaceManager};
use cf_core::{JobId, RangeList};
use chrono::{DateTime, Utc};
use tracing::Instrument;

use crate::collaborator::{Concatenator, MediaFetcher, SegmentExtractor};
use crate::job::{Job, JobState};
use crate::retention::{RetentionManager, RetentionPolicy, RetentionReport};
use crate::store::{OutputArtifact, OutputStore, StoredArtifact};

const CONCAT_LIST: &str = "concat.txt";

/// Composes the collaborators, output store, workspace manager, and
/// retention manager into a request-scoped operation.
pub struct JobPipeline {
    fetcher: Arc<dyn MediaFetcher>,
    extractor: Arc<dyn SegmentExtractor>,
    concatenator: Arc<dyn Concatenator>,
    store: Arc<dyn OutputStore>,
    workspaces: WorkspaceManager,
    retention: RetentionManager,
}

impl JobPipeline {
    pub fn new(
        fetcher: Arc<dyn MediaFetcher>,
        extractor: Arc<dyn SegmentExtractor>,
        concatenator: Arc<dyn Concatenator>,
        store: Arc<dyn OutputStore>,
        workspaces: WorkspaceManager,
        policy: RetentionPolicy,
    ) -> Self {
        let retention = RetentionManager::new(store.clone(), workspaces.root(), policy);
        Self {
            fetcher,
            extractor,
            concatenator,
            store,
            workspaces,
            retention,
        }
    }

    pub fn store(&self) -> &Arc<dyn OutputStore> {
        &self.store
    }

    pub fn retention(&self) -> &RetentionManager {
        &self.retention
    }

    /// Run one job: cut `raw_ranges` out of `source_ref` and store the result.
    ///
    /// # Errors
    ///
    /// - [`cf_core::Error::InvalidInput`] before any disk or collaborator
    ///   activity if the source is blank or the ranges do not parse.
    /// - [`cf_core::Error::FetchFailed`], [`cf_core::Error::ExtractionFailed`]
    ///   or [`cf_core::Error::ConcatFailed`] when a collaborator fails.
    /// - [`cf_core::Error::ArtifactMissing`] if the output is absent or empty
    ///   after a reported success.
    pub async fn run(&self, source_ref: &str, raw_ranges: &str) -> cf_core::Result<OutputArtifact> {
        let source_ref = source_ref.trim();
        if source_ref.is_empty() {
            return Err(cf_core::Error::InvalidInput(
                "source reference must not be empty".into(),
            ));
        }
        let ranges = RangeList::parse(raw_ranges)?;

        self.retention.prepare_for_new_output().await;

        let id = JobId::new();
        let span = tracing::info_span!("job", id = %id);
        self.run_job(id, source_ref, ranges).instrument(span).await
    }

    async fn run_job(
        &self,
        id: JobId,
        source_ref: &str,
        ranges: RangeList,
    ) -> cf_core::Result<OutputArtifact> {
        let started = Instant::now();
        tracing::info!(
            segments = ranges.len(),
            total_secs = ranges.total_duration().as_secs_f64(),
            "Job started"
        );

        let workspace = self.workspaces.acquire(id).await?;
        let mut job = Job::new(id, workspace.path(), ranges);

        let result = self.execute(&mut job, &workspace, source_ref).await;
        job.set_state(if result.is_ok() {
            JobState::Completed
        } else {
            JobState::Failed
        });
        self.workspaces.release(workspace).await;

        match &result {
            Ok(artifact) => tracing::info!(
                filename = %artifact.filename,
                size = artifact.size,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Job completed"
            ),
            Err(e) if e.is_client_error() => tracing::warn!("Job failed: {e}"),
            Err(e) => tracing::error!("Job failed: {e}"),
        }
        result
    }

    async fn execute(
        &self,
        job: &mut Job,
        workspace: &Workspace,
        source_ref: &str,
    ) -> cf_core::Result<OutputArtifact> {
        let ext = self.store.extension().to_string();
        let output_name = job.output_name(&ext);
        let output_path = self.store.path_for(&output_name)?;
        let scrub = |e: &cf_core::Error| scrub_paths(&detail(e), workspace.path(), &output_path);

        // Fetch.
        job.set_state(JobState::Fetching);
        let source = self
            .fetcher
            .fetch(source_ref, workspace.path())
            .await
            .map_err(|e| cf_core::Error::FetchFailed(scrub(&e)))?;
        tracing::debug!(fetcher = self.fetcher.name(), "Source fetched");
        job.source_file = Some(source.clone());

        // Extract, strictly in caller order.
        let ranges = job.ranges.clone();
        for (index, range) in ranges.iter().enumerate() {
            job.set_state(JobState::Extracting { index });
            let target = workspace.file(&format!("segment_{index}.{ext}"));
            let clip = self
                .extractor
                .extract(&source, range, &target)
                .await
                .map_err(|e| cf_core::Error::extraction(index, scrub(&e)))?;
            job.segment_files.push(clip);
        }

        // Concat into the output store.
        job.set_state(JobState::Concatenating);
        let list = ConcatList::new(job.segment_files.iter().cloned());
        let list_file = workspace.file(CONCAT_LIST);
        list.write_to(&list_file).await?;
        if let Some(dir) = output_path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }

        if let Err(e) = self
            .concatenator
            .concat(&list, &list_file, &output_path)
            .await
        {
            self.discard_output(&output_name).await;
            return Err(cf_core::Error::ConcatFailed(scrub(&e)));
        }
        job.output_file = Some(output_path.clone());

        remove_intermediates(job, &list_file).await;

        // Verify.
        job.set_state(JobState::Verifying);
        self.verify(&output_name, &output_path).await
    }

    async fn verify(&self, output_name: &str, output_path: &Path) -> cf_core::Result<OutputArtifact> {
        match self.store.stat(output_name).await? {
            Some(stored) if stored.size > 0 => Ok(OutputArtifact {
                filename: stored.filename,
                path: output_path.to_path_buf(),
                size: stored.size,
                created_at: DateTime::<Utc>::from(stored.modified),
            }),
            Some(_) => {
                self.discard_output(output_name).await;
                Err(cf_core::Error::ArtifactMissing(format!(
                    "{output_name} is empty"
                )))
            }
            None => Err(cf_core::Error::ArtifactMissing(format!(
                "{output_name} was not written"
            ))),
        }
    }

    async fn discard_output(&self, output_name: &str) {
        if let Err(e) = self.store.remove(output_name).await {
            tracing::warn!("Failed to remove partial output {output_name}: {e}");
        }
    }

    /// Open a stored artifact for streaming.
    ///
    /// # Errors
    ///
    /// [`cf_core::Error::NotFound`] when no such artifact exists (including
    /// names that would escape the store).
    pub async fn retrieve(&self, filename: &str) -> cf_core::Result<(tokio::fs::File, StoredArtifact)> {
        self.store.open(filename).await
    }

    /// Metadata for a stored artifact, if present.
    pub async fn stat(&self, filename: &str) -> cf_core::Result<Option<StoredArtifact>> {
        self.store.stat(filename).await
    }

    /// Keep exactly the newest `max_outputs` and expire stale workspaces.
    pub async fn force_retention_pass(&self) -> RetentionReport {
        self.retention.force_pass().await
    }
}

/// Collaborator detail without the error-kind prefix.
fn detail(e: &cf_core::Error) -> String {
    match e {
        cf_core::Error::FetchFailed(m) | cf_core::Error::ConcatFailed(m) => m.clone(),
        cf_core::Error::ExtractionFailed { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

/// Replace job-private paths in a collaborator message.
fn scrub_paths(message: &str, workspace: &Path, output: &Path) -> String {
    let mut out = message.replace(workspace.to_string_lossy().as_ref(), "<workspace>");
    if let Some(dir) = output.parent() {
        let dir = dir.to_string_lossy();
        if !dir.is_empty() {
            out = out.replace(dir.as_ref(), "<outputs>");
        }
    }
    out
}

async fn remove_intermediates(job: &Job, list_file: &Path) {
    let files = job
        .source_file
        .iter()
        .chain(job.segment_files.iter())
        .map(|p| p.as_path())
        .chain(std::iter::once(list_file));

    for path in files {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove intermediate {}: {e}", path.display()),
        }
    }
}
