//! End-to-end pipeline behaviour against fake collaborators.

mod common;

use std::time::{Duration, SystemTime};

use assert_matches::assert_matches;
use cf_pipeline::RetentionReport;
use common::{ConcatMode, TestHarness};

const SOURCE: &str = "https://video.example/watch?v=abc";

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn two_ranges_extract_in_order_and_concat_once() {
    let h = TestHarness::new();

    let artifact = h
        .pipeline
        .run(SOURCE, "0:10-0:25,1:02-1:30")
        .await
        .expect("job should succeed");

    assert_eq!(*h.fetcher.calls.lock(), vec![SOURCE.to_string()]);

    let extracts = h.extractor.calls.lock().clone();
    let timing: Vec<_> = extracts
        .iter()
        .map(|c| (c.start_secs, c.duration_secs))
        .collect();
    assert_eq!(timing, vec![(10, 15), (62, 28)]);
    assert!(extracts[0].output.ends_with("segment_0.mp4"));
    assert!(extracts[1].output.ends_with("segment_1.mp4"));

    let concats = h.concatenator.calls.lock().clone();
    assert_eq!(concats.len(), 1);
    let expected: Vec<_> = extracts.iter().map(|c| c.output.clone()).collect();
    assert_eq!(concats[0].clips, expected);
    let lines: Vec<_> = concats[0].list_text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("segment_0.mp4") && lines[1].contains("segment_1.mp4"));

    assert!(artifact.filename.starts_with("clip_"));
    assert!(artifact.filename.ends_with(".mp4"));
    assert!(artifact.size > 0);
    assert_eq!(artifact.path, h.output_dir().join(&artifact.filename));
    assert_eq!(h.outputs(), vec![artifact.filename.clone()]);
}

#[tokio::test]
async fn output_order_follows_input_not_time() {
    let h = TestHarness::new();
    h.pipeline.run(SOURCE, "2:00-2:05, 0:00-0:03").await.unwrap();

    let starts: Vec<_> = h
        .extractor
        .calls
        .lock()
        .iter()
        .map(|c| c.start_secs)
        .collect();
    assert_eq!(starts, vec![120, 0]);
}

#[tokio::test]
async fn reversed_range_is_invalid_input_without_side_effects() {
    let h = TestHarness::new();

    let err = h.pipeline.run(SOURCE, "0:30-0:20").await.unwrap_err();
    assert_matches!(err, cf_core::Error::InvalidInput(ref m) if m.contains("0:30-0:20"));

    assert!(h.fetcher.calls.lock().is_empty());
    assert!(h.extractor.calls.lock().is_empty());
    assert!(h.concatenator.calls.lock().is_empty());
    assert!(!h.output_dir().exists());
    assert!(!h.scratch_dir().exists());
}

#[tokio::test]
async fn garbage_ranges_fail_before_fetch() {
    let h = TestHarness::new();

    let err = h.pipeline.run(SOURCE, "abc").await.unwrap_err();
    assert_matches!(err, cf_core::Error::InvalidInput(ref m) if m.contains("abc"));
    assert_eq!(err.http_status(), 400);
    assert!(h.fetcher.calls.lock().is_empty());
}

#[tokio::test]
async fn blank_source_is_invalid_input() {
    let h = TestHarness::new();
    let err = h.pipeline.run("   ", "0:00-0:05").await.unwrap_err();
    assert_matches!(err, cf_core::Error::InvalidInput(_));
    assert!(h.fetcher.calls.lock().is_empty());
}

#[tokio::test]
async fn fetch_failure_removes_workspace_and_creates_no_output() {
    let h = TestHarness::new();
    *h.fetcher.fail.lock() = Some("upstream returned 503".into());

    let err = h.pipeline.run(SOURCE, "0:00-0:05").await.unwrap_err();
    assert_matches!(err, cf_core::Error::FetchFailed(_));

    assert!(h.workspaces().is_empty(), "workspace left behind");
    assert!(h.outputs().is_empty());
    assert!(h.extractor.calls.lock().is_empty());
}

#[tokio::test]
async fn sixth_job_evicts_the_oldest_of_five() {
    let h = TestHarness::with_max_outputs(5);

    let mut produced = Vec::new();
    for _ in 0..6 {
        let artifact = h.pipeline.run(SOURCE, "0:00-0:01").await.unwrap();
        assert!(h.outputs().len() <= 5);
        produced.push(artifact.filename);
    }

    let remaining = h.outputs();
    assert_eq!(remaining.len(), 5);
    assert!(!remaining.contains(&produced[0]), "oldest should be evicted");
    for name in &produced[1..] {
        assert!(remaining.contains(name), "{name} should be kept");
    }
}

// ---------------------------------------------------------------------------
// Failure paths
// ---------------------------------------------------------------------------

#[tokio::test]
async fn extraction_failure_reports_index_and_skips_concat() {
    let h = TestHarness::new();
    *h.extractor.fail_at.lock() = Some(1);

    let err = h
        .pipeline
        .run(SOURCE, "0:00-0:05,0:10-0:15,0:20-0:25")
        .await
        .unwrap_err();
    assert_matches!(err, cf_core::Error::ExtractionFailed { index: 1, .. });

    assert_eq!(h.extractor.calls.lock().len(), 2, "stops at the failing segment");
    assert!(h.concatenator.calls.lock().is_empty());
    assert!(h.outputs().is_empty());
    assert!(h.workspaces().is_empty());
}

#[tokio::test]
async fn concat_failure_removes_partial_output() {
    let h = TestHarness::new();
    *h.concatenator.mode.lock() = ConcatMode::Fail;

    let err = h.pipeline.run(SOURCE, "0:00-0:05").await.unwrap_err();
    assert_matches!(err, cf_core::Error::ConcatFailed(_));
    assert!(h.outputs().is_empty());
    assert!(h.workspaces().is_empty());
}

#[tokio::test]
async fn empty_output_is_artifact_missing() {
    let h = TestHarness::new();
    *h.concatenator.mode.lock() = ConcatMode::Empty;

    let err = h.pipeline.run(SOURCE, "0:00-0:05").await.unwrap_err();
    assert_matches!(err, cf_core::Error::ArtifactMissing(_));
    assert_eq!(err.public_message(), "output file was not produced");
    assert!(h.outputs().is_empty(), "empty file should not be kept");
}

#[tokio::test]
async fn collaborator_errors_do_not_leak_job_paths() {
    let h = TestHarness::new();
    *h.fetcher.fail.lock() = Some("boom".into());

    let err = h.pipeline.run(SOURCE, "0:00-0:05").await.unwrap_err();
    let message = err.public_message();
    assert!(message.contains("<workspace>"), "{message}");
    assert!(
        !message.contains(&h.scratch_dir().display().to_string()),
        "{message}"
    );

    *h.fetcher.fail.lock() = None;
    *h.concatenator.mode.lock() = ConcatMode::Fail;
    let err = h.pipeline.run(SOURCE, "0:00-0:05").await.unwrap_err();
    let message = err.public_message();
    assert!(message.contains("<outputs>"), "{message}");
    assert!(
        !message.contains(&h.output_dir().display().to_string()),
        "{message}"
    );
}

// ---------------------------------------------------------------------------
// Invariants
// ---------------------------------------------------------------------------

#[tokio::test]
async fn workspace_is_removed_after_success() {
    let h = TestHarness::new();
    h.pipeline.run(SOURCE, "0:00-0:05,0:06-0:07").await.unwrap();
    assert!(h.scratch_dir().exists());
    assert!(h.workspaces().is_empty());
}

#[tokio::test]
async fn forced_retention_pass_is_idempotent() {
    let h = TestHarness::with_max_outputs(2);
    for _ in 0..3 {
        h.pipeline.run(SOURCE, "0:00-0:01").await.unwrap();
    }

    let first = h.pipeline.force_retention_pass().await;
    let after_first = h.outputs();
    let second = h.pipeline.force_retention_pass().await;
    let after_second = h.outputs();

    assert_eq!(after_first.len(), 2);
    assert_eq!(after_first, after_second);
    assert_eq!(first.outputs_kept, 2);
    assert_eq!(second.outputs_removed, 0);
}

#[tokio::test]
async fn retention_failures_never_fail_the_job() {
    let h = TestHarness::with_unlistable_store();

    let artifact = h
        .pipeline
        .run(SOURCE, "0:00-0:05")
        .await
        .expect("job should succeed despite retention errors");
    assert_eq!(h.outputs(), vec![artifact.filename]);

    let report = h.pipeline.force_retention_pass().await;
    assert_eq!(report, RetentionReport::default());
    assert_eq!(h.outputs().len(), 1);
}

#[tokio::test]
async fn failed_job_still_consumes_the_reserved_slot() {
    let h = TestHarness::with_max_outputs(2);
    let first = h.pipeline.run(SOURCE, "0:00-0:01").await.unwrap();
    let second = h.pipeline.run(SOURCE, "0:00-0:01").await.unwrap();

    *h.fetcher.fail.lock() = Some("no such video".into());
    h.pipeline.run(SOURCE, "0:00-0:01").await.unwrap_err();

    // The pre-pass evicted the oldest clip before the fetch failed.
    assert_eq!(h.outputs(), vec![second.filename]);
    assert!(!h.outputs().contains(&first.filename));
}

#[tokio::test]
async fn store_never_exceeds_retention_count() {
    let h = TestHarness::with_max_outputs(3);
    for _ in 0..8 {
        h.pipeline.run(SOURCE, "0:00-0:01").await.unwrap();
        assert!(h.outputs().len() <= 3, "{:?}", h.outputs());
    }
    assert_eq!(h.outputs().len(), 3);
}

#[tokio::test]
async fn stale_workspaces_are_expired_by_the_next_job() {
    let h = TestHarness::new();
    let stale = h.scratch_dir().join("deadbeef-crashed");
    std::fs::create_dir_all(&stale).unwrap();
    std::fs::write(stale.join("segment_0.mp4"), b"x").unwrap();
    std::fs::File::open(&stale)
        .unwrap()
        .set_modified(SystemTime::now() - Duration::from_secs(2 * 3600))
        .unwrap();

    h.pipeline.run(SOURCE, "0:00-0:01").await.unwrap();
    assert!(!stale.exists());
}

#[tokio::test]
async fn retrieve_returns_the_stored_clip() {
    use tokio::io::AsyncReadExt;

    let h = TestHarness::new();
    let artifact = h.pipeline.run(SOURCE, "0:00-0:01").await.unwrap();

    let (mut file, stored) = h.pipeline.retrieve(&artifact.filename).await.unwrap();
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).await.unwrap();
    assert_eq!(bytes, b"joined clip bytes");
    assert_eq!(stored.size, artifact.size);

    let err = h.pipeline.retrieve("../../etc/passwd").await.unwrap_err();
    assert_matches!(err, cf_core::Error::NotFound { .. });
}

#[tokio::test]
async fn concurrent_jobs_use_distinct_outputs() {
    let h = TestHarness::with_max_outputs(10);
    let (a, b) = tokio::join!(
        h.pipeline.run(SOURCE, "0:00-0:01"),
        h.pipeline.run(SOURCE, "0:02-0:03"),
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_ne!(a.filename, b.filename);
    assert_eq!(h.outputs().len(), 2);
    assert!(h.workspaces().is_empty());
}
