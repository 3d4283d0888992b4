//! End-to-end tests for the run pipeline.
//!
//! These tests use `MockBackend` in place of a live engine and temporary
//! directories for both the engine output root and the results volume, so
//! no engine process is required.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use backend::mock::MockBackend;
use backend::CompletionRecord;
use storage::{ArtifactStore, StorageConfig};

use crate::{PipelineConfig, PipelineError, PollConfig, RunRequest, WorkflowPipeline};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

struct Harness {
    _tmp: tempfile::TempDir,
    output_root: std::path::PathBuf,
    results_root: std::path::PathBuf,
    backend: Arc<MockBackend>,
    pipeline: Arc<WorkflowPipeline>,
}

fn harness(backend: MockBackend) -> Harness {
    let tmp = tempfile::tempdir().unwrap();
    let output_root = tmp.path().join("output");
    let results_root = tmp.path().join("results");
    std::fs::create_dir_all(&output_root).unwrap();

    let backend = Arc::new(backend);
    let store = ArtifactStore::new(StorageConfig {
        results_root: results_root.clone(),
        engine_output_root: output_root.clone(),
    });
    let config = PipelineConfig {
        poll: PollConfig {
            interval: Duration::from_secs(2),
            timeout: Duration::from_secs(30),
        },
        ..PipelineConfig::default()
    };
    let pipeline = Arc::new(WorkflowPipeline::new(backend.clone(), store, config));

    Harness {
        _tmp: tmp,
        output_root,
        results_root,
        backend,
        pipeline,
    }
}

fn record(outputs: Value) -> CompletionRecord {
    CompletionRecord::from_history_entry(Some(&json!({ "outputs": outputs }))).unwrap()
}

fn video_record() -> CompletionRecord {
    record(json!({
        "20": { "gifs": [{ "filename": "clip_00001.mp4", "subfolder": "", "type": "output" }] }
    }))
}

fn request(user_id: &str) -> RunRequest {
    RunRequest::from_json(json!({
        "user_id": user_id,
        "ollama_url": "http://10.0.0.5:11434",
        "workflow_json": {
            "3": { "class_type": "OllamaConnectivityV2", "inputs": { "url": "http://placeholder" } },
            "4": { "class_type": "OllamaGenerateV2", "inputs": { "connectivity": ["3", 0] } },
            "20": { "class_type": "VHS_VideoCombine", "inputs": {} },
        }
    }))
    .unwrap()
}

// ============================================================
// Happy path
// ============================================================

#[tokio::test(start_paused = true)]
async fn single_video_run_end_to_end() {
    let h = harness(MockBackend::completing_after(1, video_record()));
    std::fs::write(h.output_root.join("clip_00001.mp4"), b"mp4 bytes").unwrap();

    let response = h.pipeline.run(request("user@example.com")).await.unwrap();

    assert_eq!(response.user_id, "user_example.com");
    assert_eq!(response.prompt_id, "prompt-1");
    assert_eq!(response.job_id.len(), 32);
    assert_eq!(
        response.result_path,
        format!("user_example.com/{}/clip_00001.mp4", response.job_id)
    );
    assert_eq!(response.stored_paths, vec![response.result_path.clone()]);

    let stored = h.results_root.join(&response.result_path);
    assert_eq!(std::fs::read(stored).unwrap(), b"mp4 bytes");
}

#[tokio::test(start_paused = true)]
async fn endpoint_is_injected_before_submission() {
    let h = harness(MockBackend::completing_after(1, video_record()));
    std::fs::write(h.output_root.join("clip_00001.mp4"), b"x").unwrap();

    h.pipeline.run(request("u")).await.unwrap();

    let submitted = h.backend.submitted();
    assert_eq!(submitted.len(), 1);
    let node = submitted[0].node("3").unwrap();
    assert_eq!(node["inputs"]["url"], "http://10.0.0.5:11434");

    let client_ids = h.backend.client_ids();
    assert_eq!(client_ids.len(), 1);
    assert!(!client_ids[0].is_empty());
}

#[tokio::test(start_paused = true)]
async fn video_is_primary_even_when_listed_second() {
    let h = harness(MockBackend::completing_after(
        2,
        record(json!({
            "9":  { "images": [{ "filename": "still.png", "type": "output" }] },
            "20": { "gifs":   [{ "filename": "clip.webm", "type": "output" }] },
        })),
    ));
    std::fs::write(h.output_root.join("still.png"), b"p").unwrap();
    std::fs::write(h.output_root.join("clip.webm"), b"w").unwrap();

    let response = h.pipeline.run(request("u")).await.unwrap();

    assert_eq!(response.stored_paths.len(), 2);
    assert!(response.result_path.ends_with("/clip.webm"));
}

#[tokio::test(start_paused = true)]
async fn each_run_gets_its_own_job_directory() {
    let h = harness(MockBackend::completing_after(1, video_record()));
    std::fs::write(h.output_root.join("clip_00001.mp4"), b"x").unwrap();

    let a = h.pipeline.run(request("u")).await.unwrap();
    let b = h.pipeline.run(request("u")).await.unwrap();

    assert_ne!(a.job_id, b.job_id);
    assert!(h.results_root.join(&a.result_path).is_file());
    assert!(h.results_root.join(&b.result_path).is_file());
}

// ============================================================
// Client-input failures
// ============================================================

#[tokio::test]
async fn graph_without_connectivity_node_is_rejected_before_submission() {
    let h = harness(MockBackend::completing_after(1, video_record()));
    let req = RunRequest::from_json(json!({
        "user_id": "u",
        "ollama_url": "http://h",
        "workflow_json": { "1": { "class_type": "SaveImage", "inputs": {} } },
    }))
    .unwrap();

    let err = h.pipeline.run(req).await.unwrap_err();

    assert!(matches!(err, PipelineError::NoMatchingNode { .. }), "got {err:?}");
    assert!(err.is_client_error());
    assert!(h.backend.submitted().is_empty());
}

#[tokio::test]
async fn missing_user_id_is_rejected_before_submission() {
    let h = harness(MockBackend::completing_after(1, video_record()));
    let req = RunRequest {
        user_id: Some("   ".into()),
        ..request("ignored")
    };

    let err = h.pipeline.run(req).await.unwrap_err();
    assert!(matches!(err, PipelineError::InvalidArgument(_)));
    assert!(h.backend.submitted().is_empty());
}

#[tokio::test(start_paused = true)]
async fn completed_job_without_files_is_no_output() {
    // The record names a file the engine never wrote.
    let h = harness(MockBackend::completing_after(1, video_record()));

    let err = h.pipeline.run(request("u")).await.unwrap_err();
    assert!(matches!(err, PipelineError::NoOutputProduced), "got {err:?}");
}

#[tokio::test(start_paused = true)]
async fn preview_only_outputs_are_no_output() {
    let h = harness(MockBackend::completing_after(
        1,
        record(json!({ "5": { "images": [{ "filename": "p.png", "type": "temp" }] } })),
    ));
    std::fs::write(h.output_root.join("p.png"), b"p").unwrap();

    let err = h.pipeline.run(request("u")).await.unwrap_err();
    assert!(matches!(err, PipelineError::NoOutputProduced));
}

// ============================================================
// Execution failures
// ============================================================

#[tokio::test]
async fn engine_rejection_is_reported() {
    let h = harness(MockBackend::rejecting(400, "prompt has no outputs"));

    let err = h.pipeline.run(request("u")).await.unwrap_err();
    assert!(matches!(err, PipelineError::EngineRejected { status: 400, .. }));
    assert!(!err.is_client_error());
}

#[tokio::test]
async fn unreachable_engine_is_reported() {
    let h = harness(MockBackend::unreachable());

    let err = h.pipeline.run(request("u")).await.unwrap_err();
    assert!(matches!(err, PipelineError::EngineUnreachable(_)));
}

#[tokio::test(start_paused = true)]
async fn never_completing_job_times_out() {
    let h = harness(MockBackend::never_completing());
    let start = tokio::time::Instant::now();

    let err = h.pipeline.run(request("u")).await.unwrap_err();

    assert!(matches!(err, PipelineError::JobTimeout { .. }), "got {err:?}");
    assert!(start.elapsed() >= Duration::from_secs(30));
    assert!(!h.pipeline.is_busy(), "slot must be released after a failure");
}

// ============================================================
// Admission control
// ============================================================

#[tokio::test(start_paused = true)]
async fn concurrent_runs_never_overlap_on_the_engine() {
    let h = harness(MockBackend::completing_after(3, video_record()));
    std::fs::write(h.output_root.join("clip_00001.mp4"), b"x").unwrap();

    let runs: Vec<_> = (0..3)
        .map(|i| {
            let pipeline = h.pipeline.clone();
            tokio::spawn(async move { pipeline.run(request(&format!("user{i}"))).await })
        })
        .collect();

    for run in runs {
        run.await.unwrap().unwrap();
    }

    assert_eq!(h.backend.submitted().len(), 3);
    assert_eq!(h.backend.max_active(), 1);
}

#[tokio::test(start_paused = true)]
async fn dropped_run_releases_the_engine_slot() {
    let h = harness(MockBackend::never_completing());

    let pipeline = h.pipeline.clone();
    let running = tokio::spawn(async move { pipeline.run(request("u")).await });
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(h.pipeline.is_busy());

    running.abort();
    let _ = running.await;
    assert!(!h.pipeline.is_busy());
}
