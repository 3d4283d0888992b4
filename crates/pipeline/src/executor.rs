//! Workflow run executor.
//!
//! `WorkflowPipeline` is the central orchestrator for one run request:
//! 1. Validates the request and injects the endpoint into the graph.
//! 2. Waits for the single engine slot (admission gate).
//! 3. Submits the graph and polls until the engine reports outputs.
//! 4. Extracts output descriptors and materializes them into storage.
//! 5. Picks the primary artifact.
//!
//! Any failure aborts the run; there is no partial-success response.

use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use backend::Backend;
use storage::ArtifactStore;

use crate::{
    await_completion, extract, inject, pick_primary, AdmissionGate, PipelineError, PollConfig,
    RunRequest, RunResponse, ValidatedRequest, DEFAULT_CONNECTIVITY_MARKER,
};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// `class_type` substring of nodes that receive the endpoint.
    pub connectivity_marker: String,
    pub poll: PollConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            connectivity_marker: DEFAULT_CONNECTIVITY_MARKER.to_string(),
            poll: PollConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// WorkflowPipeline
// ---------------------------------------------------------------------------

/// One pipeline per engine instance.  Share it behind an `Arc`; concurrent
/// calls to [`WorkflowPipeline::run`] are serialized by its admission gate.
pub struct WorkflowPipeline {
    backend: Arc<dyn Backend>,
    store: ArtifactStore,
    config: PipelineConfig,
    gate: AdmissionGate,
}

impl WorkflowPipeline {
    pub fn new(backend: Arc<dyn Backend>, store: ArtifactStore, config: PipelineConfig) -> Self {
        Self {
            backend,
            store,
            config,
            gate: AdmissionGate::single(),
        }
    }

    /// `true` while a job holds the engine.
    pub fn is_busy(&self) -> bool {
        self.gate.available() == 0
    }

    /// Run one request end to end.
    ///
    /// # Errors
    /// Client-input failures (`InvalidArgument`, `NoMatchingNode`,
    /// `NoOutputProduced`) or execution failures (engine, timeout, storage).
    pub async fn run(&self, request: RunRequest) -> Result<RunResponse, PipelineError> {
        let request = request.validate()?;
        let job_id = Uuid::new_v4().simple().to_string();
        self.execute(job_id, request).await
    }

    #[instrument(skip_all, fields(job_id = %job_id))]
    async fn execute(
        &self,
        job_id: String,
        request: ValidatedRequest,
    ) -> Result<RunResponse, PipelineError> {
        let ValidatedRequest {
            user_id,
            endpoint,
            mut graph,
        } = request;

        let user_safe = storage::sanitize(&user_id)?;

        let injected = inject(&mut graph, &self.config.connectivity_marker, &endpoint);
        if injected == 0 {
            return Err(PipelineError::NoMatchingNode {
                marker: self.config.connectivity_marker.clone(),
            });
        }
        info!(injected, nodes = graph.len(), "endpoint injected");

        let _permit = self.gate.admit().await?;

        let client_id = Uuid::new_v4().simple().to_string();
        let handle = self.backend.submit(&graph, &client_id).await?;
        info!(prompt_id = %handle, "workflow submitted");

        let record = await_completion(self.backend.as_ref(), &handle, &self.config.poll).await?;

        let descriptors = extract(&record);
        info!(prompt_id = %handle, files = descriptors.len(), "job completed");

        let stored_paths = self.store.materialize(&user_id, &job_id, &descriptors).await?;

        let result_path = pick_primary(&stored_paths)
            .ok_or(PipelineError::NoOutputProduced)?
            .to_string();

        info!(prompt_id = %handle, result_path = %result_path, "run succeeded");

        Ok(RunResponse {
            user_id: user_safe,
            job_id,
            prompt_id: handle.to_string(),
            result_path,
            stored_paths,
        })
    }
}
