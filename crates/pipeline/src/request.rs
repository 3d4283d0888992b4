//! Inbound run request and its response.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use backend::WorkflowGraph;

use crate::PipelineError;

/// Body of `POST /run`, as received.
///
/// Every field is optional at this stage so that a missing field is reported
/// by [`RunRequest::validate`] with a precise message instead of a generic
/// deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub ollama_url: Option<String>,
    #[serde(default)]
    pub workflow_json: Option<Value>,
}

/// A request whose fields have been checked and trimmed.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub user_id: String,
    pub endpoint: String,
    pub graph: WorkflowGraph,
}

impl RunRequest {
    /// Parse a raw JSON body.
    pub fn from_json(body: Value) -> Result<Self, PipelineError> {
        serde_json::from_value(body)
            .map_err(|e| PipelineError::InvalidArgument(format!("malformed request body: {e}")))
    }

    /// # Errors
    /// [`PipelineError::InvalidArgument`] for an empty `user_id` or
    /// `ollama_url`, or a `workflow_json` that is not an object.
    pub fn validate(self) -> Result<ValidatedRequest, PipelineError> {
        let user_id = required(self.user_id, "user_id")?;
        let endpoint = required(self.ollama_url, "ollama_url")?;
        let graph = self
            .workflow_json
            .and_then(WorkflowGraph::from_value)
            .ok_or_else(|| {
                PipelineError::InvalidArgument(
                    "missing required field: workflow_json (object)".into(),
                )
            })?;

        Ok(ValidatedRequest {
            user_id,
            endpoint,
            graph,
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, PipelineError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(PipelineError::InvalidArgument(format!(
            "missing required field: {field}"
        ))),
    }
}

/// Successful run result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResponse {
    /// Sanitized form of the caller's user id.
    pub user_id: String,
    pub job_id: String,
    pub prompt_id: String,
    /// The primary artifact, relative to the results root.
    pub result_path: String,
    pub stored_paths: Vec<String>,
}
