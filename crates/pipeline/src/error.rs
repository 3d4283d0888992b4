//! Pipeline-level error types.

use std::time::Duration;

use thiserror::Error;

use backend::BackendError;
use storage::StorageError;

/// Every way a run request can fail.  Each variant is terminal for the
/// request; nothing here is retried by the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    // ------ Client-input errors ------

    /// A request field was missing, empty, or of the wrong shape.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The graph has no node that consumes the injected endpoint.
    #[error("no {marker} node found in workflow_json")]
    NoMatchingNode { marker: String },

    /// The job completed but produced no file that could be stored.
    #[error("workflow completed but no output files were found")]
    NoOutputProduced,

    // ------ Execution errors ------

    #[error("execution engine unreachable: {0}")]
    EngineUnreachable(String),

    #[error("execution engine rejected the workflow (status {status}): {body}")]
    EngineRejected { status: u16, body: String },

    #[error("malformed engine response: {0}")]
    MalformedResponse(String),

    /// No complete record appeared before the polling deadline.
    #[error("job {prompt_id} did not complete within {timeout:?}")]
    JobTimeout { prompt_id: String, timeout: Duration },

    /// The readiness probe never succeeded during bootstrap.
    #[error("execution engine did not become ready within {0:?}")]
    EngineNotReady(Duration),

    #[error("storage error: {0}")]
    Storage(#[source] StorageError),
}

impl PipelineError {
    /// `true` when the caller sent a bad request rather than the pipeline
    /// failing to execute it.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument(_) | Self::NoMatchingNode { .. } | Self::NoOutputProduced
        )
    }

    /// Stable machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::NoMatchingNode { .. } => "no_matching_node",
            Self::NoOutputProduced => "no_output_produced",
            Self::EngineUnreachable(_) => "engine_unreachable",
            Self::EngineRejected { .. } => "engine_rejected",
            Self::MalformedResponse(_) => "malformed_response",
            Self::JobTimeout { .. } => "job_timeout",
            Self::EngineNotReady(_) => "engine_not_ready",
            Self::Storage(_) => "storage",
        }
    }
}

impl From<BackendError> for PipelineError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Unreachable(msg) => Self::EngineUnreachable(msg),
            BackendError::Rejected { status, body } => Self::EngineRejected { status, body },
            BackendError::MalformedResponse(msg) => Self::MalformedResponse(msg),
        }
    }
}

impl From<StorageError> for PipelineError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidComponent(msg) => Self::InvalidArgument(msg),
            other => Self::Storage(other),
        }
    }
}
