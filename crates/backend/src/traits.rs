//! The `Backend` trait — the contract the pipeline needs from an engine.

use async_trait::async_trait;

use crate::{BackendError, CompletionRecord, JobHandle, WorkflowGraph};

/// A single execution engine reachable by the pipeline.
///
/// Implementations must put an explicit timeout on every call; none of these
/// methods may block indefinitely.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Readiness probe (`GET /system_stats`).  `Ok(())` means the engine
    /// accepts work.
    async fn system_stats(&self) -> Result<(), BackendError>;

    /// Submit a graph (`POST /prompt`) and return the engine's job handle.
    ///
    /// `client_id` is only used by the engine to multiplex its own event
    /// stream.
    async fn submit(
        &self,
        graph: &WorkflowGraph,
        client_id: &str,
    ) -> Result<JobHandle, BackendError>;

    /// Fetch the history entry for `handle` (`GET /history/{handle}`).
    ///
    /// Returns `Ok(None)` while the job has not produced a complete record.
    async fn history(&self, handle: &JobHandle) -> Result<Option<CompletionRecord>, BackendError>;
}
