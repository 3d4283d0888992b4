//! Single-slot admission control in front of the shared engine.

use tokio::sync::{Semaphore, SemaphorePermit};

use crate::PipelineError;

/// Admits at most `slots` jobs at a time; callers beyond that wait in FIFO
/// order.  The pipeline uses one slot because the engine runs one graph at a
/// time with no per-job isolation.
pub struct AdmissionGate {
    semaphore: Semaphore,
}

impl AdmissionGate {
    pub fn new(slots: usize) -> Self {
        Self {
            semaphore: Semaphore::new(slots),
        }
    }

    pub fn single() -> Self {
        Self::new(1)
    }

    /// Wait for a free slot.  The slot is released when the permit drops,
    /// including when the waiting or running future is cancelled.
    pub async fn admit(&self) -> Result<SemaphorePermit<'_>, PipelineError> {
        self.semaphore
            .acquire()
            .await
            .map_err(|_| PipelineError::EngineUnreachable("admission gate closed".into()))
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}
