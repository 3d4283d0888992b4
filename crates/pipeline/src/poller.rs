//! Completion polling against the engine's history endpoint.

use std::time::Duration;

use tokio::time::{sleep, timeout_at, Instant};
use tracing::{debug, instrument, warn};

use backend::{Backend, CompletionRecord, JobHandle};

use crate::PipelineError;

#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Pause between two history queries.
    pub interval: Duration,
    /// Overall deadline measured from the first query.
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            timeout: Duration::from_secs(60 * 60),
        }
    }
}

/// Query the engine until it reports a complete record for `handle`.
///
/// Failed queries count as "not ready yet"; only the deadline ends the wait.
/// No query is allowed to run past the deadline.
///
/// # Errors
/// [`PipelineError::JobTimeout`] once `config.timeout` has elapsed.
#[instrument(skip(backend, handle, config), fields(prompt_id = %handle))]
pub async fn await_completion(
    backend: &dyn Backend,
    handle: &JobHandle,
    config: &PollConfig,
) -> Result<CompletionRecord, PipelineError> {
    let deadline = Instant::now() + config.timeout;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        match timeout_at(deadline, backend.history(handle)).await {
            Ok(Ok(Some(record))) => {
                debug!(attempt, "job complete");
                return Ok(record);
            }
            Ok(Ok(None)) => debug!(attempt, "job not complete yet"),
            Ok(Err(e)) => warn!(attempt, error = %e, "history query failed, will retry"),
            Err(_) => debug!(attempt, "history query cut off by deadline"),
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(PipelineError::JobTimeout {
                prompt_id: handle.to_string(),
                timeout: config.timeout,
            });
        }
        sleep(config.interval.min(deadline - now)).await;
    }
}
