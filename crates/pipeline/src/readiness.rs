//! Start-up readiness gate: wait for the engine to answer its probe.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use backend::Backend;

use crate::PipelineError;

#[derive(Debug, Clone)]
pub struct ReadinessConfig {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(240),
        }
    }
}

/// Probe `backend` until it reports ready.
///
/// # Errors
/// [`PipelineError::EngineNotReady`] if the engine never answers within
/// `config.timeout`.  The caller must not serve requests in that case.
pub async fn wait_until_ready(
    backend: &dyn Backend,
    config: &ReadinessConfig,
) -> Result<(), PipelineError> {
    let start = Instant::now();
    let deadline = start + config.timeout;

    while Instant::now() < deadline {
        match backend.system_stats().await {
            Ok(()) => {
                info!(waited = ?start.elapsed(), "execution engine is ready");
                return Ok(());
            }
            Err(e) => debug!(error = %e, "execution engine not ready"),
        }
        sleep(config.interval).await;
    }

    Err(PipelineError::EngineNotReady(config.timeout))
}
