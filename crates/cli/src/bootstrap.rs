//! Start-and-ready gate: optionally launch the engine, then wait until it
//! answers its readiness probe.  Nothing is served before this succeeds.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use tokio::process::{Child, Command};
use tracing::info;

use backend::{HttpBackend, HttpBackendConfig};
use pipeline::{wait_until_ready, PipelineConfig, PollConfig, ReadinessConfig, WorkflowPipeline};
use storage::{ArtifactStore, StorageConfig};

use crate::EngineArgs;

/// A ready engine plus the pipeline bound to it.
pub struct Engine {
    pub pipeline: Arc<WorkflowPipeline>,
    /// Killed when dropped.
    _child: Option<Child>,
}

pub async fn start(args: &EngineArgs) -> anyhow::Result<Engine> {
    tokio::fs::create_dir_all(&args.engine_output_dir)
        .await
        .with_context(|| {
            format!(
                "cannot create engine output dir {}",
                args.engine_output_dir.display()
            )
        })?;

    let mut child = match &args.engine_program {
        Some(program) => Some(spawn_engine(program, &args.engine_args)?),
        None => None,
    };

    let backend = Arc::new(HttpBackend::new(HttpBackendConfig {
        base_url: args.engine_url.clone(),
        request_timeout: Duration::from_secs(args.request_timeout_secs),
        ..HttpBackendConfig::default()
    })?);

    let readiness = ReadinessConfig {
        timeout: Duration::from_secs(args.ready_timeout_secs),
        ..ReadinessConfig::default()
    };
    info!(url = %args.engine_url, "waiting for execution engine");

    match child.as_mut() {
        Some(process) => {
            tokio::select! {
                ready = wait_until_ready(backend.as_ref(), &readiness) => {
                    ready.context("execution engine did not start")?;
                }
                status = process.wait() => {
                    bail!("execution engine exited before becoming ready: {status:?}");
                }
            }
        }
        None => wait_until_ready(backend.as_ref(), &readiness)
            .await
            .context("execution engine did not start")?,
    }

    let store = ArtifactStore::new(StorageConfig {
        results_root: args.results_dir.clone(),
        engine_output_root: args.engine_output_dir.clone(),
    });
    let config = PipelineConfig {
        connectivity_marker: args.connectivity_marker.clone(),
        poll: PollConfig {
            interval: Duration::from_millis(args.poll_interval_ms),
            timeout: Duration::from_secs(args.job_timeout_secs),
        },
    };

    Ok(Engine {
        pipeline: Arc::new(WorkflowPipeline::new(backend, store, config)),
        _child: child,
    })
}

fn spawn_engine(program: &Path, args: &[String]) -> anyhow::Result<Child> {
    info!(program = %program.display(), ?args, "launching execution engine");
    Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("failed to launch {}", program.display()))
}
