//! `workflow-relay` CLI entry-point.
//!
//! Available sub-commands:
//! - `serve`    — wait for the execution engine, then start the API server.
//! - `run`      — execute one run request from a JSON file and print the response.
//! - `sanitize` — print the storage-safe form of an identifier.

mod bootstrap;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pipeline::{RunRequest, DEFAULT_CONNECTIVITY_MARKER};

#[derive(Parser)]
#[command(
    name = "workflow-relay",
    about = "Runs generative workflows on a local execution engine and stores their artifacts",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the REST API server once the engine is ready.
    Serve {
        #[arg(long, env = "RELAY_BIND", default_value = "0.0.0.0:8080")]
        bind: String,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Run a single request body (JSON file) through the pipeline.
    Run {
        /// Path to a JSON file shaped like the `POST /run` body.
        request: PathBuf,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Print the sanitized form of an identifier.
    Sanitize { value: String },
}

/// Everything needed to reach the engine and store its outputs.
#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    /// Base URL of the execution engine.
    #[arg(long, env = "ENGINE_URL", default_value = "http://127.0.0.1:8188")]
    pub engine_url: String,

    /// Directory the engine writes its outputs into.
    #[arg(long, env = "ENGINE_OUTPUT_DIR")]
    pub engine_output_dir: PathBuf,

    /// Root of the durable results volume.
    #[arg(long, env = "RESULTS_DIR", default_value = "/results")]
    pub results_dir: PathBuf,

    #[arg(long, default_value_t = 3600)]
    pub job_timeout_secs: u64,

    #[arg(long, default_value_t = 2000)]
    pub poll_interval_ms: u64,

    /// Timeout of each submission/history request.
    #[arg(long, default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// How long to wait for the engine's readiness probe at start-up.
    #[arg(long, default_value_t = 240)]
    pub ready_timeout_secs: u64,

    /// `class_type` substring of the nodes that receive `ollama_url`.
    #[arg(long, default_value = DEFAULT_CONNECTIVITY_MARKER)]
    pub connectivity_marker: String,

    /// Engine executable to launch as a child process.  Omit when the engine
    /// is managed elsewhere.
    #[arg(long, env = "ENGINE_PROGRAM")]
    pub engine_program: Option<PathBuf>,

    /// Argument passed to `--engine-program` (repeatable).
    #[arg(long = "engine-arg", allow_hyphen_values = true)]
    pub engine_args: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { bind, engine } => {
            let engine = bootstrap::start(&engine).await?;
            info!("Starting API server on {bind}");
            api::serve(
                &bind,
                api::AppState {
                    pipeline: engine.pipeline.clone(),
                },
            )
            .await
            .with_context(|| format!("API server on {bind} failed"))?;
        }
        Command::Run { request, engine } => {
            let content = tokio::fs::read_to_string(&request)
                .await
                .with_context(|| format!("cannot read request file {}", request.display()))?;
            let body: serde_json::Value = serde_json::from_str(&content)
                .with_context(|| format!("invalid JSON in {}", request.display()))?;
            let request = RunRequest::from_json(body)?;

            let engine = bootstrap::start(&engine).await?;
            let response = engine.pipeline.run(request).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Sanitize { value } => {
            println!("{}", storage::sanitize(&value)?);
        }
    }

    Ok(())
}
