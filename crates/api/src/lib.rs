//! `api` crate — HTTP surface of the relay.
//!
//! Exposes:
//!   POST   /run      run one workflow request synchronously
//!   GET    /health   liveness (the listener only binds once the engine is ready)

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use pipeline::WorkflowPipeline;

pub mod error;
pub mod handlers;

pub use error::ApiError;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<WorkflowPipeline>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/run", post(handlers::run::run))
        .route("/health", get(handlers::health::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `bind` and serve until the process is stopped.
pub async fn serve(bind: &str, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await
}
