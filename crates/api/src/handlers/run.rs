use axum::extract::State;
use axum::Json;
use serde_json::Value;
use tracing::warn;

use pipeline::{RunRequest, RunResponse};

use crate::{ApiError, AppState};

/// `POST /run` — blocks until the job's artifacts are stored.
///
/// The body is taken as raw JSON so malformed fields surface as
/// `invalid_argument` rather than axum's generic rejection.
pub async fn run(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<RunResponse>, ApiError> {
    let request = RunRequest::from_json(body)?;

    match state.pipeline.run(request).await {
        Ok(response) => Ok(Json(response)),
        Err(err) => {
            warn!(kind = err.kind(), error = %err, "run failed");
            Err(err.into())
        }
    }
}
