//! Pipeline error → HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use pipeline::PipelineError;

#[derive(Debug)]
pub struct ApiError(pub PipelineError);

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            e if e.is_client_error() => StatusCode::BAD_REQUEST,
            PipelineError::EngineUnreachable(_)
            | PipelineError::EngineRejected { .. }
            | PipelineError::MalformedResponse(_)
            | PipelineError::EngineNotReady(_) => StatusCode::BAD_GATEWAY,
            PipelineError::JobTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.0.to_string(),
            kind: self.0.kind(),
        };
        (self.status(), Json(body)).into_response()
    }
}
