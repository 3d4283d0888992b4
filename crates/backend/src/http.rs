//! reqwest-backed `Backend` for an engine listening on a local HTTP port.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::types::{SubmitPayload, SubmitResponse};
use crate::{Backend, BackendError, CompletionRecord, JobHandle, WorkflowGraph};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Connection settings for [`HttpBackend`].
#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    /// Base address of the engine, e.g. `http://127.0.0.1:8188`.
    pub base_url: String,
    /// Timeout applied to submission and history requests.
    pub request_timeout: Duration,
    /// Shorter timeout for the readiness probe.
    pub probe_timeout: Duration,
}

impl Default for HttpBackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8188".to_string(),
            request_timeout: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(2),
        }
    }
}

// ---------------------------------------------------------------------------
// HttpBackend
// ---------------------------------------------------------------------------

pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    probe_timeout: Duration,
}

impl HttpBackend {
    pub fn new(config: HttpBackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| BackendError::Unreachable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            probe_timeout: config.probe_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Transport-level failures all mean the engine could not be reached in time.
fn transport_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Unreachable(format!("request timed out: {err}"))
    } else {
        BackendError::Unreachable(err.to_string())
    }
}

async fn reject(response: reqwest::Response) -> BackendError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    BackendError::Rejected { status, body }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn system_stats(&self) -> Result<(), BackendError> {
        let response = self
            .client
            .get(self.url("/system_stats"))
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(reject(response).await)
        }
    }

    #[instrument(skip(self, graph), fields(nodes = graph.len()))]
    async fn submit(
        &self,
        graph: &WorkflowGraph,
        client_id: &str,
    ) -> Result<JobHandle, BackendError> {
        let payload = SubmitPayload {
            prompt: graph,
            client_id,
        };

        let response = self
            .client
            .post(self.url("/prompt"))
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(reject(response).await);
        }

        let body = response.text().await.map_err(transport_error)?;
        let parsed: SubmitResponse = serde_json::from_str(&body)
            .map_err(|e| BackendError::MalformedResponse(format!("missing prompt_id: {e}")))?;

        debug!(prompt_id = %parsed.prompt_id, "graph accepted by engine");
        Ok(JobHandle::new(parsed.prompt_id))
    }

    async fn history(&self, handle: &JobHandle) -> Result<Option<CompletionRecord>, BackendError> {
        let response = self
            .client
            .get(self.url(&format!("/history/{handle}")))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(reject(response).await);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;

        Ok(CompletionRecord::from_history_entry(body.get(handle.as_str())))
    }
}
