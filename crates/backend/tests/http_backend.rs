//! `HttpBackend` against an in-process stub engine bound to `127.0.0.1:0`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use backend::{Backend, BackendError, HttpBackend, HttpBackendConfig, JobHandle, WorkflowGraph};

#[derive(Clone, Default)]
struct StubState {
    submitted: Arc<Mutex<Vec<Value>>>,
}

async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub engine");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn backend_for(base_url: String) -> HttpBackend {
    HttpBackend::new(HttpBackendConfig {
        base_url,
        request_timeout: Duration::from_secs(5),
        probe_timeout: Duration::from_secs(1),
    })
    .expect("client builds")
}

fn graph() -> WorkflowGraph {
    WorkflowGraph::from_value(json!({ "1": { "class_type": "OllamaConnectivityV2", "inputs": {} } }))
        .unwrap()
}

fn happy_engine(state: StubState) -> Router {
    Router::new()
        .route("/system_stats", get(|| async { Json(json!({ "system": {} })) }))
        .route(
            "/prompt",
            post(|State(state): State<StubState>, Json(body): Json<Value>| async move {
                state.submitted.lock().unwrap().push(body);
                Json(json!({ "prompt_id": "abc123", "number": 0, "node_errors": {} }))
            }),
        )
        .route(
            "/history/:id",
            get(|Path(id): Path<String>| async move {
                if id == "abc123" {
                    Json(json!({
                        "abc123": {
                            "outputs": {
                                "9": { "gifs": [{ "filename": "out.mp4", "subfolder": "", "type": "output" }] }
                            }
                        }
                    }))
                } else {
                    Json(json!({}))
                }
            }),
        )
        .with_state(state)
}

#[tokio::test]
async fn submit_posts_prompt_and_client_id() {
    let state = StubState::default();
    let backend = backend_for(spawn_stub(happy_engine(state.clone())).await);

    let handle = backend.submit(&graph(), "client-1").await.expect("submit succeeds");
    assert_eq!(handle.as_str(), "abc123");

    let submitted = state.submitted.lock().unwrap().clone();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0]["client_id"], "client-1");
    assert_eq!(submitted[0]["prompt"]["1"]["class_type"], "OllamaConnectivityV2");
}

#[tokio::test]
async fn history_returns_record_only_for_known_handle() {
    let backend = backend_for(spawn_stub(happy_engine(StubState::default())).await);

    let record = backend
        .history(&JobHandle::new("abc123"))
        .await
        .expect("history ok")
        .expect("record present");
    assert!(record.outputs.contains_key("9"));

    let pending = backend.history(&JobHandle::new("other")).await.expect("history ok");
    assert!(pending.is_none());
}

#[tokio::test]
async fn system_stats_succeeds_on_ready_engine() {
    let backend = backend_for(spawn_stub(happy_engine(StubState::default())).await);
    backend.system_stats().await.expect("engine ready");
}

#[tokio::test]
async fn non_2xx_submission_is_rejected() {
    let router = Router::new().route(
        "/prompt",
        post(|| async { (StatusCode::BAD_REQUEST, "invalid prompt") }),
    );
    let backend = backend_for(spawn_stub(router).await);

    let err = backend.submit(&graph(), "c").await.unwrap_err();
    assert_eq!(
        err,
        BackendError::Rejected {
            status: 400,
            body: "invalid prompt".into()
        }
    );
}

#[tokio::test]
async fn missing_prompt_id_is_malformed() {
    let router = Router::new().route("/prompt", post(|| async { Json(json!({ "number": 1 })) }));
    let backend = backend_for(spawn_stub(router).await);

    let err = backend.submit(&graph(), "c").await.unwrap_err();
    assert!(matches!(err, BackendError::MalformedResponse(_)), "got {err:?}");
}

#[tokio::test]
async fn closed_port_is_unreachable() {
    // Bind then drop to obtain a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = backend_for(format!("http://{addr}"));
    let err = backend.submit(&graph(), "c").await.unwrap_err();
    assert!(matches!(err, BackendError::Unreachable(_)), "got {err:?}");
}

#[test]
fn trailing_slash_is_trimmed() {
    let backend = backend_for("http://127.0.0.1:8188/".into());
    assert_eq!(backend.base_url(), "http://127.0.0.1:8188");
}
