//! `MockBackend` — a scripted test double for `Backend`.
//!
//! Useful wherever a real engine process is unavailable: pipeline unit tests,
//! API router tests, and local dry runs.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{Backend, BackendError, CompletionRecord, JobHandle, WorkflowGraph};

/// What the mock does with a submitted job.
#[derive(Debug, Clone)]
pub enum MockBehaviour {
    /// Accept the job and report `record` on the `polls`-th history query.
    CompleteAfter {
        polls: usize,
        record: CompletionRecord,
    },
    /// Accept the job and never report it as complete.
    NeverComplete,
    /// Refuse the submission with the given status.
    RejectSubmit { status: u16, body: String },
    /// Behave like a dead socket on every call.
    Unreachable,
}

#[derive(Debug, Default)]
struct MockState {
    submitted: Vec<WorkflowGraph>,
    client_ids: Vec<String>,
    history_calls: usize,
    probe_calls: usize,
    polls_per_job: HashMap<JobHandle, usize>,
    transient_failures_left: usize,
    active: usize,
    max_active: usize,
}

/// A mock engine that records every call it receives.
pub struct MockBackend {
    behaviour: MockBehaviour,
    /// Number of failed probes before `system_stats` succeeds; `None` never does.
    ready_after: Option<usize>,
    state: Mutex<MockState>,
}

impl MockBackend {
    pub fn new(behaviour: MockBehaviour) -> Self {
        Self {
            behaviour,
            ready_after: Some(0),
            state: Mutex::new(MockState::default()),
        }
    }

    /// Complete every job on its `polls`-th history query with `record`.
    pub fn completing_after(polls: usize, record: CompletionRecord) -> Self {
        Self::new(MockBehaviour::CompleteAfter { polls, record })
    }

    pub fn never_completing() -> Self {
        Self::new(MockBehaviour::NeverComplete)
    }

    pub fn rejecting(status: u16, body: impl Into<String>) -> Self {
        Self::new(MockBehaviour::RejectSubmit {
            status,
            body: body.into(),
        })
    }

    pub fn unreachable() -> Self {
        Self::new(MockBehaviour::Unreachable)
    }

    /// Fail the first `n` history queries with a transport error.
    pub fn with_transient_failures(self, n: usize) -> Self {
        self.state.lock().unwrap().transient_failures_left = n;
        self
    }

    /// Fail the first `n` readiness probes; `None` means never ready.
    pub fn with_ready_after(mut self, n: Option<usize>) -> Self {
        self.ready_after = n;
        self
    }

    /// Every graph submitted so far, in call order.
    pub fn submitted(&self) -> Vec<WorkflowGraph> {
        self.state.lock().unwrap().submitted.clone()
    }

    pub fn client_ids(&self) -> Vec<String> {
        self.state.lock().unwrap().client_ids.clone()
    }

    pub fn history_calls(&self) -> usize {
        self.state.lock().unwrap().history_calls
    }

    pub fn probe_calls(&self) -> usize {
        self.state.lock().unwrap().probe_calls
    }

    /// Highest number of submitted-but-unfinished jobs seen at once.
    pub fn max_active(&self) -> usize {
        self.state.lock().unwrap().max_active
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn system_stats(&self) -> Result<(), BackendError> {
        let mut state = self.state.lock().unwrap();
        state.probe_calls += 1;

        if matches!(self.behaviour, MockBehaviour::Unreachable) {
            return Err(BackendError::Unreachable("connection refused".into()));
        }
        match self.ready_after {
            Some(n) if state.probe_calls > n => Ok(()),
            _ => Err(BackendError::Unreachable("engine still starting".into())),
        }
    }

    async fn submit(
        &self,
        graph: &WorkflowGraph,
        client_id: &str,
    ) -> Result<JobHandle, BackendError> {
        let mut state = self.state.lock().unwrap();

        match &self.behaviour {
            MockBehaviour::Unreachable => {
                return Err(BackendError::Unreachable("connection refused".into()))
            }
            MockBehaviour::RejectSubmit { status, body } => {
                return Err(BackendError::Rejected {
                    status: *status,
                    body: body.clone(),
                })
            }
            _ => {}
        }

        state.submitted.push(graph.clone());
        state.client_ids.push(client_id.to_owned());
        state.active += 1;
        state.max_active = state.max_active.max(state.active);

        let handle = JobHandle::new(format!("prompt-{}", state.submitted.len()));
        state.polls_per_job.insert(handle.clone(), 0);
        Ok(handle)
    }

    async fn history(&self, handle: &JobHandle) -> Result<Option<CompletionRecord>, BackendError> {
        let mut state = self.state.lock().unwrap();
        state.history_calls += 1;

        if matches!(self.behaviour, MockBehaviour::Unreachable) {
            return Err(BackendError::Unreachable("connection refused".into()));
        }
        if state.transient_failures_left > 0 {
            state.transient_failures_left -= 1;
            return Err(BackendError::Rejected {
                status: 503,
                body: "busy".into(),
            });
        }

        let Some(polls) = state.polls_per_job.get_mut(handle) else {
            return Ok(None);
        };
        *polls += 1;
        let seen = *polls;

        match &self.behaviour {
            MockBehaviour::CompleteAfter { polls, record } if seen >= *polls => {
                // Only the first completing query frees the engine slot.
                if seen == *polls {
                    state.active = state.active.saturating_sub(1);
                }
                Ok(Some(record.clone()))
            }
            _ => Ok(None),
        }
    }
}
