//! `pipeline` crate — the submit → poll → extract → materialize pipeline.
//!
//! [`WorkflowPipeline`] is the entry point: it validates a [`RunRequest`],
//! injects the per-request endpoint into the graph, drives the engine through
//! the [`backend::Backend`] trait, and hands the produced files to
//! [`storage::ArtifactStore`].  Each step lives in its own module so it can be
//! tested in isolation.

pub mod error;
pub mod extract;
pub mod gate;
pub mod inject;
pub mod executor;
pub mod poller;
pub mod readiness;
pub mod request;
pub mod select;

pub use error::PipelineError;
pub use extract::extract;
pub use gate::AdmissionGate;
pub use inject::{inject, DEFAULT_CONNECTIVITY_MARKER};
pub use executor::{PipelineConfig, WorkflowPipeline};
pub use poller::{await_completion, PollConfig};
pub use readiness::{wait_until_ready, ReadinessConfig};
pub use request::{RunRequest, RunResponse, ValidatedRequest};
pub use select::pick_primary;

#[cfg(test)]
mod pipeline_tests;
