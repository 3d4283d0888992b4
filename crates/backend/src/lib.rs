//! `backend` crate — the execution-engine collaborator.
//!
//! The pipeline never talks HTTP itself; it goes through the [`Backend`]
//! trait.  [`HttpBackend`] is the production implementation that speaks to a
//! locally running engine, and [`mock::MockBackend`] is a scripted test double.

pub mod error;
pub mod http;
pub mod mock;
pub mod traits;
pub mod types;

pub use error::BackendError;
pub use http::{HttpBackend, HttpBackendConfig};
pub use traits::Backend;
pub use types::{CompletionRecord, JobHandle, WorkflowGraph};
