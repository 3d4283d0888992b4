//! Backend-level error type.

use thiserror::Error;

/// Errors returned by a [`crate::Backend`] call.
///
/// The pipeline maps each variant onto its own taxonomy; the poller treats
/// every variant as "not ready yet" until its deadline runs out.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Connection refused, DNS failure, or the request timed out.
    #[error("execution engine unreachable: {0}")]
    Unreachable(String),

    /// The engine answered with a non-2xx status.
    #[error("execution engine rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The engine answered 2xx but the body could not be understood.
    #[error("malformed engine response: {0}")]
    MalformedResponse(String),
}
