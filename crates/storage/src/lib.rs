//! `storage` crate — durable, per-user/per-job artifact storage.
//!
//! Provides the path sanitizer used for every storage path component and the
//! [`ArtifactStore`] that copies engine outputs into the shared results
//! volume.  No pipeline orchestration lives here.

pub mod error;
pub mod models;
pub mod sanitize;
pub mod store;

pub use error::StorageError;
pub use models::OutputFileDescriptor;
pub use sanitize::{sanitize, MAX_COMPONENT_LEN};
pub use store::{ArtifactStore, StorageConfig};
