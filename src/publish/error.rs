// ABOUTME: Error types for publishing, role resolution, alias resolution, and cutover.
// ABOUTME: None of these leave the alias pointing at an unverified version.

use crate::cloud::{CloudError, MissingFieldError};
use crate::types::ArchiveNameError;
use std::path::PathBuf;

/// Errors that can occur during publisher state transitions.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PublishError {
    #[error("archive does not exist: {}", .0.display())]
    ArchiveDoesNotExist(PathBuf),

    #[error(transparent)]
    InvalidArchiveName(#[from] ArchiveNameError),

    #[error("failed to read archive {}: {message}", .path.display())]
    ArchiveUnreadable { path: PathBuf, message: String },

    /// A service response lacked a field the rollout depends on.
    #[error("{source_call} returned a configuration without {field}")]
    InvalidFunctionConfiguration {
        field: &'static str,
        source_call: &'static str,
    },

    #[error("caller account id unavailable: {0}")]
    AccountIdUnavailable(String),

    #[error("role creation returned {received}, expected {expected}")]
    InvalidCreateRoleResponse { expected: String, received: String },

    #[error(transparent)]
    Cloud(#[from] CloudError),

    /// The alias write failed. Traffic stays on the previous version.
    #[error("cutover failed: {0}")]
    CutoverFailed(String),
}

impl From<MissingFieldError> for PublishError {
    fn from(err: MissingFieldError) -> Self {
        PublishError::InvalidFunctionConfiguration {
            field: err.field,
            source_call: err.source_call,
        }
    }
}
