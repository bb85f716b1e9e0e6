// ABOUTME: Error types for turning a built binary into a deployable archive.
// ABOUTME: Each variant names the packaging step that failed.

use crate::types::ArchiveNameError;
use std::path::PathBuf;

#[derive(Debug, Clone, thiserror::Error)]
pub enum PackageError {
    #[error("built product not found: {}", .0.display())]
    ProductNotFound(PathBuf),

    #[error("failed to stage bootstrap: {}", .0.join("; "))]
    BootstrapFailure(Vec<String>),

    #[error("failed to bundle {} shared libraries: {message}", .dependencies.len())]
    DependencyFailure {
        dependencies: Vec<PathBuf>,
        message: String,
    },

    #[error("failed to write archive: {0}")]
    ArchivingFailure(String),

    #[error("archive missing after packaging: {}", .0.display())]
    ArchiveNotFound(PathBuf),

    #[error(transparent)]
    Naming(#[from] ArchiveNameError),
}
