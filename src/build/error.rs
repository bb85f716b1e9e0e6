// ABOUTME: Error types for manifest inspection and containerized builds.
// ABOUTME: Build failures are never retried; they surface with the product they concern.

use crate::types::ProductName;
use std::path::PathBuf;

#[derive(Debug, Clone, thiserror::Error)]
pub enum BuildError {
    #[error("manifest declares no executable products")]
    MissingProducts,

    #[error("failed to read package manifest: {0}")]
    PackageDumpFailure(String),

    #[error("dockerfile not found: {}", .0.display())]
    InvalidDockerfilePath(PathBuf),

    #[error("build of {0} reported success but produced no binary")]
    BuiltProductNotFound(ProductName),

    #[error("build of {product} exited with status {exit_code}:\n{output}")]
    BuildFailed {
        product: ProductName,
        exit_code: i64,
        output: String,
    },

    #[error("container runtime error: {0}")]
    Container(String),
}
