// ABOUTME: Application-wide error types for lamina.
// ABOUTME: Uses thiserror for ergonomic error handling; stage errors convert via From.

use std::path::PathBuf;
use thiserror::Error;

use crate::build::BuildError;
use crate::invoke::InvokeError;
use crate::package::PackageError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("no function configured for product: {0}")]
    UnknownProduct(String),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{failed} of {total} deployments did not cut over")]
    DeploymentsFailed { failed: usize, total: usize },

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Package(#[from] PackageError),

    #[error(transparent)]
    Invoke(#[from] InvokeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
