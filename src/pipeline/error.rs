// ABOUTME: Pipeline error type with SNAFU pattern.
// ABOUTME: Wraps stage errors with the product they concern and classifies them by kind.

use snafu::Snafu;

use crate::build::BuildError;
use crate::invoke::InvokeError;
use crate::package::PackageError;
use crate::publish::{DeploymentReport, PublishError};

/// Failure of one deployment target.
/// Cloneable so one shared build can fail every target that waits on it.
#[derive(Debug, Clone, Snafu)]
#[snafu(visibility(pub))]
pub enum PipelineError {
    #[snafu(display("{product}: build failed: {source}"))]
    Build { product: String, source: BuildError },

    #[snafu(display("{product}: packaging failed: {source}"))]
    Package {
        product: String,
        source: PackageError,
    },

    #[snafu(display("{product}: publish failed: {source}"))]
    Publish {
        product: String,
        source: PublishError,
    },

    /// Payload could not be loaded, or the new version failed verification.
    /// `report` is set when a published version was rolled back.
    #[snafu(display("{product}: {source}"))]
    Invoke {
        product: String,
        source: InvokeError,
        report: Option<Box<DeploymentReport>>,
    },

    /// The alias write failed after verification; traffic did not move.
    #[snafu(display("{product}: {source}"))]
    Cutover {
        product: String,
        source: PublishError,
        report: Box<DeploymentReport>,
    },

    #[snafu(display("{product}: cancelled during {stage}"))]
    Cancelled {
        product: String,
        stage: &'static str,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineErrorKind {
    /// Rejected before any remote mutation.
    Validation,
    /// Build or packaging failed; no remote call was made.
    BuildPackage,
    /// Remote state is partially changed; a new version may be orphaned.
    RemoteState,
    /// Invocation or verification blocked the cutover.
    Invocation,
    /// Cancelled or timed out before cutover.
    Cancelled,
}

impl PipelineError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> PipelineErrorKind {
        use PipelineErrorKind::*;

        match self {
            PipelineError::Build { source, .. } => match source {
                BuildError::MissingProducts | BuildError::InvalidDockerfilePath(_) => Validation,
                _ => BuildPackage,
            },
            PipelineError::Package { .. } => BuildPackage,
            PipelineError::Publish { source, .. } => match source {
                PublishError::ArchiveDoesNotExist(_)
                | PublishError::InvalidArchiveName(_)
                | PublishError::ArchiveUnreadable { .. } => Validation,
                _ => RemoteState,
            },
            PipelineError::Invoke { source, .. } => match source {
                InvokeError::EmptyPayloadFile(_) | InvokeError::PayloadUnreadable { .. } => {
                    Validation
                }
                _ => Invocation,
            },
            PipelineError::Cutover { .. } => RemoteState,
            PipelineError::Cancelled { .. } => Cancelled,
        }
    }

    /// Product this error concerns.
    pub fn product(&self) -> &str {
        match self {
            PipelineError::Build { product, .. }
            | PipelineError::Package { product, .. }
            | PipelineError::Publish { product, .. }
            | PipelineError::Invoke { product, .. }
            | PipelineError::Cutover { product, .. }
            | PipelineError::Cancelled { product, .. } => product,
        }
    }

    /// Rollback report, when a published version was abandoned.
    pub fn report(&self) -> Option<&DeploymentReport> {
        match self {
            PipelineError::Invoke { report, .. } => report.as_deref(),
            PipelineError::Cutover { report, .. } => Some(&**report),
            _ => None,
        }
    }

    /// Whether a caller-level retry may help.
    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineError::Invoke { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}
