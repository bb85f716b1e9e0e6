// ABOUTME: Explicit context shared by concurrent pipelines.
// ABOUTME: Holds the collaborators, the role locks, and the cancellation signal.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::build::BuildRunner;
use crate::cloud::CloudOps;
use crate::pipeline::CancelSignal;
use crate::publish::RoleLocks;

/// Directory under the output directory that receives compiled binaries
/// and their libraries. Product names never contain a dot, so no staging
/// directory can collide with it.
pub const ARTIFACT_DIR: &str = ".artifacts";

/// Where a run reads sources and writes artifacts.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub project_dir: PathBuf,
    pub output_dir: PathBuf,
    pub artifact_dir: PathBuf,
    pub builder_image: String,
    pub dockerfile: Option<PathBuf>,
}

impl Workspace {
    pub fn new(
        project_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        builder_image: impl Into<String>,
        dockerfile: Option<PathBuf>,
    ) -> Self {
        let output_dir = output_dir.into();
        Self {
            project_dir: project_dir.into(),
            artifact_dir: artifact_dir(&output_dir),
            output_dir,
            builder_image: builder_image.into(),
            dockerfile,
        }
    }
}

/// Artifact directory for an output directory.
pub fn artifact_dir(output_dir: &Path) -> PathBuf {
    output_dir.join(ARTIFACT_DIR)
}

/// Everything a pipeline needs besides its own target.
pub struct DeployContext {
    pub cloud: Arc<dyn CloudOps>,
    pub runner: Arc<dyn BuildRunner>,
    pub workspace: Workspace,
    pub roles: RoleLocks,
    pub cancel: CancelSignal,
}

impl DeployContext {
    pub fn new(
        cloud: Arc<dyn CloudOps>,
        runner: Arc<dyn BuildRunner>,
        workspace: Workspace,
    ) -> Self {
        Self {
            cloud,
            runner,
            workspace,
            roles: RoleLocks::new(),
            cancel: CancelSignal::new(),
        }
    }
}
