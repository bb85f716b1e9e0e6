// ABOUTME: In-memory stand-ins for the manifest reader and the build runner.
// ABOUTME: The fake runner writes placeholder binaries and libraries instead of starting a container.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;

use crate::build::{BuildError, BuildOutput, BuildRequest, BuildRunner, ManifestReader, ManifestTarget};
use crate::cloud::traits::sealed::Sealed;

/// Manifest reader returning fixed targets.
#[derive(Debug, Clone, Default)]
pub struct FakeManifestReader {
    targets: Vec<ManifestTarget>,
    failure: Option<String>,
}

impl FakeManifestReader {
    /// Reader declaring one executable per name.
    pub fn with_executables(names: &[&str]) -> Self {
        Self {
            targets: names
                .iter()
                .map(|n| ManifestTarget {
                    name: n.to_string(),
                    kinds: vec!["bin".to_string()],
                })
                .collect(),
            failure: None,
        }
    }

    /// Add a library target.
    pub fn with_library(mut self, name: &str) -> Self {
        self.targets.push(ManifestTarget {
            name: name.to_string(),
            kinds: vec!["lib".to_string()],
        });
        self
    }

    /// Reader that cannot parse the manifest.
    pub fn failing(message: &str) -> Self {
        Self {
            targets: Vec::new(),
            failure: Some(message.to_string()),
        }
    }
}

impl Sealed for FakeManifestReader {}

#[async_trait]
impl ManifestReader for FakeManifestReader {
    async fn targets(&self, _project_dir: &Path) -> Result<Vec<ManifestTarget>, BuildError> {
        match self.failure {
            Some(ref message) => Err(BuildError::PackageDumpFailure(message.clone())),
            None => Ok(self.targets.clone()),
        }
    }
}

/// How the fake runner behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FakeBuildMode {
    /// Exit 0 and write a binary.
    #[default]
    Succeed,
    /// Exit with this code and write nothing.
    Fail(i64),
    /// Exit 0 but write nothing.
    NoArtifact,
}

/// Build runner that writes a placeholder executable to the artifact directory.
#[derive(Debug, Clone, Default)]
pub struct FakeBuildRunner {
    mode: FakeBuildMode,
    libraries: Vec<String>,
    unresolved: Vec<String>,
    requests: Arc<Mutex<Vec<BuildRequest>>>,
}

impl FakeBuildRunner {
    pub fn new(mode: FakeBuildMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Successful builds also report these libraries, written as placeholder files.
    pub fn with_libraries(mut self, sonames: &[&str]) -> Self {
        self.libraries = sonames.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Successful builds report these sonames as unresolvable.
    pub fn with_unresolved(mut self, sonames: &[&str]) -> Self {
        self.unresolved = sonames.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Every build request received.
    pub fn requests(&self) -> Vec<BuildRequest> {
        self.requests.lock().clone()
    }
}

impl Sealed for FakeBuildRunner {}

#[async_trait]
impl BuildRunner for FakeBuildRunner {
    async fn run_build(&self, request: &BuildRequest) -> Result<BuildOutput, BuildError> {
        self.requests.lock().push(request.clone());

        match self.mode {
            FakeBuildMode::Succeed => {
                let path = request.binary_destination();
                write(&path, format!("#!fake {}\n", request.product)).await?;

                let mut libraries = Vec::new();
                for soname in &self.libraries {
                    let library = request.library_destination().join(soname);
                    write(&library, format!("fake {}\n", soname)).await?;
                    libraries.push(library);
                }

                Ok(BuildOutput {
                    exit_code: 0,
                    log: format!("Compiling {}\nFinished release", request.product),
                    artifact: Some(path),
                    libraries,
                    unresolved_libraries: self.unresolved.clone(),
                })
            }
            FakeBuildMode::Fail(code) => Ok(BuildOutput {
                exit_code: code,
                log: "error[E0425]: cannot find value `x` in this scope".to_string(),
                ..Default::default()
            }),
            FakeBuildMode::NoArtifact => Ok(BuildOutput::default()),
        }
    }
}

async fn write(path: &Path, contents: String) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| BuildError::Container(e.to_string()))?;
    }
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| BuildError::Container(e.to_string()))
}
