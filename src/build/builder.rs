// ABOUTME: DockerizedBuilder lists executable products and builds them in a container.
// ABOUTME: Validates inputs up front and checks the runner's artifact before trusting it.

use std::path::{Path, PathBuf};

use super::error::BuildError;
use super::manifest::ManifestReader;
use super::runner::{BuildOutput, BuildRequest, BuildRunner};
use crate::types::ProductName;

/// Lines of build output kept in a failure report.
const FAILURE_LOG_LINES: usize = 40;

/// A compiled executable on the host, with the shared libraries it loads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildProduct {
    pub name: ProductName,
    pub binary_path: PathBuf,
    /// Host copies of the libraries to ship next to the binary.
    pub libraries: Vec<PathBuf>,
    /// Sonames the build image could not resolve.
    pub unresolved_libraries: Vec<String>,
}

/// Builds executable products of one project through a [`BuildRunner`].
pub struct DockerizedBuilder<'a, R: BuildRunner + ?Sized> {
    runner: &'a R,
    project_dir: PathBuf,
    image: String,
    artifact_dir: PathBuf,
}

impl<'a, R: BuildRunner + ?Sized> DockerizedBuilder<'a, R> {
    pub fn new(
        runner: &'a R,
        project_dir: impl Into<PathBuf>,
        image: impl Into<String>,
        artifact_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            project_dir: project_dir.into(),
            image: image.into(),
            artifact_dir: artifact_dir.into(),
        }
    }

    /// Every executable target the manifest declares, sorted and deduplicated.
    pub async fn list_executable_products<M: ManifestReader + ?Sized>(
        &self,
        reader: &M,
    ) -> Result<Vec<ProductName>, BuildError> {
        let targets = reader.targets(&self.project_dir).await?;

        let mut products = targets
            .iter()
            .filter(|t| t.is_executable())
            .map(|t| {
                ProductName::new(&t.name).map_err(|e| {
                    BuildError::PackageDumpFailure(format!("target {:?}: {}", t.name, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        products.sort();
        products.dedup();

        if products.is_empty() {
            return Err(BuildError::MissingProducts);
        }

        Ok(products)
    }

    /// Build one product, optionally with a custom builder dockerfile.
    pub async fn build(
        &self,
        product: &ProductName,
        dockerfile: Option<&Path>,
    ) -> Result<BuildProduct, BuildError> {
        if let Some(path) = dockerfile
            && !path.is_file()
        {
            return Err(BuildError::InvalidDockerfilePath(path.to_path_buf()));
        }

        tracing::info!(product = %product, "building");

        let request = BuildRequest {
            project_dir: self.project_dir.clone(),
            product: product.clone(),
            image: self.image.clone(),
            dockerfile: dockerfile.map(Path::to_path_buf),
            artifact_dir: self.artifact_dir.clone(),
        };

        let output = self.runner.run_build(&request).await?;
        let built = check_output(product, output)?;

        tracing::info!(
            product = %product,
            binary = %built.binary_path.display(),
            libraries = built.libraries.len(),
            "build complete"
        );

        Ok(built)
    }
}

fn check_output(product: &ProductName, output: BuildOutput) -> Result<BuildProduct, BuildError> {
    if output.exit_code != 0 {
        return Err(BuildError::BuildFailed {
            product: product.clone(),
            exit_code: output.exit_code,
            output: tail(&output.log, FAILURE_LOG_LINES),
        });
    }

    match output.artifact {
        Some(binary_path) if !binary_path.as_os_str().is_empty() && binary_path.is_file() => {
            Ok(BuildProduct {
                name: product.clone(),
                binary_path,
                libraries: output.libraries,
                unresolved_libraries: output.unresolved_libraries,
            })
        }
        _ => Err(BuildError::BuiltProductNotFound(product.clone())),
    }
}

fn tail(log: &str, lines: usize) -> String {
    let all: Vec<&str> = log.lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}
