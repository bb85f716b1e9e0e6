// ABOUTME: Package manifest inspection for discovering executable targets.
// ABOUTME: CargoManifestReader shells out to `cargo metadata` and parses its JSON.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use tokio::process::Command;

use super::error::BuildError;
use crate::cloud::traits::sealed::Sealed;

/// One target declared by the package manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManifestTarget {
    pub name: String,
    #[serde(rename = "kind")]
    pub kinds: Vec<String>,
}

impl ManifestTarget {
    /// Whether the target produces an executable.
    pub fn is_executable(&self) -> bool {
        self.kinds.iter().any(|k| k == "bin")
    }
}

#[async_trait]
pub trait ManifestReader: Sealed + Send + Sync {
    /// List every target of the package rooted at `project_dir`.
    async fn targets(&self, project_dir: &Path) -> Result<Vec<ManifestTarget>, BuildError>;
}

#[derive(Deserialize)]
struct Metadata {
    packages: Vec<Package>,
}

#[derive(Deserialize)]
struct Package {
    targets: Vec<ManifestTarget>,
}

/// Reads targets with `cargo metadata --format-version 1 --no-deps`.
#[derive(Debug, Clone, Default)]
pub struct CargoManifestReader;

impl Sealed for CargoManifestReader {}

#[async_trait]
impl ManifestReader for CargoManifestReader {
    async fn targets(&self, project_dir: &Path) -> Result<Vec<ManifestTarget>, BuildError> {
        let output = Command::new("cargo")
            .args(["metadata", "--format-version", "1", "--no-deps"])
            .arg("--manifest-path")
            .arg(project_dir.join("Cargo.toml"))
            .output()
            .await
            .map_err(|e| BuildError::PackageDumpFailure(format!("failed to run cargo: {}", e)))?;

        if !output.status.success() {
            return Err(BuildError::PackageDumpFailure(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        parse_metadata(&output.stdout)
    }
}

fn parse_metadata(json: &[u8]) -> Result<Vec<ManifestTarget>, BuildError> {
    let metadata: Metadata = serde_json::from_slice(json)
        .map_err(|e| BuildError::PackageDumpFailure(e.to_string()))?;

    Ok(metadata
        .packages
        .into_iter()
        .flat_map(|p| p.targets)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bin_and_lib_targets() {
        let json = br#"{
            "packages": [{
                "name": "demo",
                "version": "0.1.0",
                "targets": [
                    {"name": "demo", "kind": ["lib"], "src_path": "src/lib.rs"},
                    {"name": "handler", "kind": ["bin"], "src_path": "src/bin/handler.rs"}
                ]
            }],
            "workspace_members": []
        }"#;

        let targets = parse_metadata(json).unwrap();
        assert_eq!(targets.len(), 2);
        assert!(!targets[0].is_executable());
        assert!(targets[1].is_executable());
        assert_eq!(targets[1].name, "handler");
    }

    #[test]
    fn garbage_is_a_dump_failure() {
        let err = parse_metadata(b"not json").unwrap_err();
        assert!(matches!(err, BuildError::PackageDumpFailure(_)));
    }
}
