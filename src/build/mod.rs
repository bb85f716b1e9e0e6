// ABOUTME: Containerized compilation of executable products.
// ABOUTME: Manifest discovery, the container runner seam, and the builder that ties them together.

mod builder;
mod error;
mod libraries;
mod manifest;
mod runner;

pub use builder::{BuildProduct, DockerizedBuilder};
pub use error::BuildError;
pub use manifest::{CargoManifestReader, ManifestReader, ManifestTarget};
pub use libraries::{LinkedLibraries, from_ldd};
pub use runner::{BollardBuildRunner, BuildOutput, BuildRequest, BuildRunner, cargo_build_command};
