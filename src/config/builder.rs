// ABOUTME: Build container settings.
// ABOUTME: Either a stock toolchain image or a custom dockerfile.

use serde::Deserialize;
use std::path::PathBuf;

/// Toolchain image used when no dockerfile is configured. Its glibc is old
/// enough for binaries to run on the provided.al2023 runtime.
pub const DEFAULT_BUILDER_IMAGE: &str = "rust:1-bullseye";

/// Builds run `cargo build --locked` against a read-only mount, so the
/// project must commit its `Cargo.lock`. The image also needs `ldd` to find
/// the shared libraries shipped with each binary.
#[derive(Debug, Clone, Deserialize)]
pub struct BuilderConfig {
    #[serde(default = "default_image")]
    pub image: String,

    /// Dockerfile for a custom build image, relative to the project.
    #[serde(default)]
    pub dockerfile: Option<PathBuf>,
}

fn default_image() -> String {
    DEFAULT_BUILDER_IMAGE.to_string()
}

impl Default for BuilderConfig {
    fn default() -> Self {
        BuilderConfig {
            image: default_image(),
            dockerfile: None,
        }
    }
}
