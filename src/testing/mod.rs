// ABOUTME: In-memory fakes for every external collaborator.
// ABOUTME: Used by unit and integration tests to run whole deployments without a network.

mod build;
mod cloud;

pub use build::{FakeBuildMode, FakeBuildRunner, FakeManifestReader};
pub use cloud::{CloudOp, FakeCloud};
