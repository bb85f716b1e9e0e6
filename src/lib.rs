// ABOUTME: Library root for lamina - exposes the pipeline stages for the CLI and tests.
// ABOUTME: The main binary is in main.rs.

pub mod build;
pub mod cloud;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod invoke;
pub mod output;
pub mod package;
pub mod pipeline;
pub mod publish;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod types;
