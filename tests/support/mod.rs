// ABOUTME: Test support utilities.
// ABOUTME: Provides tracing setup, deploy targets, and archive fixtures for integration tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;

use lamina::cloud::Architecture;
use lamina::publish::DeployTarget;
use lamina::types::{AliasName, FunctionName, ProductName};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("lamina=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

#[allow(dead_code)]
pub fn product(name: &str) -> ProductName {
    ProductName::new(name).unwrap()
}

#[allow(dead_code)]
pub fn function(name: &str) -> FunctionName {
    FunctionName::new(name).unwrap()
}

/// Target with defaults for `function` on alias `live`.
#[allow(dead_code)]
pub fn target(name: &str) -> DeployTarget {
    DeployTarget {
        function: function(name),
        alias: AliasName::default(),
        role_arn: None,
        architecture: Architecture::X86_64,
        memory_mb: 128,
        timeout: Duration::from_secs(30),
        environment: HashMap::new(),
        description: "test deployment".to_string(),
    }
}

/// Write a stand-in archive named `file_name` into `dir`.
#[allow(dead_code)]
pub fn write_archive(dir: &Path, file_name: &str) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, b"PK\x05\x06 placeholder").unwrap();
    path
}
