// ABOUTME: Integration tests for DockerizedBuilder against in-memory runners.
// ABOUTME: Product discovery, input validation, and how runner outcomes become build errors.

mod support;

use lamina::build::{BuildError, DockerizedBuilder};
use lamina::context::artifact_dir;
use lamina::testing::{FakeBuildMode, FakeBuildRunner, FakeManifestReader};
use support::product;

fn builder<'a>(
    runner: &'a FakeBuildRunner,
    dir: &tempfile::TempDir,
) -> DockerizedBuilder<'a, FakeBuildRunner> {
    DockerizedBuilder::new(
        runner,
        dir.path(),
        "rust:1-bullseye",
        artifact_dir(&dir.path().join("target/lambda")),
    )
}

#[tokio::test]
async fn executables_are_sorted_and_deduplicated() {
    support::init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let runner = FakeBuildRunner::new(FakeBuildMode::Succeed);
    let reader = FakeManifestReader::with_executables(&["orders", "billing", "orders"])
        .with_library("shared");

    let products = builder(&runner, &dir)
        .list_executable_products(&reader)
        .await
        .unwrap();

    assert_eq!(products, vec![product("billing"), product("orders")]);
}

#[tokio::test]
async fn library_only_manifest_has_no_products() {
    let dir = tempfile::tempdir().unwrap();
    let runner = FakeBuildRunner::new(FakeBuildMode::Succeed);
    let reader = FakeManifestReader::with_executables(&[]).with_library("shared");

    let err = builder(&runner, &dir)
        .list_executable_products(&reader)
        .await
        .unwrap_err();

    assert!(matches!(err, BuildError::MissingProducts));
}

#[tokio::test]
async fn unreadable_manifest_is_a_dump_failure() {
    let dir = tempfile::tempdir().unwrap();
    let runner = FakeBuildRunner::new(FakeBuildMode::Succeed);
    let reader = FakeManifestReader::failing("could not find `Cargo.toml`");

    let err = builder(&runner, &dir)
        .list_executable_products(&reader)
        .await
        .unwrap_err();

    match err {
        BuildError::PackageDumpFailure(message) => assert!(message.contains("Cargo.toml")),
        other => panic!("expected PackageDumpFailure, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_dockerfile_is_rejected_before_any_container_runs() {
    let dir = tempfile::tempdir().unwrap();
    let runner = FakeBuildRunner::new(FakeBuildMode::Succeed);
    let dockerfile = dir.path().join("Dockerfile.build");

    let err = builder(&runner, &dir)
        .build(&product("orders"), Some(&dockerfile))
        .await
        .unwrap_err();

    assert!(matches!(err, BuildError::InvalidDockerfilePath(ref path) if *path == dockerfile));
    assert!(runner.requests().is_empty());
}

#[tokio::test]
async fn existing_dockerfile_is_passed_to_the_runner() {
    let dir = tempfile::tempdir().unwrap();
    let runner = FakeBuildRunner::new(FakeBuildMode::Succeed);
    let dockerfile = dir.path().join("Dockerfile.build");
    std::fs::write(&dockerfile, "FROM rust:1\n").unwrap();

    builder(&runner, &dir)
        .build(&product("orders"), Some(&dockerfile))
        .await
        .unwrap();

    let requests = runner.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].dockerfile.as_deref(), Some(dockerfile.as_path()));
}

#[tokio::test]
async fn success_without_binary_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let runner = FakeBuildRunner::new(FakeBuildMode::NoArtifact);

    let err = builder(&runner, &dir)
        .build(&product("orders"), None)
        .await
        .unwrap_err();

    assert!(matches!(err, BuildError::BuiltProductNotFound(ref p) if *p == product("orders")));
}

#[tokio::test]
async fn compiler_failure_carries_exit_code_and_log() {
    let dir = tempfile::tempdir().unwrap();
    let runner = FakeBuildRunner::new(FakeBuildMode::Fail(101));

    let err = builder(&runner, &dir)
        .build(&product("orders"), None)
        .await
        .unwrap_err();

    match err {
        BuildError::BuildFailed {
            product: failed,
            exit_code,
            output,
        } => {
            assert_eq!(failed, product("orders"));
            assert_eq!(exit_code, 101);
            assert!(output.contains("E0425"));
        }
        other => panic!("expected BuildFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn built_product_carries_libraries_from_the_image() {
    let dir = tempfile::tempdir().unwrap();
    let runner = FakeBuildRunner::new(FakeBuildMode::Succeed).with_libraries(&["libpq.so.5"]);

    let built = builder(&runner, &dir)
        .build(&product("orders"), None)
        .await
        .unwrap();

    let artifacts = dir.path().join("target/lambda/.artifacts");
    assert_eq!(built.binary_path, artifacts.join("orders"));
    assert_eq!(built.libraries, vec![artifacts.join("orders.libs/libpq.so.5")]);
    assert!(built.unresolved_libraries.is_empty());
}
