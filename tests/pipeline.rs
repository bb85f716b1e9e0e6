// ABOUTME: End-to-end pipeline tests with in-memory collaborators.
// ABOUTME: Build, package, publish, verify, and cutover or rollback without Docker or a network.

mod support;

use bytes::Bytes;
use lamina::cloud::RawInvocation;
use lamina::context::{DeployContext, Workspace};
use lamina::invoke::Expectation;
use lamina::pipeline::{PipelineError, PipelineErrorKind, PipelineTarget, run_all, run_target};
use lamina::publish::Outcome;
use lamina::testing::{CloudOp, FakeBuildMode, FakeBuildRunner, FakeCloud};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use support::{function, product, target, write_archive};

struct Harness {
    _dir: tempfile::TempDir,
    ctx: DeployContext,
    cloud: FakeCloud,
    runner: FakeBuildRunner,
}

impl Harness {
    fn new(cloud: FakeCloud, mode: FakeBuildMode) -> Self {
        support::init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeBuildRunner::new(mode);
        let workspace = Workspace::new(
            dir.path(),
            dir.path().join("target/lambda"),
            "rust:1-bullseye",
            None,
        );
        let ctx = DeployContext::new(Arc::new(cloud.clone()), Arc::new(runner.clone()), workspace);
        Self {
            _dir: dir,
            ctx,
            cloud,
            runner,
        }
    }

    fn dir(&self) -> &Path {
        &self.ctx.workspace.project_dir
    }
}

fn pipeline_target(name: &str, archive: Option<PathBuf>) -> PipelineTarget {
    PipelineTarget {
        product: product(name),
        target: target(name),
        payload: None,
        expectation: Expectation::default(),
        archive,
    }
}

fn server_error() -> RawInvocation {
    RawInvocation {
        status_code: 500,
        payload: Bytes::from_static(b"internal"),
        function_error: None,
        executed_version: None,
    }
}

#[tokio::test]
async fn healthy_version_is_cut_over() {
    let cloud = FakeCloud::new()
        .with_function("orders", 3)
        .with_alias("orders", "live", "3");
    let h = Harness::new(cloud, FakeBuildMode::Succeed);

    let report = run_target(&h.ctx, pipeline_target("orders", None))
        .await
        .unwrap();

    assert_eq!(report.outcome, Outcome::CutOver);
    assert_eq!(report.previous_version.as_deref(), Some("3"));
    assert_eq!(report.new_version, "4");
    assert_eq!(h.cloud.alias_version("orders", "live").as_deref(), Some("4"));
    assert_eq!(h.runner.requests().len(), 1);
    assert!(h.dir().join("target/lambda/orders.zip").is_file());
}

#[tokio::test]
async fn first_deployment_creates_function_role_and_alias() {
    let h = Harness::new(FakeCloud::new(), FakeBuildMode::Succeed);

    let report = run_target(&h.ctx, pipeline_target("orders", None))
        .await
        .unwrap();

    assert_eq!(report.outcome, Outcome::CutOver);
    assert!(report.previous_version.is_none());
    assert_eq!(report.role, "arn:aws:iam::123456789012:role/lamina-orders");
    assert_eq!(h.cloud.alias_version("orders", "live").as_deref(), Some("1"));
}

#[tokio::test]
async fn failing_version_is_rolled_back_without_alias_write() {
    let cloud = FakeCloud::new()
        .with_function("orders", 3)
        .with_alias("orders", "live", "3");
    cloud.respond_for_version("4", server_error());
    let h = Harness::new(cloud, FakeBuildMode::Succeed);

    let err = run_target(&h.ctx, pipeline_target("orders", None))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), PipelineErrorKind::Invocation);
    assert!(!err.is_retryable());

    let report = err.report().unwrap();
    assert_eq!(report.outcome, Outcome::RolledBack);
    assert_eq!(report.previous_version.as_deref(), Some("3"));
    assert_eq!(report.new_version, "4");
    assert!(report.reason.as_deref().unwrap().contains("500"));

    assert_eq!(h.cloud.alias_version("orders", "live").as_deref(), Some("3"));
    assert!(!h.cloud.operations().iter().any(CloudOp::is_alias_write));
}

#[tokio::test]
async fn misnamed_archive_fails_before_any_remote_call() {
    let h = Harness::new(FakeCloud::new(), FakeBuildMode::Succeed);
    let archive = write_archive(h.dir(), "app.zip");

    let err = run_target(&h.ctx, pipeline_target("myapp", Some(archive)))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), PipelineErrorKind::Validation);
    assert!(h.cloud.operations().is_empty());
    assert!(h.runner.requests().is_empty());
}

#[tokio::test]
async fn given_archive_skips_the_build() {
    let cloud = FakeCloud::new().with_function("orders", 1);
    let h = Harness::new(cloud, FakeBuildMode::Succeed);
    let archive = write_archive(h.dir(), "orders.zip");

    let report = run_target(&h.ctx, pipeline_target("orders", Some(archive)))
        .await
        .unwrap();

    assert_eq!(report.new_version, "2");
    assert!(h.runner.requests().is_empty());
}

#[tokio::test]
async fn build_failure_makes_no_remote_call() {
    let h = Harness::new(FakeCloud::new(), FakeBuildMode::Fail(101));

    let err = run_target(&h.ctx, pipeline_target("orders", None))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Build { .. }));
    assert_eq!(err.kind(), PipelineErrorKind::BuildPackage);
    assert!(err.report().is_none());
    assert!(h.cloud.operations().is_empty());
}

#[tokio::test]
async fn empty_payload_file_is_rejected_up_front() {
    let h = Harness::new(FakeCloud::new(), FakeBuildMode::Succeed);
    let payload = h.dir().join("payload.json");
    std::fs::write(&payload, "  \n").unwrap();

    let mut pipeline = pipeline_target("orders", None);
    pipeline.payload = Some(payload);

    let err = run_target(&h.ctx, pipeline).await.unwrap_err();

    assert_eq!(err.kind(), PipelineErrorKind::Validation);
    assert!(h.runner.requests().is_empty());
    assert!(h.cloud.operations().is_empty());
}

#[tokio::test]
async fn cancellation_before_start_skips_everything() {
    let h = Harness::new(FakeCloud::new(), FakeBuildMode::Succeed);
    h.ctx.cancel.cancel();

    let err = run_target(&h.ctx, pipeline_target("orders", None))
        .await
        .unwrap_err();

    match err {
        PipelineError::Cancelled { ref stage, .. } => assert_eq!(*stage, "build"),
        ref other => panic!("expected Cancelled, got {other:?}"),
    }
    assert_eq!(err.kind(), PipelineErrorKind::Cancelled);
    assert!(h.runner.requests().is_empty());
    assert!(h.cloud.operations().is_empty());
}

#[tokio::test]
async fn cancellation_during_publish_leaves_alias_untouched() {
    let cloud = FakeCloud::new()
        .with_function("orders", 3)
        .with_alias("orders", "live", "3")
        .with_latency(Duration::from_millis(50));
    let h = Harness::new(cloud, FakeBuildMode::Succeed);
    let archive = write_archive(h.dir(), "orders.zip");

    h.ctx.cancel.cancel_after(Duration::from_millis(75));
    let err = run_target(&h.ctx, pipeline_target("orders", Some(archive)))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Cancelled { stage: "publish", .. }));
    assert_eq!(h.cloud.alias_version("orders", "live").as_deref(), Some("3"));
    assert!(!h.cloud.operations().iter().any(CloudOp::is_alias_write));
}

#[tokio::test]
async fn failed_cutover_reports_rollback() {
    let cloud = FakeCloud::new()
        .with_function("orders", 3)
        .with_alias("orders", "live", "3");
    cloud.fail_operation("UpdateAlias");
    let h = Harness::new(cloud, FakeBuildMode::Succeed);

    let err = run_target(&h.ctx, pipeline_target("orders", None))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Cutover { .. }));
    assert_eq!(err.kind(), PipelineErrorKind::RemoteState);
    assert_eq!(err.report().unwrap().outcome, Outcome::RolledBack);
    assert_eq!(h.cloud.alias_version("orders", "live").as_deref(), Some("3"));
}

#[tokio::test]
async fn targets_run_independently_and_keep_order() {
    let cloud = FakeCloud::new()
        .with_function("billing", 2)
        .with_alias("billing", "live", "2");
    cloud.respond_for_version("3", server_error());
    let h = Harness::new(cloud, FakeBuildMode::Succeed);

    let results = run_all(
        &h.ctx,
        vec![
            pipeline_target("orders", None),
            pipeline_target("billing", None),
        ],
    )
    .await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().unwrap().function, "orders");
    let err = results[1].as_ref().unwrap_err();
    assert_eq!(err.product(), "billing");
    assert_eq!(h.cloud.alias_version("orders", "live").as_deref(), Some("1"));
    assert_eq!(h.cloud.alias_version("billing", "live").as_deref(), Some("2"));
}

#[tokio::test]
async fn concurrent_first_deploys_create_one_role_each() {
    let cloud = FakeCloud::new().with_latency(Duration::from_millis(5));
    let h = Harness::new(cloud, FakeBuildMode::Succeed);

    let results = run_all(
        &h.ctx,
        vec![
            pipeline_target("orders", None),
            pipeline_target("billing", None),
        ],
    )
    .await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(h.cloud.count("CreateRole"), 2);
    assert_eq!(
        h.cloud.roles(),
        vec!["lamina-billing".to_string(), "lamina-orders".to_string()]
    );
}

#[tokio::test]
async fn product_named_bin_does_not_clobber_its_own_binary() {
    let h = Harness::new(FakeCloud::new(), FakeBuildMode::Succeed);

    let report = run_target(&h.ctx, pipeline_target("bin", None))
        .await
        .unwrap();

    assert_eq!(report.outcome, Outcome::CutOver);
    assert!(h.dir().join("target/lambda/bin.zip").is_file());
    assert!(h.dir().join("target/lambda/.artifacts/bin").is_file());
    assert!(h.dir().join("target/lambda/bin/bootstrap").exists());
}

#[tokio::test]
async fn existing_function_keeps_its_role() {
    let cloud = FakeCloud::new()
        .with_function("orders", 3)
        .with_alias("orders", "live", "3");
    let h = Harness::new(cloud, FakeBuildMode::Succeed);

    let report = run_target(&h.ctx, pipeline_target("orders", None))
        .await
        .unwrap();

    assert_eq!(report.role, "arn:aws:iam::123456789012:role/orders-seed");
    assert_eq!(h.cloud.count("GetRole"), 0);
    assert_eq!(h.cloud.count("CreateRole"), 0);
    assert_eq!(h.cloud.count("GetCallerIdentity"), 0);
}

#[tokio::test]
async fn targets_sharing_a_product_build_it_once() {
    let h = Harness::new(FakeCloud::new(), FakeBuildMode::Succeed);

    let mut staging = pipeline_target("orders", None);
    staging.target.function = function("orders-staging");
    let mut prod = pipeline_target("orders", None);
    prod.target.function = function("orders-prod");

    let results = run_all(&h.ctx, vec![staging, prod]).await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(h.runner.requests().len(), 1);
    assert_eq!(
        h.cloud.alias_version("orders-staging", "live").as_deref(),
        Some("1")
    );
    assert_eq!(h.cloud.alias_version("orders-prod", "live").as_deref(), Some("1"));
}

#[tokio::test]
async fn shared_build_failure_fails_every_target() {
    let h = Harness::new(FakeCloud::new(), FakeBuildMode::Fail(101));

    let mut staging = pipeline_target("orders", None);
    staging.target.function = function("orders-staging");
    let prod = pipeline_target("orders", None);

    let results = run_all(&h.ctx, vec![staging, prod]).await;

    assert_eq!(h.runner.requests().len(), 1);
    for result in &results {
        assert!(matches!(result, Err(PipelineError::Build { .. })));
    }
    assert!(h.cloud.operations().is_empty());
}
