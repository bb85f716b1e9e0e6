// ABOUTME: Drives build, package, publish, verify, and cutover for each target.
// ABOUTME: Targets run concurrently; cancellation is honoured up to verification only.

mod cancel;
mod error;

pub use cancel::CancelSignal;
pub use error::{PipelineError, PipelineErrorKind};

use bytes::Bytes;
use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared, join_all};
use snafu::ResultExt;
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use tracing::Instrument;

use crate::build::DockerizedBuilder;
use crate::cloud::CloudOps;
use crate::context::DeployContext;
use crate::invoke::{Expectation, LambdaInvoker};
use crate::package::ExecutablePackager;
use crate::publish::{DeployTarget, Deployment, DeploymentReport, RoleResolver, publish_and_verify};
use crate::types::{Archive, ProductName};

use error::{
    BuildSnafu, CancelledSnafu, CutoverSnafu, InvokeSnafu, PackageSnafu, PublishSnafu,
};

/// Default verification payload when none is configured.
const DEFAULT_PAYLOAD: &[u8] = b"{}";

/// A product build that every target deploying the product awaits.
/// Nothing runs until the first target polls it.
type SharedBuild<'a> = Shared<LocalBoxFuture<'a, Result<PathBuf, PipelineError>>>;

/// One function to roll out.
#[derive(Debug, Clone)]
pub struct PipelineTarget {
    pub product: ProductName,
    pub target: DeployTarget,
    /// Verification payload file; `{}` is sent when absent.
    pub payload: Option<PathBuf>,
    pub expectation: Expectation,
    /// Deploy this archive instead of building one.
    pub archive: Option<PathBuf>,
}

/// Run `future` unless the signal trips first.
async fn race<T>(
    ctx: &DeployContext,
    product: &ProductName,
    stage: &'static str,
    future: impl Future<Output = Result<T, PipelineError>>,
) -> Result<T, PipelineError> {
    tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => CancelledSnafu {
            product: product.to_string(),
            stage,
        }
        .fail(),
        result = future => result,
    }
}

/// Build and package one product.
pub async fn build_and_package(
    ctx: &DeployContext,
    product: &ProductName,
) -> Result<Archive, PipelineError> {
    let ws = &ctx.workspace;
    let builder = DockerizedBuilder::new(
        ctx.runner.as_ref(),
        &ws.project_dir,
        &ws.builder_image,
        &ws.artifact_dir,
    );

    let built = race(ctx, product, "build", async {
        builder
            .build(product, ws.dockerfile.as_deref())
            .await
            .context(BuildSnafu {
                product: product.to_string(),
            })
    })
    .await?;

    ExecutablePackager::new(&ws.output_dir)
        .package_on_blocking_pool(built)
        .await
        .context(PackageSnafu {
            product: product.to_string(),
        })
}

fn shared_build(ctx: &DeployContext, product: ProductName) -> SharedBuild<'_> {
    let span = tracing::info_span!("build", product = %product);
    async move {
        build_and_package(ctx, &product)
            .await
            .map(|archive| archive.path().to_path_buf())
    }
    .instrument(span)
    .boxed_local()
    .shared()
}

/// Roll out one target: build unless an archive is given, publish, verify,
/// then cut over or roll back.
pub async fn run_target(
    ctx: &DeployContext,
    target: PipelineTarget,
) -> Result<DeploymentReport, PipelineError> {
    let build = shared_build(ctx, target.product.clone());
    roll_out(ctx, target, build).await
}

async fn roll_out(
    ctx: &DeployContext,
    target: PipelineTarget,
    build: SharedBuild<'_>,
) -> Result<DeploymentReport, PipelineError> {
    let PipelineTarget {
        product,
        target,
        payload,
        expectation,
        archive,
    } = target;
    let name = product.to_string();

    let payload = match payload {
        Some(ref path) => LambdaInvoker::<dyn CloudOps>::load_payload(path)
            .await
            .context(InvokeSnafu {
                product: name.clone(),
                report: None::<Box<DeploymentReport>>,
            })?,
        None => Bytes::from_static(DEFAULT_PAYLOAD),
    };

    let archive_path = match archive {
        Some(path) => path,
        None => build.await?,
    };

    let deployment = Deployment::validate(target, &archive_path, &product).context(PublishSnafu {
        product: name.clone(),
    })?;

    let roles = RoleResolver::new(&ctx.roles);
    let cloud = ctx.cloud.as_ref();

    let verified = race(ctx, &product, "publish", async {
        publish_and_verify(deployment, cloud, &roles, payload, &expectation)
            .await
            .context(PublishSnafu {
                product: name.clone(),
            })
    })
    .await?;

    // Past this point cancellation is ignored so the alias write is never
    // interrupted halfway.
    match verified {
        Ok(deployment) => match deployment.cutover(cloud).await {
            Ok(cut_over) => Ok(cut_over.report()),
            Err((deployment, e)) => {
                let report = deployment.roll_back(e.to_string()).report();
                Err(e).context(CutoverSnafu {
                    product: name,
                    report: Box::new(report),
                })
            }
        },
        Err((deployment, e)) => {
            let report = deployment.roll_back(e.to_string()).report();
            Err(e).context(InvokeSnafu {
                product: name,
                report: Some(Box::new(report)),
            })
        }
    }
}

/// Roll out every target concurrently. Results keep the input order.
///
/// Each product is built at most once; targets deploying the same product
/// share its archive, and a failed build fails all of them.
pub async fn run_all(
    ctx: &DeployContext,
    targets: Vec<PipelineTarget>,
) -> Vec<Result<DeploymentReport, PipelineError>> {
    let mut builds: HashMap<ProductName, SharedBuild<'_>> = HashMap::new();

    let runs = targets
        .into_iter()
        .map(|target| {
            let build = builds
                .entry(target.product.clone())
                .or_insert_with(|| shared_build(ctx, target.product.clone()))
                .clone();
            let span = tracing::info_span!(
                "deploy",
                product = %target.product,
                function = %target.target.function
            );
            roll_out(ctx, target, build).instrument(span)
        })
        .collect::<Vec<_>>();

    join_all(runs).await
}
