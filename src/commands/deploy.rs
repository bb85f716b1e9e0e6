// ABOUTME: Deploy command implementation.
// ABOUTME: Wires config into pipeline targets, runs them concurrently, and reports each outcome.

use super::workspace;
use lamina::build::BollardBuildRunner;
use lamina::cloud::AwsCloud;
use lamina::config::Config;
use lamina::context::DeployContext;
use lamina::diagnostics::{Diagnostics, Warning};
use lamina::error::{Error, Result};
use lamina::output::Output;
use lamina::pipeline::{PipelineTarget, run_all};
use lamina::publish::deployed_by;
use std::path::Path;
use std::sync::Arc;

/// Deploy the selected functions. Fails if any of them did not cut over.
pub async fn deploy(
    config: &Config,
    product: Option<&str>,
    archive: Option<&Path>,
    output: &mut Output,
) -> Result<()> {
    output.start_timer();
    let mut diag = Diagnostics::default();

    let description = format!("deployed by lamina from {}", deployed_by());
    let mut targets = Vec::new();
    for entry in config.select(product)? {
        if entry.verify.payload.is_none() {
            diag.warn(Warning::default_payload(&entry.product));
        }

        targets.push(PipelineTarget {
            product: entry.product.clone(),
            target: entry.deploy_target(description.clone())?,
            payload: entry.verify.payload.as_deref().map(|p| config.resolve_path(p)),
            expectation: entry.verify.expect.clone(),
            archive: archive.map(Path::to_path_buf),
        });
    }

    output.progress(&format!("Deploying {} function(s)", targets.len()));

    let cloud = AwsCloud::from_env(config.region.clone()).await;
    let runner = BollardBuildRunner::connect()?;
    let ctx = DeployContext::new(Arc::new(cloud), Arc::new(runner), workspace(config));
    ctx.cancel.cancel_on_ctrl_c();
    ctx.cancel.cancel_after(config.deploy_timeout);

    let total = targets.len();
    let mut failed = 0;

    for result in run_all(&ctx, targets).await {
        match result {
            Ok(report) => output.report(&report),
            Err(e) => {
                failed += 1;
                match e.report() {
                    Some(report) => {
                        output.report(report);
                        diag.warn(Warning::orphaned_version(report));
                    }
                    None => output.error(&e.to_string()),
                }
            }
        }
    }

    for warning in diag.warnings() {
        output.warning(warning);
    }

    if failed > 0 {
        return Err(Error::DeploymentsFailed { failed, total });
    }

    output.success("Deployment complete!");
    Ok(())
}
