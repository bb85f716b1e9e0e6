// ABOUTME: Products command implementation.
// ABOUTME: Lists the executable targets the project manifest declares.

use super::workspace;
use lamina::build::{BollardBuildRunner, CargoManifestReader, DockerizedBuilder};
use lamina::config::Config;
use lamina::error::Result;
use lamina::output::Output;

pub async fn products(config: &Config, output: &mut Output) -> Result<()> {
    let ws = workspace(config);
    let runner = BollardBuildRunner::connect()?;
    let builder = DockerizedBuilder::new(
        &runner,
        ws.project_dir,
        ws.builder_image,
        ws.artifact_dir,
    );

    let products = builder
        .list_executable_products(&CargoManifestReader)
        .await?;

    for product in &products {
        output.success(product.as_str());
    }

    Ok(())
}
