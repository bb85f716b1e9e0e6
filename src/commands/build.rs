// ABOUTME: Build command implementation.
// ABOUTME: Compiles and packages the selected products without touching the cloud.

use super::workspace;
use lamina::build::{BollardBuildRunner, DockerizedBuilder};
use lamina::config::Config;
use lamina::error::Result;
use lamina::output::Output;
use lamina::package::ExecutablePackager;

pub async fn build(config: &Config, product: Option<&str>, output: &mut Output) -> Result<()> {
    output.start_timer();

    let ws = workspace(config);
    let runner = BollardBuildRunner::connect()?;
    let builder = DockerizedBuilder::new(
        &runner,
        &ws.project_dir,
        &ws.builder_image,
        &ws.artifact_dir,
    );
    let packager = ExecutablePackager::new(&ws.output_dir);

    // One product at a time to keep the build log readable.
    for entry in config.select(product)? {
        output.progress(&format!("  → Building {}...", entry.product));
        let built = builder.build(&entry.product, ws.dockerfile.as_deref()).await?;

        output.progress(&format!("  → Packaging {}...", entry.product));
        let archive = packager.package_on_blocking_pool(built).await?;

        output.success(&format!("{}", archive.path().display()));
    }

    Ok(())
}
