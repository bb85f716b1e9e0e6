// ABOUTME: Command module aggregator for the lamina CLI.
// ABOUTME: Re-exports command handlers and the config-to-collaborator wiring they share.

mod build;
mod deploy;
mod invoke;
mod products;

pub use build::build;
pub use deploy::deploy;
pub use invoke::invoke;
pub use products::products;

use lamina::config::{Config, FunctionConfig};
use lamina::context::Workspace;
use lamina::error::{Error, Result};

/// Paths and builder settings of a run, resolved against the config location.
fn workspace(config: &Config) -> Workspace {
    Workspace::new(
        config.project_dir(),
        config.output_dir(),
        config.builder.image.clone(),
        config.dockerfile(),
    )
}

/// The single entry a command acts on; `--product` is required when the
/// config lists more than one.
fn single<'a>(config: &'a Config, product: Option<&str>) -> Result<&'a FunctionConfig> {
    let selected = config.select(product)?;
    match selected.as_slice() {
        [entry] => Ok(entry),
        _ => Err(Error::InvalidConfig(format!(
            "{} functions configured, pass --product to pick one",
            selected.len()
        ))),
    }
}
