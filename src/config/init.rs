// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Writes a commented lamina.yml naming the first product.

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{DEFAULT_ALIAS, FunctionName, ProductName};

use super::CONFIG_FILENAME;
use super::builder::DEFAULT_BUILDER_IMAGE;

/// Write `lamina.yml` into `dir`. Refuses to overwrite unless `force`.
pub fn init_config(
    dir: &Path,
    product: Option<&str>,
    function: Option<&str>,
    force: bool,
) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let product = ProductName::new(product.unwrap_or("bootstrap-handler"))
        .map_err(|e| Error::InvalidConfig(e.to_string()))?;

    let function = match function {
        Some(f) => FunctionName::new(f).map_err(|e| Error::InvalidConfig(e.to_string()))?,
        None => FunctionName::from(&product),
    };

    std::fs::write(&config_path, generate_template_yaml(&product, &function))?;

    Ok(())
}

fn generate_template_yaml(product: &ProductName, function: &FunctionName) -> String {
    format!(
        r#"output_dir: target/lambda

# Builds use the committed Cargo.lock (cargo build --locked).
builder:
  image: {image}
  # dockerfile: build/Dockerfile

deploy_timeout: 15m

functions:
  - product: {product}
    function: {function}
    alias: {alias}
    # role: arn:aws:iam::123456789012:role/my-existing-role
    memory_mb: 128
    timeout: 30s
    architecture: x86_64
    # env:
    #   LOG_LEVEL: info
    #   API_TOKEN: {{ env: API_TOKEN }}
    # verify:
    #   payload: fixtures/ping.json
    #   expect:
    #     status: "200-299"
    #     payload:
    #       contains: {{ ok: true }}
"#,
        image = DEFAULT_BUILDER_IMAGE,
        product = product,
        function = function,
        alias = DEFAULT_ALIAS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn template_parses() {
        let product = ProductName::new("handler").unwrap();
        let yaml = generate_template_yaml(&product, &FunctionName::from(&product));
        let config = Config::from_yaml(&yaml).unwrap();
        assert_eq!(config.functions.first().product.as_str(), "handler");
        assert_eq!(config.functions.first().alias.as_str(), "live");
    }
}
