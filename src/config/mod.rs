// ABOUTME: Configuration types and parsing for lamina.yml.
// ABOUTME: Handles YAML parsing, discovery, path resolution, and function lookup.

mod builder;
mod deserialize;
mod env_value;
mod function;
mod init;

pub use builder::{BuilderConfig, DEFAULT_BUILDER_IMAGE};
pub use env_value::{EnvValue, resolve_env_map};
pub use function::{FunctionConfig, VerifyConfig};
pub use init::init_config;

use crate::error::{Error, Result};
use deserialize::deserialize_functions;
use nonempty::NonEmpty;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "lamina.yml";
pub const CONFIG_FILENAME_ALT: &str = "lamina.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".lamina/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Project directory holding the package manifest, relative to the config.
    #[serde(default = "default_project")]
    pub project: PathBuf,

    /// Where binaries, staging directories, and archives are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub builder: BuilderConfig,

    /// Region override; the SDK's default chain applies otherwise.
    #[serde(default)]
    pub region: Option<String>,

    /// Upper bound for one `deploy` run, cutover excluded.
    #[serde(default = "default_deploy_timeout", with = "humantime_serde")]
    pub deploy_timeout: Duration,

    #[serde(deserialize_with = "deserialize_functions")]
    pub functions: NonEmpty<FunctionConfig>,

    /// Directory relative paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

fn default_project() -> PathBuf {
    PathBuf::from(".")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("target/lambda")
}

fn default_deploy_timeout() -> Duration {
    Duration::from_secs(15 * 60)
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&content)?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(config)
    }

    /// Load the first config file found in `dir`.
    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                let mut config = Self::load(path)?;
                config.base_dir = dir.to_path_buf();
                return Ok(config);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Two entries must not roll out to the same function.
    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for entry in self.functions.iter() {
            let name = entry.function_name();
            if !seen.insert(name.to_string()) {
                return Err(Error::InvalidConfig(format!(
                    "function {} is configured more than once",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Resolve a path from the config against `base_dir`.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn project_dir(&self) -> PathBuf {
        self.resolve_path(&self.project)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve_path(&self.output_dir)
    }

    /// Directory compiled binaries are copied to, outside the staging areas.
    pub fn artifact_dir(&self) -> PathBuf {
        crate::context::artifact_dir(&self.output_dir())
    }

    pub fn dockerfile(&self) -> Option<PathBuf> {
        self.builder
            .dockerfile
            .as_deref()
            .map(|p| self.resolve_path(p))
    }

    /// Entries to act on: the one for `product`, or all of them.
    pub fn select(&self, product: Option<&str>) -> Result<Vec<&FunctionConfig>> {
        match product {
            None => Ok(self.functions.iter().collect()),
            Some(name) => {
                let selected: Vec<_> = self
                    .functions
                    .iter()
                    .filter(|f| f.product.as_str() == name)
                    .collect();
                if selected.is_empty() {
                    return Err(Error::UnknownProduct(name.to_string()));
                }
                Ok(selected)
            }
        }
    }
}
