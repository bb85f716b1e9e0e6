// ABOUTME: Per-function deployment settings from the `functions` list.
// ABOUTME: Names the product, the target function and alias, sizing, env, and verification.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use super::deserialize::{deserialize_alias_name, deserialize_function_name_option, deserialize_product_name};
use super::env_value::{EnvValue, resolve_env_map};
use crate::cloud::Architecture;
use crate::error::Result;
use crate::invoke::Expectation;
use crate::publish::DeployTarget;
use crate::types::{AliasName, FunctionName, ProductName};

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionConfig {
    /// Executable product to build and ship.
    #[serde(deserialize_with = "deserialize_product_name")]
    pub product: ProductName,

    /// Function name; defaults to the product name.
    #[serde(default, deserialize_with = "deserialize_function_name_option")]
    pub function: Option<FunctionName>,

    #[serde(default = "default_alias", deserialize_with = "deserialize_alias_name")]
    pub alias: AliasName,

    /// Explicit execution role ARN. A role is synthesized when absent.
    #[serde(default)]
    pub role: Option<String>,

    #[serde(default = "default_memory_mb")]
    pub memory_mb: u32,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(default)]
    pub architecture: Architecture,

    #[serde(default)]
    pub env: HashMap<String, EnvValue>,

    #[serde(default)]
    pub verify: VerifyConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyConfig {
    /// Payload file sent to the new version; `{}` when absent.
    #[serde(default)]
    pub payload: Option<PathBuf>,

    #[serde(default)]
    pub expect: Expectation,
}

fn default_alias() -> AliasName {
    AliasName::default()
}

fn default_memory_mb() -> u32 {
    128
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

impl FunctionConfig {
    /// Minimal entry for `product` with every default applied.
    pub fn for_product(product: ProductName) -> Self {
        FunctionConfig {
            product,
            function: None,
            alias: default_alias(),
            role: None,
            memory_mb: default_memory_mb(),
            timeout: default_timeout(),
            architecture: Architecture::default(),
            env: HashMap::new(),
            verify: VerifyConfig::default(),
        }
    }

    /// Target function name.
    pub fn function_name(&self) -> FunctionName {
        match self.function {
            Some(ref name) => name.clone(),
            None => FunctionName::from(&self.product),
        }
    }

    /// Resolve env references and build the publisher's target.
    pub fn deploy_target(&self, description: String) -> Result<DeployTarget> {
        Ok(DeployTarget {
            function: self.function_name(),
            alias: self.alias.clone(),
            role_arn: self.role.clone(),
            architecture: self.architecture,
            memory_mb: self.memory_mb,
            timeout: self.timeout,
            environment: resolve_env_map(&self.env)?,
            description,
        })
    }
}
