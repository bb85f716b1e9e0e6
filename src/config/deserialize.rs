// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Handles product, function, and alias names and the non-empty function list.

use nonempty::NonEmpty;
use serde::Deserialize;

use super::FunctionConfig;
use crate::types::{AliasName, FunctionName, ProductName};

pub fn deserialize_product_name<'de, D>(deserializer: D) -> Result<ProductName, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    ProductName::new(&s).map_err(serde::de::Error::custom)
}

pub fn deserialize_function_name_option<'de, D>(
    deserializer: D,
) -> Result<Option<FunctionName>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    opt.map(|s| FunctionName::new(&s).map_err(serde::de::Error::custom))
        .transpose()
}

pub fn deserialize_alias_name<'de, D>(deserializer: D) -> Result<AliasName, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    AliasName::new(&s).map_err(serde::de::Error::custom)
}

pub fn deserialize_functions<'de, D>(deserializer: D) -> Result<NonEmpty<FunctionConfig>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<FunctionEntry> = Vec::deserialize(deserializer)?;
    let functions = values
        .into_iter()
        .map(FunctionEntry::into_function_config)
        .collect::<Result<Vec<_>, _>>()
        .map_err(serde::de::Error::custom)?;

    NonEmpty::from_vec(functions)
        .ok_or_else(|| serde::de::Error::custom("at least one function is required"))
}

/// A function entry is either a bare product name or a full mapping.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FunctionEntry {
    Simple(String),
    Detailed(Box<FunctionConfig>),
}

impl FunctionEntry {
    fn into_function_config(self) -> Result<FunctionConfig, String> {
        match self {
            FunctionEntry::Simple(s) => ProductName::new(&s)
                .map(FunctionConfig::for_product)
                .map_err(|e| e.to_string()),
            FunctionEntry::Detailed(c) => Ok(*c),
        }
    }
}
