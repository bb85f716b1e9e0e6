// ABOUTME: Shared types used across cloud trait definitions.
// ABOUTME: Function/alias/role descriptors and the required-field check on service responses.

use crate::types::{AliasName, FunctionName, FunctionVersion};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Instruction set the function runs on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Architecture {
    #[default]
    #[serde(rename = "x86_64")]
    X86_64,
    #[serde(rename = "arm64")]
    Arm64,
}

impl Architecture {
    /// Name as the function service spells it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::X86_64 => "x86_64",
            Architecture::Arm64 => "arm64",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Function configuration exactly as the service returned it.
///
/// Every field is optional because the service schema does not promise
/// them; use [`RawFunctionConfiguration::require_fields`] before trusting it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFunctionConfiguration {
    pub function_name: Option<String>,
    pub code_sha256: Option<String>,
    pub version: Option<String>,
    pub role: Option<String>,
    pub last_modified: Option<String>,
}

/// A required field was absent from a service response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{source_call} response is missing required field {field}")]
pub struct MissingFieldError {
    pub field: &'static str,
    pub source_call: &'static str,
}

impl RawFunctionConfiguration {
    /// Validate that `functionName`, `codeSha256` and `version` are present.
    pub fn require_fields(
        self,
        source_call: &'static str,
    ) -> Result<FunctionConfiguration, MissingFieldError> {
        let missing = |field| MissingFieldError { field, source_call };

        let function_name = non_empty(self.function_name).ok_or_else(|| missing("functionName"))?;
        let code_sha256 = non_empty(self.code_sha256).ok_or_else(|| missing("codeSha256"))?;
        let version = non_empty(self.version).ok_or_else(|| missing("version"))?;

        Ok(FunctionConfiguration {
            function_name,
            code_sha256,
            version: FunctionVersion::new(version),
            role: self.role,
            last_modified: self.last_modified,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// A deployed function version with its required fields verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionConfiguration {
    pub function_name: String,
    pub code_sha256: String,
    pub version: FunctionVersion,
    pub role: Option<String>,
    pub last_modified: Option<String>,
}

/// Everything needed to create a function that does not exist yet.
#[derive(Debug, Clone)]
pub struct FunctionSpec {
    pub function_name: FunctionName,
    pub role_arn: String,
    pub architecture: Architecture,
    pub memory_mb: u32,
    pub timeout: Duration,
    pub environment: HashMap<String, String>,
    pub description: String,
}

/// The routing pointer from an alias name to a version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasConfiguration {
    pub name: AliasName,
    pub function_version: FunctionVersion,
}

/// An execution role the function assumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionRole {
    pub name: String,
    pub arn: String,
}

impl ExecutionRole {
    /// Role named by a full ARN; the name is the last path segment.
    pub fn from_arn(arn: &str) -> Self {
        let name = arn.rsplit('/').next().unwrap_or(arn);
        Self {
            name: name.to_string(),
            arn: arn.to_string(),
        }
    }
}

/// Invocation response before it is attributed to a function.
#[derive(Debug, Clone, Default)]
pub struct RawInvocation {
    pub status_code: i32,
    pub payload: Bytes,
    /// Set by the service when the function itself raised an error.
    pub function_error: Option<String>,
    pub executed_version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> RawFunctionConfiguration {
        RawFunctionConfiguration {
            function_name: Some("myapp".to_string()),
            code_sha256: Some("abc=".to_string()),
            version: Some("3".to_string()),
            role: None,
            last_modified: None,
        }
    }

    #[test]
    fn complete_configuration_passes() {
        let config = complete().require_fields("UpdateFunctionCode").unwrap();
        assert_eq!(config.version.as_str(), "3");
    }

    #[test]
    fn missing_version_names_field_and_call() {
        let mut raw = complete();
        raw.version = None;
        let err = raw.require_fields("CreateFunction").unwrap_err();
        assert_eq!(err.field, "version");
        assert_eq!(err.source_call, "CreateFunction");
    }

    #[test]
    fn role_name_comes_from_the_arn_path() {
        let role = ExecutionRole::from_arn("arn:aws:iam::123456789012:role/service/orders-exec");
        assert_eq!(role.name, "orders-exec");
        assert_eq!(ExecutionRole::from_arn("bare").name, "bare");
    }

    #[test]
    fn empty_sha_counts_as_missing() {
        let mut raw = complete();
        raw.code_sha256 = Some(String::new());
        let err = raw.require_fields("UpdateFunctionCode").unwrap_err();
        assert_eq!(err.field, "codeSha256");
    }
}
