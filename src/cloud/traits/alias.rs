// ABOUTME: Alias operations trait for the cloud function service.
// ABOUTME: The alias is the only routing pointer this tool ever writes.

use super::error::CloudError;
use super::sealed::Sealed;
use super::shared_types::AliasConfiguration;
use crate::types::{AliasName, FunctionName, FunctionVersion};
use async_trait::async_trait;

/// Alias operations: look up, create, repoint.
#[async_trait]
pub trait AliasOps: Sealed + Send + Sync {
    /// Get an alias, `None` if it does not exist.
    async fn get_alias(
        &self,
        function: &FunctionName,
        alias: &AliasName,
    ) -> Result<Option<AliasConfiguration>, CloudError>;

    /// Create an alias pointing at `version`.
    async fn create_alias(
        &self,
        function: &FunctionName,
        alias: &AliasName,
        version: &FunctionVersion,
    ) -> Result<AliasConfiguration, CloudError>;

    /// Repoint an existing alias at `version`.
    async fn update_alias(
        &self,
        function: &FunctionName,
        alias: &AliasName,
        version: &FunctionVersion,
    ) -> Result<AliasConfiguration, CloudError>;
}
