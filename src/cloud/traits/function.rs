// ABOUTME: Function operations trait for the cloud function service.
// ABOUTME: Look up, create, upload new code, and wait for published versions to activate.

use super::error::CloudError;
use super::sealed::Sealed;
use super::shared_types::{Architecture, FunctionSpec, RawFunctionConfiguration};
use crate::types::{FunctionName, FunctionVersion};
use async_trait::async_trait;
use bytes::Bytes;

/// Function lifecycle operations.
#[async_trait]
pub trait FunctionOps: Sealed + Send + Sync {
    /// Get the unqualified configuration of a function, `None` if it does not exist.
    async fn get_function(
        &self,
        name: &FunctionName,
    ) -> Result<Option<RawFunctionConfiguration>, CloudError>;

    /// Highest published (numeric) version, `None` if nothing was ever published.
    async fn latest_published_version(
        &self,
        name: &FunctionName,
    ) -> Result<Option<FunctionVersion>, CloudError>;

    /// Create a function from a zip archive and publish its first version.
    async fn create_function(
        &self,
        spec: &FunctionSpec,
        zip: Bytes,
    ) -> Result<RawFunctionConfiguration, CloudError>;

    /// Replace the function code and publish the result as a new version.
    async fn update_function_code(
        &self,
        name: &FunctionName,
        zip: Bytes,
        architecture: Architecture,
    ) -> Result<RawFunctionConfiguration, CloudError>;

    /// Block until a freshly published version leaves the pending state and
    /// can be invoked. Fails if it settles in a failed state or never settles.
    async fn wait_until_active(
        &self,
        name: &FunctionName,
        version: &FunctionVersion,
    ) -> Result<(), CloudError>;
}
