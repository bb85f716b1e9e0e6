// ABOUTME: Invoke operations trait for the cloud function service.
// ABOUTME: Synchronous request/response invocation of a version or alias.

use super::error::CloudError;
use super::sealed::Sealed;
use super::shared_types::RawInvocation;
use crate::types::FunctionName;
use async_trait::async_trait;
use bytes::Bytes;

#[async_trait]
pub trait InvokeOps: Sealed + Send + Sync {
    /// Invoke `function` at `qualifier` (a version number or alias name).
    async fn invoke(
        &self,
        function: &FunctionName,
        qualifier: &str,
        payload: Bytes,
    ) -> Result<RawInvocation, CloudError>;
}
