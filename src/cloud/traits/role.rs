// ABOUTME: Execution role operations trait.
// ABOUTME: Look up and create the role a function assumes; roles are never deleted.

use super::error::CloudError;
use super::sealed::Sealed;
use super::shared_types::ExecutionRole;
use async_trait::async_trait;

#[async_trait]
pub trait RoleOps: Sealed + Send + Sync {
    /// Get a role by name, `None` if it does not exist.
    async fn get_role(&self, name: &str) -> Result<Option<ExecutionRole>, CloudError>;

    /// Create a role with the given trust policy, returning the role as the
    /// service reported it.
    async fn create_role(
        &self,
        name: &str,
        trust_policy: &str,
    ) -> Result<ExecutionRole, CloudError>;

    /// Attach a managed policy to a role.
    async fn attach_role_policy(&self, name: &str, policy_arn: &str) -> Result<(), CloudError>;
}
