// ABOUTME: Identity lookup trait.
// ABOUTME: Resolves the account the caller's credentials belong to.

use super::error::CloudError;
use super::sealed::Sealed;
use crate::types::AccountId;
use async_trait::async_trait;

#[async_trait]
pub trait IdentityOps: Sealed + Send + Sync {
    /// Account id of the calling credentials. `None` when the service
    /// answered without one.
    async fn caller_account_id(&self) -> Result<Option<AccountId>, CloudError>;
}
