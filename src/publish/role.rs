// ABOUTME: Idempotent execution role resolution shared by concurrent deployments.
// ABOUTME: A per-role-name lock makes lookup-then-create happen at most once per name.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::cloud::{CloudError, ExecutionRole, IdentityOps, RoleOps};
use crate::types::{AccountId, FunctionName};

use super::error::PublishError;

/// Managed policy granting log delivery to new roles.
pub const BASIC_EXECUTION_POLICY_ARN: &str =
    "arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";

/// Trust policy letting the function service assume the role.
pub const LAMBDA_TRUST_POLICY: &str = r#"{"Version":"2012-10-17","Statement":[{"Effect":"Allow","Principal":{"Service":"lambda.amazonaws.com"},"Action":"sts:AssumeRole"}]}"#;

const ROLE_NAME_PREFIX: &str = "lamina-";
const MAX_ROLE_NAME_LEN: usize = 64;

/// Async locks keyed by role name.
///
/// The map itself is guarded by a short synchronous lock; the per-name
/// async lock is what is held across the remote lookup and create.
#[derive(Debug, Default)]
pub struct RoleLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl RoleLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, role_name: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.locks
            .lock()
            .entry(role_name.to_string())
            .or_default()
            .clone()
    }
}

/// Role name used when a function has no explicit role.
///
/// Deterministic so every deployment of a function converges on one role.
/// Names that would exceed the service limit are shortened with a hash suffix.
pub fn synthesize_role_name(function: &FunctionName) -> String {
    let name = format!("{}{}", ROLE_NAME_PREFIX, function);
    if name.len() <= MAX_ROLE_NAME_LEN {
        return name;
    }

    let suffix = format!("-{:08x}", fnv1a(function.as_str()));
    let keep = MAX_ROLE_NAME_LEN - suffix.len();
    format!("{}{}", &name[..keep], suffix)
}

fn fnv1a(value: &str) -> u32 {
    value.bytes().fold(0x811c_9dc5, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(0x0100_0193)
    })
}

/// ARN of a role in the given account.
pub fn role_arn(account: &AccountId, role_name: &str) -> String {
    format!("arn:aws:iam::{}:role/{}", account, role_name)
}

/// Resolves execution roles, creating a synthesized one when missing.
pub struct RoleResolver<'a> {
    locks: &'a RoleLocks,
}

impl<'a> RoleResolver<'a> {
    pub fn new(locks: &'a RoleLocks) -> Self {
        Self { locks }
    }

    /// Resolve the role for `function`.
    ///
    /// An explicit ARN is used as-is with no remote call. Otherwise the
    /// caller's account id must be known; it is never defaulted.
    pub async fn resolve<C: IdentityOps + RoleOps + ?Sized>(
        &self,
        cloud: &C,
        function: &FunctionName,
        explicit_arn: Option<&str>,
    ) -> Result<ExecutionRole, PublishError> {
        if let Some(arn) = explicit_arn {
            return Ok(ExecutionRole::from_arn(arn));
        }

        let account = cloud
            .caller_account_id()
            .await
            .map_err(|e| PublishError::AccountIdUnavailable(e.to_string()))?
            .filter(AccountId::is_well_formed)
            .ok_or_else(|| {
                PublishError::AccountIdUnavailable(
                    "identity service returned no usable account".into(),
                )
            })?;

        let role_name = synthesize_role_name(function);
        let lock = self.locks.lock_for(&role_name);
        let _guard = lock.lock().await;

        if let Some(role) = cloud.get_role(&role_name).await? {
            tracing::debug!(role = %role.name, "reusing execution role");
            return Ok(role);
        }

        tracing::info!(role = %role_name, "creating execution role");

        let created = match cloud.create_role(&role_name, LAMBDA_TRUST_POLICY).await {
            Ok(created) => created,
            // Another process won the create; its role is as good as ours.
            Err(CloudError::AlreadyExists { .. }) => {
                tracing::debug!(role = %role_name, "role created elsewhere, looking it up");
                cloud.get_role(&role_name).await?.ok_or_else(|| {
                    PublishError::Cloud(CloudError::NotFound {
                        operation: "GetRole",
                        message: format!("{} reported as existing but not found", role_name),
                    })
                })?
            }
            Err(e) => return Err(e.into()),
        };
        if created.name != role_name {
            return Err(PublishError::InvalidCreateRoleResponse {
                expected: role_name,
                received: created.name,
            });
        }

        cloud
            .attach_role_policy(&role_name, BASIC_EXECUTION_POLICY_ARN)
            .await?;

        let arn = if created.arn.is_empty() {
            role_arn(&account, &role_name)
        } else {
            created.arn
        };

        Ok(ExecutionRole {
            name: role_name,
            arn,
        })
    }
}
