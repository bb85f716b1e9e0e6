// ABOUTME: State transition methods for blue-green publishing.
// ABOUTME: Each method consumes self and returns the next state on success.

use bytes::Bytes;
use std::path::Path;

use crate::cloud::{
    AliasOps, CloudError, CloudOps, ExecutionRole, FunctionOps, FunctionSpec, IdentityOps,
    InvokeOps, RoleOps,
};
use crate::invoke::{Expectation, InvokeError, LambdaInvoker};
use crate::types::{ProductName, validate_archive_name};

use super::Deployment;
use super::deployment::DeployTarget;
use super::error::PublishError;
use super::role::RoleResolver;
use super::state::{
    AliasResolved, CutOver, RoleResolved, RolledBack, Uploaded, Validated, Verified,
};

/// Result type for transitions that hand the deployment back on failure so
/// the caller can roll it back.
pub type TransitionResult<T, S, E = PublishError> = Result<Deployment<T>, (Deployment<S>, E)>;

// =============================================================================
// -> Validated
// =============================================================================

impl Deployment<Validated> {
    /// Check the archive locally. No remote call is made.
    ///
    /// # Errors
    ///
    /// `ArchiveDoesNotExist` if nothing is at `archive_path`, then
    /// `InvalidArchiveName` if it is not named after `executable`.
    pub fn validate(
        target: DeployTarget,
        archive_path: &Path,
        executable: &ProductName,
    ) -> Result<Self, PublishError> {
        if !archive_path.is_file() {
            return Err(PublishError::ArchiveDoesNotExist(archive_path.to_path_buf()));
        }

        let archive = validate_archive_name(archive_path, executable)?;

        Ok(Deployment {
            target,
            archive,
            previous_version: None,
            state: Validated,
        })
    }

    /// Publish the archive as a new immutable version and wait for it to
    /// become invocable.
    ///
    /// Records the previous stable version first. A function that does not
    /// exist yet is created, which needs its execution role resolved now.
    /// An existing function keeps the role it already runs with.
    #[must_use = "deployment state must be used"]
    pub async fn upload<C: FunctionOps + IdentityOps + RoleOps + ?Sized>(
        mut self,
        cloud: &C,
        roles: &RoleResolver<'_>,
    ) -> Result<Deployment<Uploaded>, PublishError> {
        let path = self.archive.path();
        let zip = tokio::fs::read(path)
            .await
            .map(Bytes::from)
            .map_err(|e| PublishError::ArchiveUnreadable {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let function = &self.target.function;
        let existing = cloud.get_function(function).await?;

        let (configuration, role) = match existing {
            Some(current) => {
                self.previous_version = cloud.latest_published_version(function).await?;
                let role = current.role.as_deref().map(ExecutionRole::from_arn);

                if let (Some(configured), Some(in_use)) = (&self.target.role_arn, &role)
                    && *configured != in_use.arn
                {
                    tracing::warn!(
                        function = %function,
                        configured = %configured,
                        in_use = %in_use.arn,
                        "configured role only applies when the function is created"
                    );
                }

                tracing::info!(
                    function = %function,
                    previous = ?self.previous_version.as_ref().map(|v| v.as_str()),
                    "updating function code"
                );

                let raw = cloud
                    .update_function_code(function, zip, self.target.architecture)
                    .await?;
                (published(raw, "UpdateFunctionCode")?, role)
            }
            None => {
                let role = roles
                    .resolve(cloud, function, self.target.role_arn.as_deref())
                    .await?;

                tracing::info!(function = %function, role = %role.arn, "creating function");

                let spec = FunctionSpec {
                    function_name: function.clone(),
                    role_arn: role.arn.clone(),
                    architecture: self.target.architecture,
                    memory_mb: self.target.memory_mb,
                    timeout: self.target.timeout,
                    environment: self.target.environment.clone(),
                    description: self.target.description.clone(),
                };

                let raw = cloud.create_function(&spec, zip).await?;
                (published(raw, "CreateFunction")?, Some(role))
            }
        };

        cloud
            .wait_until_active(&self.target.function, &configuration.version)
            .await?;

        tracing::info!(
            function = %self.target.function,
            version = %configuration.version,
            sha = %configuration.code_sha256,
            "published"
        );

        Ok(self.transition(Uploaded {
            configuration,
            role,
        }))
    }
}

// =============================================================================
// Uploaded -> RoleResolved
// =============================================================================

impl Deployment<Uploaded> {
    /// Settle the execution role the published version runs with.
    ///
    /// A created function has the role resolved for it during upload; an
    /// updated one keeps its existing role. No remote call is made.
    ///
    /// # Errors
    ///
    /// `InvalidFunctionConfiguration` if the service never reported the
    /// existing function's role.
    #[must_use = "deployment state must be used"]
    pub fn resolve_role(self) -> Result<Deployment<RoleResolved>, PublishError> {
        let role = self
            .state
            .role
            .clone()
            .ok_or(PublishError::InvalidFunctionConfiguration {
                field: "role",
                source_call: "GetFunction",
            })?;

        let configuration = self.state.configuration.clone();
        Ok(self.transition(RoleResolved {
            configuration,
            role,
        }))
    }
}

// =============================================================================
// RoleResolved -> AliasResolved
// =============================================================================

impl Deployment<RoleResolved> {
    /// Make sure the alias exists where possible, without touching live traffic.
    ///
    /// An absent alias is created on the previous version so traffic has a
    /// stable target. On a first deployment there is no previous version and
    /// the alias is left for cutover to create.
    #[must_use = "deployment state must be used"]
    pub async fn resolve_alias<C: AliasOps + ?Sized>(
        self,
        cloud: &C,
    ) -> Result<Deployment<AliasResolved>, PublishError> {
        let function = &self.target.function;
        let alias_name = &self.target.alias;

        let alias = match cloud.get_alias(function, alias_name).await? {
            Some(alias) => Some(alias),
            None => match self.previous_version {
                Some(ref previous) => {
                    tracing::info!(
                        alias = %alias_name,
                        version = %previous,
                        "creating alias on previous version"
                    );
                    Some(cloud.create_alias(function, alias_name, previous).await?)
                }
                None => None,
            },
        };

        let RoleResolved {
            configuration,
            role,
        } = self.state.clone();

        Ok(self.transition(AliasResolved {
            configuration,
            role,
            alias,
        }))
    }
}

// =============================================================================
// AliasResolved -> Verified | RolledBack
// =============================================================================

impl Deployment<AliasResolved> {
    /// Invoke the new version by number and judge the response.
    ///
    /// # Errors
    ///
    /// Hands the deployment back with the invocation error so it can be
    /// rolled back. The alias has not been touched.
    #[must_use = "deployment state must be used"]
    pub async fn verify<C: InvokeOps + ?Sized>(
        self,
        invoker: &LambdaInvoker<'_, C>,
        payload: Bytes,
        expectation: &Expectation,
    ) -> TransitionResult<Verified, AliasResolved, InvokeError> {
        let qualifier = self.state.configuration.version.as_str().to_string();

        match invoker
            .invoke_and_verify(&self.target.function, &qualifier, payload, expectation)
            .await
        {
            Ok(invocation) => {
                tracing::info!(function = %self.target.function, version = %qualifier, "verified");
                let AliasResolved {
                    configuration,
                    role,
                    alias,
                } = self.state.clone();
                Ok(self.transition(Verified {
                    configuration,
                    role,
                    alias,
                    invocation,
                }))
            }
            Err(e) => Err((self, e)),
        }
    }

    /// Abandon the new version. No remote call is made.
    pub fn roll_back(self, reason: impl Into<String>) -> Deployment<RolledBack> {
        let AliasResolved {
            configuration,
            role,
            alias,
        } = self.state.clone();
        self.into_rolled_back(configuration, role, alias, reason.into())
    }
}

// =============================================================================
// Verified -> CutOver | RolledBack
// =============================================================================

impl Deployment<Verified> {
    /// Point the alias at the new version. This is the only routing write.
    ///
    /// # Errors
    ///
    /// Hands the deployment back with `CutoverFailed`; traffic is still on
    /// whatever the alias pointed at before.
    #[must_use = "deployment state must be used"]
    pub async fn cutover<C: AliasOps + ?Sized>(self, cloud: &C) -> TransitionResult<CutOver, Verified> {
        let function = &self.target.function;
        let alias_name = &self.target.alias;
        let version = &self.state.configuration.version;

        let result = match self.state.alias {
            Some(_) => cloud.update_alias(function, alias_name, version).await,
            None => match cloud.create_alias(function, alias_name, version).await {
                // Created concurrently since the alias was resolved.
                Err(CloudError::AlreadyExists { .. }) => {
                    cloud.update_alias(function, alias_name, version).await
                }
                other => other,
            },
        };

        match result {
            Ok(alias) => {
                tracing::info!(
                    function = %function,
                    alias = %alias_name,
                    version = %alias.function_version,
                    "cut over"
                );
                let Verified {
                    configuration,
                    role,
                    invocation,
                    ..
                } = self.state.clone();
                Ok(self.transition(CutOver {
                    configuration,
                    role,
                    alias,
                    invocation,
                }))
            }
            Err(e) => Err((self, PublishError::CutoverFailed(e.to_string()))),
        }
    }

    /// Abandon the verified version, e.g. after a failed cutover.
    pub fn roll_back(self, reason: impl Into<String>) -> Deployment<RolledBack> {
        let Verified {
            configuration,
            role,
            alias,
            ..
        } = self.state.clone();
        self.into_rolled_back(configuration, role, alias, reason.into())
    }
}

/// Check a publish response and that it names an immutable version.
fn published(
    raw: crate::cloud::RawFunctionConfiguration,
    source_call: &'static str,
) -> Result<crate::cloud::FunctionConfiguration, PublishError> {
    let configuration = raw.require_fields(source_call)?;
    if !configuration.version.is_published() {
        return Err(PublishError::InvalidFunctionConfiguration {
            field: "version",
            source_call,
        });
    }
    Ok(configuration)
}

impl<S> Deployment<S> {
    fn into_rolled_back(
        self,
        configuration: crate::cloud::FunctionConfiguration,
        role: crate::cloud::ExecutionRole,
        alias: Option<crate::cloud::AliasConfiguration>,
        reason: String,
    ) -> Deployment<RolledBack> {
        tracing::warn!(
            function = %self.target.function,
            orphaned = %configuration.version,
            reason = %reason,
            "rolled back"
        );
        self.transition(RolledBack {
            configuration,
            role,
            alias,
            reason,
        })
    }
}

/// Run every transition up to verification against one cloud client.
///
/// Convenience for callers that do not need to interleave their own logic.
pub async fn publish_and_verify<C: CloudOps + ?Sized>(
    deployment: Deployment<Validated>,
    cloud: &C,
    roles: &RoleResolver<'_>,
    payload: Bytes,
    expectation: &Expectation,
) -> Result<TransitionResult<Verified, AliasResolved, InvokeError>, PublishError> {
    let resolved = deployment
        .upload(cloud, roles)
        .await?
        .resolve_role()?
        .resolve_alias(cloud)
        .await?;

    let invoker = LambdaInvoker::new(cloud);
    Ok(resolved.verify(&invoker, payload, expectation).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::RawFunctionConfiguration;
    use crate::types::UNPUBLISHED_VERSION;

    fn raw(version: &str) -> RawFunctionConfiguration {
        RawFunctionConfiguration {
            function_name: Some("orders".to_string()),
            code_sha256: Some("c2hh".to_string()),
            version: Some(version.to_string()),
            role: None,
            last_modified: None,
        }
    }

    #[test]
    fn numbered_version_is_published() {
        let configuration = published(raw("4"), "UpdateFunctionCode").unwrap();
        assert_eq!(configuration.version.number(), Some(4));
    }

    #[test]
    fn unpublished_code_cannot_be_routed_to() {
        let err = published(raw(UNPUBLISHED_VERSION), "CreateFunction").unwrap_err();
        assert!(matches!(
            err,
            PublishError::InvalidFunctionConfiguration {
                field: "version",
                source_call: "CreateFunction"
            }
        ));
    }
}
