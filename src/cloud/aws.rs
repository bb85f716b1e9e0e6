// ABOUTME: AWS SDK backed implementation of the cloud capability traits.
// ABOUTME: Lambda for functions/aliases/invoke, IAM for roles, STS for the account id.

use crate::cloud::traits::sealed::Sealed;
use crate::cloud::traits::{
    AliasConfiguration, AliasOps, Architecture, CloudError, ExecutionRole, FunctionOps,
    FunctionSpec, IdentityOps, InvokeOps, RawFunctionConfiguration, RawInvocation, RoleOps,
};
use crate::types::{AccountId, AliasName, BOOTSTRAP_ENTRY, FunctionName, FunctionVersion};
use async_trait::async_trait;
use aws_sdk_lambda::client::Waiters;
use aws_sdk_lambda::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::{Environment, FunctionCode, Runtime};
use bytes::Bytes;
use std::time::Duration;

/// Custom runtime the packaged `bootstrap` executable targets.
const CUSTOM_RUNTIME: &str = "provided.al2023";

/// Upper bound for a published version to leave the pending state.
const ACTIVATION_TIMEOUT: Duration = Duration::from_secs(5 * 60);

// =============================================================================
// Error Mapping Helpers
// =============================================================================

fn map_sdk_error<E, R>(operation: &'static str, err: SdkError<E, R>) -> CloudError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(&err).to_string());

    match err.code() {
        Some("AccessDenied" | "AccessDeniedException") => {
            CloudError::AccessDenied { operation, message }
        }
        Some("ResourceNotFoundException" | "NoSuchEntity") => {
            CloudError::NotFound { operation, message }
        }
        Some("ResourceConflictException" | "EntityAlreadyExists") => {
            CloudError::AlreadyExists { operation, message }
        }
        Some("TooManyRequestsException" | "Throttling" | "ThrottlingException") => {
            CloudError::Throttled { operation, message }
        }
        _ => CloudError::Service {
            operation,
            message: DisplayErrorContext(&err).to_string(),
        },
    }
}

fn is_not_found<E, R>(err: &SdkError<E, R>) -> bool
where
    E: ProvideErrorMetadata,
{
    matches!(
        err.code(),
        Some("ResourceNotFoundException" | "NoSuchEntity")
    )
}

fn role_from_iam(role: &aws_sdk_iam::types::Role) -> ExecutionRole {
    ExecutionRole {
        name: role.role_name().to_string(),
        arn: role.arn().to_string(),
    }
}

// =============================================================================
// AwsCloud
// =============================================================================

/// Cloud implementation backed by the AWS SDK clients.
///
/// The clients are cheap to clone; one `AwsCloud` is shared by every
/// pipeline of a run.
#[derive(Clone)]
pub struct AwsCloud {
    lambda: aws_sdk_lambda::Client,
    iam: aws_sdk_iam::Client,
    sts: aws_sdk_sts::Client,
}

impl AwsCloud {
    /// Build the clients from an already loaded SDK configuration.
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            lambda: aws_sdk_lambda::Client::new(config),
            iam: aws_sdk_iam::Client::new(config),
            sts: aws_sdk_sts::Client::new(config),
        }
    }

    /// Load credentials and region from the environment, optionally
    /// overriding the region.
    pub async fn from_env(region: Option<String>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region));
        }
        let config = loader.load().await;
        Self::new(&config)
    }
}

impl Sealed for AwsCloud {}

#[async_trait]
impl FunctionOps for AwsCloud {
    async fn get_function(
        &self,
        name: &FunctionName,
    ) -> Result<Option<RawFunctionConfiguration>, CloudError> {
        tracing::debug!(function = %name, "GetFunction");
        match self
            .lambda
            .get_function()
            .function_name(name.as_str())
            .send()
            .await
        {
            Ok(output) => Ok(output.configuration().map(|c| RawFunctionConfiguration {
                function_name: c.function_name().map(str::to_string),
                code_sha256: c.code_sha256().map(str::to_string),
                version: c.version().map(str::to_string),
                role: c.role().map(str::to_string),
                last_modified: c.last_modified().map(str::to_string),
            })),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(map_sdk_error("GetFunction", e)),
        }
    }

    async fn latest_published_version(
        &self,
        name: &FunctionName,
    ) -> Result<Option<FunctionVersion>, CloudError> {
        tracing::debug!(function = %name, "ListVersionsByFunction");
        let mut marker: Option<String> = None;
        let mut latest: Option<u64> = None;

        loop {
            let output = match self
                .lambda
                .list_versions_by_function()
                .function_name(name.as_str())
                .set_marker(marker.take())
                .send()
                .await
            {
                Ok(output) => output,
                Err(e) if is_not_found(&e) => return Ok(None),
                Err(e) => return Err(map_sdk_error("ListVersionsByFunction", e)),
            };

            // The unpublished version is listed alongside the numbered ones.
            let page_max = output
                .versions()
                .iter()
                .filter_map(|v| v.version())
                .filter_map(|v| FunctionVersion::new(v).number())
                .max();
            latest = latest.max(page_max);

            match output.next_marker() {
                Some(next) => marker = Some(next.to_string()),
                None => break,
            }
        }

        Ok(latest.map(|n| FunctionVersion::new(n.to_string())))
    }

    async fn create_function(
        &self,
        spec: &FunctionSpec,
        zip: Bytes,
    ) -> Result<RawFunctionConfiguration, CloudError> {
        tracing::debug!(function = %spec.function_name, role = %spec.role_arn, "CreateFunction");
        let code = FunctionCode::builder()
            .zip_file(Blob::new(zip.to_vec()))
            .build();
        let environment = Environment::builder()
            .set_variables(Some(spec.environment.clone()))
            .build();

        let output = self
            .lambda
            .create_function()
            .function_name(spec.function_name.as_str())
            .runtime(Runtime::from(CUSTOM_RUNTIME))
            .handler(BOOTSTRAP_ENTRY)
            .role(&spec.role_arn)
            .code(code)
            .architectures(aws_sdk_lambda::types::Architecture::from(
                spec.architecture.as_str(),
            ))
            .memory_size(spec.memory_mb as i32)
            .timeout(spec.timeout.as_secs() as i32)
            .environment(environment)
            .description(&spec.description)
            .publish(true)
            .send()
            .await
            .map_err(|e| map_sdk_error("CreateFunction", e))?;

        Ok(RawFunctionConfiguration {
            function_name: output.function_name().map(str::to_string),
            code_sha256: output.code_sha256().map(str::to_string),
            version: output.version().map(str::to_string),
            role: output.role().map(str::to_string),
            last_modified: output.last_modified().map(str::to_string),
        })
    }

    async fn update_function_code(
        &self,
        name: &FunctionName,
        zip: Bytes,
        architecture: Architecture,
    ) -> Result<RawFunctionConfiguration, CloudError> {
        tracing::debug!(function = %name, bytes = zip.len(), "UpdateFunctionCode");
        let output = self
            .lambda
            .update_function_code()
            .function_name(name.as_str())
            .zip_file(Blob::new(zip.to_vec()))
            .architectures(aws_sdk_lambda::types::Architecture::from(
                architecture.as_str(),
            ))
            .publish(true)
            .send()
            .await
            .map_err(|e| map_sdk_error("UpdateFunctionCode", e))?;

        Ok(RawFunctionConfiguration {
            function_name: output.function_name().map(str::to_string),
            code_sha256: output.code_sha256().map(str::to_string),
            version: output.version().map(str::to_string),
            role: output.role().map(str::to_string),
            last_modified: output.last_modified().map(str::to_string),
        })
    }

    async fn wait_until_active(
        &self,
        name: &FunctionName,
        version: &FunctionVersion,
    ) -> Result<(), CloudError> {
        tracing::debug!(function = %name, version = %version, "waiting for version to activate");
        self.lambda
            .wait_until_published_version_active()
            .function_name(name.as_str())
            .qualifier(version.as_str())
            .wait(ACTIVATION_TIMEOUT)
            .await
            .map(|_| ())
            .map_err(|e| CloudError::Service {
                operation: "GetFunctionConfiguration",
                message: format!(
                    "version {} did not become active: {}",
                    version,
                    DisplayErrorContext(&e)
                ),
            })
    }
}

#[async_trait]
impl AliasOps for AwsCloud {
    async fn get_alias(
        &self,
        function: &FunctionName,
        alias: &AliasName,
    ) -> Result<Option<AliasConfiguration>, CloudError> {
        tracing::debug!(function = %function, alias = %alias, "GetAlias");
        match self
            .lambda
            .get_alias()
            .function_name(function.as_str())
            .name(alias.as_str())
            .send()
            .await
        {
            Ok(output) => Ok(output.function_version().map(|v| AliasConfiguration {
                name: alias.clone(),
                function_version: FunctionVersion::new(v),
            })),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(map_sdk_error("GetAlias", e)),
        }
    }

    async fn create_alias(
        &self,
        function: &FunctionName,
        alias: &AliasName,
        version: &FunctionVersion,
    ) -> Result<AliasConfiguration, CloudError> {
        tracing::debug!(function = %function, alias = %alias, version = %version, "CreateAlias");
        let output = self
            .lambda
            .create_alias()
            .function_name(function.as_str())
            .name(alias.as_str())
            .function_version(version.as_str())
            .send()
            .await
            .map_err(|e| map_sdk_error("CreateAlias", e))?;

        Ok(AliasConfiguration {
            name: alias.clone(),
            function_version: FunctionVersion::new(
                output.function_version().unwrap_or(version.as_str()),
            ),
        })
    }

    async fn update_alias(
        &self,
        function: &FunctionName,
        alias: &AliasName,
        version: &FunctionVersion,
    ) -> Result<AliasConfiguration, CloudError> {
        tracing::debug!(function = %function, alias = %alias, version = %version, "UpdateAlias");
        let output = self
            .lambda
            .update_alias()
            .function_name(function.as_str())
            .name(alias.as_str())
            .function_version(version.as_str())
            .send()
            .await
            .map_err(|e| map_sdk_error("UpdateAlias", e))?;

        Ok(AliasConfiguration {
            name: alias.clone(),
            function_version: FunctionVersion::new(
                output.function_version().unwrap_or(version.as_str()),
            ),
        })
    }
}

#[async_trait]
impl InvokeOps for AwsCloud {
    async fn invoke(
        &self,
        function: &FunctionName,
        qualifier: &str,
        payload: Bytes,
    ) -> Result<RawInvocation, CloudError> {
        tracing::debug!(function = %function, qualifier, "Invoke");
        let output = self
            .lambda
            .invoke()
            .function_name(function.as_str())
            .qualifier(qualifier)
            .payload(Blob::new(payload.to_vec()))
            .send()
            .await
            .map_err(|e| map_sdk_error("Invoke", e))?;

        Ok(RawInvocation {
            status_code: output.status_code(),
            payload: output
                .payload()
                .map(|b| Bytes::copy_from_slice(b.as_ref()))
                .unwrap_or_default(),
            function_error: output.function_error().map(str::to_string),
            executed_version: output.executed_version().map(str::to_string),
        })
    }
}

#[async_trait]
impl IdentityOps for AwsCloud {
    async fn caller_account_id(&self) -> Result<Option<AccountId>, CloudError> {
        tracing::debug!("GetCallerIdentity");
        let output = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| map_sdk_error("GetCallerIdentity", e))?;

        Ok(output
            .account()
            .filter(|a| !a.is_empty())
            .map(AccountId::new))
    }
}

#[async_trait]
impl RoleOps for AwsCloud {
    async fn get_role(&self, name: &str) -> Result<Option<ExecutionRole>, CloudError> {
        tracing::debug!(role = name, "GetRole");
        match self.iam.get_role().role_name(name).send().await {
            Ok(output) => Ok(output.role().map(role_from_iam)),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(map_sdk_error("GetRole", e)),
        }
    }

    async fn create_role(
        &self,
        name: &str,
        trust_policy: &str,
    ) -> Result<ExecutionRole, CloudError> {
        tracing::debug!(role = name, "CreateRole");
        let output = self
            .iam
            .create_role()
            .role_name(name)
            .assume_role_policy_document(trust_policy)
            .description("Execution role created by lamina")
            .send()
            .await
            .map_err(|e| map_sdk_error("CreateRole", e))?;

        output.role().map(role_from_iam).ok_or(CloudError::Service {
            operation: "CreateRole",
            message: "response did not include the created role".to_string(),
        })
    }

    async fn attach_role_policy(&self, name: &str, policy_arn: &str) -> Result<(), CloudError> {
        tracing::debug!(role = name, policy = policy_arn, "AttachRolePolicy");
        self.iam
            .attach_role_policy()
            .role_name(name)
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(|e| map_sdk_error("AttachRolePolicy", e))?;
        Ok(())
    }
}
