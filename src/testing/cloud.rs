// ABOUTME: In-memory function service that records every remote operation.
// ABOUTME: Supports failure injection, latency, and response shaping for tests.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use crate::cloud::traits::sealed::Sealed;
use crate::cloud::{
    AliasConfiguration, AliasOps, Architecture, CloudError, ExecutionRole, FunctionOps,
    FunctionSpec, IdentityOps, InvokeOps, RawFunctionConfiguration, RawInvocation, RoleOps,
};
use crate::types::{AccountId, AliasName, FunctionName, FunctionVersion, UNPUBLISHED_VERSION};

/// Record of a remote operation for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloudOp {
    GetFunction { function: String },
    LatestPublishedVersion { function: String },
    CreateFunction { function: String, role_arn: String },
    UpdateFunctionCode { function: String },
    WaitUntilActive { function: String, version: String },
    GetAlias { function: String, alias: String },
    CreateAlias { function: String, alias: String, version: String },
    UpdateAlias { function: String, alias: String, version: String },
    Invoke { function: String, qualifier: String },
    CallerAccountId,
    GetRole { name: String },
    CreateRole { name: String },
    AttachRolePolicy { name: String, policy_arn: String },
}

impl CloudOp {
    /// Service call name, as used by [`FakeCloud::fail_operation`].
    pub fn name(&self) -> &'static str {
        match self {
            CloudOp::GetFunction { .. } => "GetFunction",
            CloudOp::LatestPublishedVersion { .. } => "ListVersionsByFunction",
            CloudOp::CreateFunction { .. } => "CreateFunction",
            CloudOp::UpdateFunctionCode { .. } => "UpdateFunctionCode",
            CloudOp::WaitUntilActive { .. } => "GetFunctionConfiguration",
            CloudOp::GetAlias { .. } => "GetAlias",
            CloudOp::CreateAlias { .. } => "CreateAlias",
            CloudOp::UpdateAlias { .. } => "UpdateAlias",
            CloudOp::Invoke { .. } => "Invoke",
            CloudOp::CallerAccountId => "GetCallerIdentity",
            CloudOp::GetRole { .. } => "GetRole",
            CloudOp::CreateRole { .. } => "CreateRole",
            CloudOp::AttachRolePolicy { .. } => "AttachRolePolicy",
        }
    }

    /// Whether the operation changes what an alias routes to.
    pub fn is_alias_write(&self) -> bool {
        matches!(self, CloudOp::CreateAlias { .. } | CloudOp::UpdateAlias { .. })
    }
}

#[derive(Debug, Clone)]
struct StoredFunction {
    /// Published versions, oldest first, with their code hash.
    versions: Vec<String>,
    role: String,
}

#[derive(Debug, Default)]
struct State {
    functions: HashMap<String, StoredFunction>,
    aliases: HashMap<(String, String), String>,
    roles: BTreeMap<String, ExecutionRole>,
    account: Option<String>,
    invocation: Option<RawInvocation>,
    invocations_by_version: HashMap<String, RawInvocation>,
    failing: HashSet<&'static str>,
    omitted_fields: HashSet<&'static str>,
    created_role_name: Option<String>,
    /// Roles another process creates between our lookup and our create.
    racing_roles: HashSet<String>,
}

/// In-memory cloud with operation tracing.
#[derive(Debug, Clone)]
pub struct FakeCloud {
    state: Arc<Mutex<State>>,
    operations: Arc<Mutex<Vec<CloudOp>>>,
    latency: Option<Duration>,
}

impl Default for FakeCloud {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeCloud {
    /// Empty cloud in account `123456789012`.
    pub fn new() -> Self {
        let state = State {
            account: Some("123456789012".to_string()),
            ..State::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            operations: Arc::new(Mutex::new(Vec::new())),
            latency: None,
        }
    }

    /// Sleep this long inside every operation.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make the identity service return no account.
    pub fn without_account(self) -> Self {
        self.state.lock().account = None;
        self
    }

    /// Make the identity service return `account` verbatim.
    pub fn with_account(self, account: &str) -> Self {
        self.state.lock().account = Some(account.to_string());
        self
    }

    /// Seed a function with `published` numbered versions.
    pub fn with_function(self, function: &str, published: u64) -> Self {
        let versions = (1..=published).map(|v| format!("seed-{}", v)).collect();
        self.state.lock().functions.insert(
            function.to_string(),
            StoredFunction {
                versions,
                role: format!("arn:aws:iam::123456789012:role/{}-seed", function),
            },
        );
        self
    }

    /// Seed an alias pointing at `version`.
    pub fn with_alias(self, function: &str, alias: &str, version: &str) -> Self {
        self.state
            .lock()
            .aliases
            .insert((function.to_string(), alias.to_string()), version.to_string());
        self
    }

    /// Seed an existing role.
    pub fn with_role(self, name: &str) -> Self {
        let role = ExecutionRole {
            name: name.to_string(),
            arn: format!("arn:aws:iam::123456789012:role/{}", name),
        };
        self.state.lock().roles.insert(name.to_string(), role);
        self
    }

    /// Every invocation returns `response`.
    pub fn respond_with(&self, response: RawInvocation) {
        self.state.lock().invocation = Some(response);
    }

    /// Invocations of `version` return `response`.
    pub fn respond_for_version(&self, version: &str, response: RawInvocation) {
        self.state
            .lock()
            .invocations_by_version
            .insert(version.to_string(), response);
    }

    /// Make the named service call fail (see [`CloudOp::name`]).
    pub fn fail_operation(&self, call: &'static str) {
        self.state.lock().failing.insert(call);
    }

    /// Drop a field (`functionName`, `codeSha256`, `version`) from function responses.
    pub fn omit_field(&self, field: &'static str) {
        self.state.lock().omitted_fields.insert(field);
    }

    /// Make role creation report a different role name.
    pub fn rename_created_roles(&self, name: &str) {
        self.state.lock().created_role_name = Some(name.to_string());
    }

    /// Have `name` appear, created by someone else, just as this process
    /// tries to create it.
    pub fn create_role_concurrently(&self, name: &str) {
        self.state.lock().racing_roles.insert(name.to_string());
    }

    /// Returns all recorded operations.
    pub fn operations(&self) -> Vec<CloudOp> {
        self.operations.lock().clone()
    }

    /// Number of recorded operations with the given service call name.
    pub fn count(&self, call: &str) -> usize {
        self.operations
            .lock()
            .iter()
            .filter(|op| op.name() == call)
            .count()
    }

    /// Clears recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    /// Version an alias currently routes to.
    pub fn alias_version(&self, function: &str, alias: &str) -> Option<String> {
        self.state
            .lock()
            .aliases
            .get(&(function.to_string(), alias.to_string()))
            .cloned()
    }

    /// Number of published versions of a function.
    pub fn published_versions(&self, function: &str) -> usize {
        self.state
            .lock()
            .functions
            .get(function)
            .map(|f| f.versions.len())
            .unwrap_or(0)
    }

    /// Names of all roles that exist.
    pub fn roles(&self) -> Vec<String> {
        self.state.lock().roles.keys().cloned().collect()
    }

    async fn begin(&self, op: CloudOp) -> Result<(), CloudError> {
        let call = op.name();
        self.operations.lock().push(op);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self.state.lock().failing.contains(call) {
            return Err(CloudError::Service {
                operation: call,
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn configuration(&self, function: &str, stored: &StoredFunction) -> RawFunctionConfiguration {
        let state = self.state.lock();
        let omitted = &state.omitted_fields;
        let keep = |field: &str, value: String| (!omitted.contains(field)).then_some(value);

        RawFunctionConfiguration {
            function_name: keep("functionName", function.to_string()),
            code_sha256: stored
                .versions
                .last()
                .cloned()
                .and_then(|sha| keep("codeSha256", sha)),
            version: keep("version", stored.versions.len().to_string()),
            role: Some(stored.role.clone()),
            last_modified: None,
        }
    }
}

fn code_sha(zip: &Bytes) -> String {
    let hash = zip.iter().fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(0x0000_0100_0000_01b3)
    });
    format!("{:016x}", hash)
}

impl Sealed for FakeCloud {}

#[async_trait]
impl FunctionOps for FakeCloud {
    async fn get_function(
        &self,
        name: &FunctionName,
    ) -> Result<Option<RawFunctionConfiguration>, CloudError> {
        self.begin(CloudOp::GetFunction {
            function: name.to_string(),
        })
        .await?;

        let stored = self.state.lock().functions.get(name.as_str()).cloned();
        Ok(stored.map(|s| {
            let mut config = self.configuration(name.as_str(), &s);
            config.version = Some(UNPUBLISHED_VERSION.to_string());
            config
        }))
    }

    async fn latest_published_version(
        &self,
        name: &FunctionName,
    ) -> Result<Option<FunctionVersion>, CloudError> {
        self.begin(CloudOp::LatestPublishedVersion {
            function: name.to_string(),
        })
        .await?;

        let state = self.state.lock();
        Ok(state
            .functions
            .get(name.as_str())
            .filter(|f| !f.versions.is_empty())
            .map(|f| FunctionVersion::new(f.versions.len().to_string())))
    }

    async fn create_function(
        &self,
        spec: &FunctionSpec,
        zip: Bytes,
    ) -> Result<RawFunctionConfiguration, CloudError> {
        self.begin(CloudOp::CreateFunction {
            function: spec.function_name.to_string(),
            role_arn: spec.role_arn.clone(),
        })
        .await?;

        let name = spec.function_name.to_string();
        let stored = {
            let mut state = self.state.lock();
            if state.functions.contains_key(&name) {
                return Err(CloudError::AlreadyExists {
                    operation: "CreateFunction",
                    message: format!("function {} exists", name),
                });
            }
            let stored = StoredFunction {
                versions: vec![code_sha(&zip)],
                role: spec.role_arn.clone(),
            };
            state.functions.insert(name.clone(), stored.clone());
            stored
        };

        Ok(self.configuration(&name, &stored))
    }

    async fn update_function_code(
        &self,
        name: &FunctionName,
        zip: Bytes,
        _architecture: Architecture,
    ) -> Result<RawFunctionConfiguration, CloudError> {
        self.begin(CloudOp::UpdateFunctionCode {
            function: name.to_string(),
        })
        .await?;

        let stored = {
            let mut state = self.state.lock();
            let stored = state.functions.get_mut(name.as_str()).ok_or_else(|| {
                CloudError::NotFound {
                    operation: "UpdateFunctionCode",
                    message: format!("function {} not found", name),
                }
            })?;
            stored.versions.push(code_sha(&zip));
            stored.clone()
        };

        Ok(self.configuration(name.as_str(), &stored))
    }

    async fn wait_until_active(
        &self,
        name: &FunctionName,
        version: &FunctionVersion,
    ) -> Result<(), CloudError> {
        self.begin(CloudOp::WaitUntilActive {
            function: name.to_string(),
            version: version.to_string(),
        })
        .await
    }
}

#[async_trait]
impl AliasOps for FakeCloud {
    async fn get_alias(
        &self,
        function: &FunctionName,
        alias: &AliasName,
    ) -> Result<Option<AliasConfiguration>, CloudError> {
        self.begin(CloudOp::GetAlias {
            function: function.to_string(),
            alias: alias.to_string(),
        })
        .await?;

        Ok(self
            .alias_version(function.as_str(), alias.as_str())
            .map(|version| AliasConfiguration {
                name: alias.clone(),
                function_version: FunctionVersion::new(version),
            }))
    }

    async fn create_alias(
        &self,
        function: &FunctionName,
        alias: &AliasName,
        version: &FunctionVersion,
    ) -> Result<AliasConfiguration, CloudError> {
        self.begin(CloudOp::CreateAlias {
            function: function.to_string(),
            alias: alias.to_string(),
            version: version.to_string(),
        })
        .await?;

        let key = (function.to_string(), alias.to_string());
        let mut state = self.state.lock();
        if state.aliases.contains_key(&key) {
            return Err(CloudError::AlreadyExists {
                operation: "CreateAlias",
                message: format!("alias {} exists", alias),
            });
        }
        state.aliases.insert(key, version.to_string());

        Ok(AliasConfiguration {
            name: alias.clone(),
            function_version: version.clone(),
        })
    }

    async fn update_alias(
        &self,
        function: &FunctionName,
        alias: &AliasName,
        version: &FunctionVersion,
    ) -> Result<AliasConfiguration, CloudError> {
        self.begin(CloudOp::UpdateAlias {
            function: function.to_string(),
            alias: alias.to_string(),
            version: version.to_string(),
        })
        .await?;

        let key = (function.to_string(), alias.to_string());
        let mut state = self.state.lock();
        match state.aliases.get_mut(&key) {
            Some(current) => *current = version.to_string(),
            None => {
                return Err(CloudError::NotFound {
                    operation: "UpdateAlias",
                    message: format!("alias {} not found", alias),
                });
            }
        }

        Ok(AliasConfiguration {
            name: alias.clone(),
            function_version: version.clone(),
        })
    }
}

#[async_trait]
impl InvokeOps for FakeCloud {
    async fn invoke(
        &self,
        function: &FunctionName,
        qualifier: &str,
        _payload: Bytes,
    ) -> Result<RawInvocation, CloudError> {
        self.begin(CloudOp::Invoke {
            function: function.to_string(),
            qualifier: qualifier.to_string(),
        })
        .await?;

        let state = self.state.lock();
        let response = state
            .invocations_by_version
            .get(qualifier)
            .or(state.invocation.as_ref())
            .cloned()
            .unwrap_or_else(|| RawInvocation {
                status_code: 200,
                payload: Bytes::from_static(br#"{"ok":true}"#),
                function_error: None,
                executed_version: None,
            });

        Ok(RawInvocation {
            executed_version: Some(qualifier.to_string()),
            ..response
        })
    }
}

#[async_trait]
impl IdentityOps for FakeCloud {
    async fn caller_account_id(&self) -> Result<Option<AccountId>, CloudError> {
        self.begin(CloudOp::CallerAccountId).await?;
        Ok(self.state.lock().account.clone().map(AccountId::new))
    }
}

#[async_trait]
impl RoleOps for FakeCloud {
    async fn get_role(&self, name: &str) -> Result<Option<ExecutionRole>, CloudError> {
        self.begin(CloudOp::GetRole {
            name: name.to_string(),
        })
        .await?;
        Ok(self.state.lock().roles.get(name).cloned())
    }

    async fn create_role(
        &self,
        name: &str,
        _trust_policy: &str,
    ) -> Result<ExecutionRole, CloudError> {
        self.begin(CloudOp::CreateRole {
            name: name.to_string(),
        })
        .await?;

        let mut state = self.state.lock();
        if state.racing_roles.remove(name) {
            let role = ExecutionRole {
                name: name.to_string(),
                arn: format!("arn:aws:iam::123456789012:role/{}", name),
            };
            state.roles.insert(name.to_string(), role);
        }
        if state.roles.contains_key(name) {
            return Err(CloudError::AlreadyExists {
                operation: "CreateRole",
                message: format!("role {} exists", name),
            });
        }

        let reported = state
            .created_role_name
            .clone()
            .unwrap_or_else(|| name.to_string());
        let role = ExecutionRole {
            name: name.to_string(),
            arn: format!("arn:aws:iam::123456789012:role/{}", name),
        };
        state.roles.insert(name.to_string(), role.clone());

        Ok(ExecutionRole {
            name: reported,
            ..role
        })
    }

    async fn attach_role_policy(&self, name: &str, policy_arn: &str) -> Result<(), CloudError> {
        self.begin(CloudOp::AttachRolePolicy {
            name: name.to_string(),
            policy_arn: policy_arn.to_string(),
        })
        .await
    }
}
