// ABOUTME: Publisher state types for the type state pattern.
// ABOUTME: Each state carries exactly the data that exists once it is reached.

use crate::cloud::{AliasConfiguration, ExecutionRole, FunctionConfiguration};
use crate::invoke::InvocationResult;

/// Archive checked locally. Available actions: `upload()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Validated;

/// New code published as an immutable version. Available actions: `resolve_role()`
#[derive(Debug, Clone)]
pub struct Uploaded {
    pub(crate) configuration: FunctionConfiguration,
    /// Resolved for a created function, read back for an existing one.
    pub(crate) role: Option<ExecutionRole>,
}

/// Execution role known. Available actions: `resolve_alias()`
#[derive(Debug, Clone)]
pub struct RoleResolved {
    pub(crate) configuration: FunctionConfiguration,
    pub(crate) role: ExecutionRole,
}

/// Alias state known. `alias` is `None` on a first deployment.
/// Available actions: `verify()`, `roll_back()`
#[derive(Debug, Clone)]
pub struct AliasResolved {
    pub(crate) configuration: FunctionConfiguration,
    pub(crate) role: ExecutionRole,
    pub(crate) alias: Option<AliasConfiguration>,
}

/// New version invoked directly and judged correct.
/// Available actions: `cutover()`, `roll_back()`
#[derive(Debug, Clone)]
pub struct Verified {
    pub(crate) configuration: FunctionConfiguration,
    pub(crate) role: ExecutionRole,
    pub(crate) alias: Option<AliasConfiguration>,
    pub(crate) invocation: InvocationResult,
}

/// Alias points at the new version. Terminal.
#[derive(Debug, Clone)]
pub struct CutOver {
    pub(crate) configuration: FunctionConfiguration,
    pub(crate) role: ExecutionRole,
    pub(crate) alias: AliasConfiguration,
    pub(crate) invocation: InvocationResult,
}

/// Alias left untouched; the new version is orphaned. Terminal.
#[derive(Debug, Clone)]
pub struct RolledBack {
    pub(crate) configuration: FunctionConfiguration,
    pub(crate) role: ExecutionRole,
    pub(crate) alias: Option<AliasConfiguration>,
    pub(crate) reason: String,
}
