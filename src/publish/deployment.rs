// ABOUTME: Generic deployment struct parameterized by publisher state.
// ABOUTME: Holds the target function, the archive, and the version traffic was on before.

use std::collections::HashMap;
use std::time::Duration;

use crate::cloud::{Architecture, ExecutionRole, FunctionConfiguration};
use crate::types::{AliasName, Archive, FunctionName, FunctionVersion};

use super::state::{AliasResolved, CutOver, RoleResolved, RolledBack, Uploaded, Verified};

/// The function a deployment rolls out to and how it is created if absent.
#[derive(Debug, Clone)]
pub struct DeployTarget {
    pub function: FunctionName,
    pub alias: AliasName,
    /// Explicit execution role; synthesized when `None`.
    pub role_arn: Option<String>,
    pub architecture: Architecture,
    pub memory_mb: u32,
    pub timeout: Duration,
    pub environment: HashMap<String, String>,
    pub description: String,
}

/// A deployment in progress, parameterized by its current state.
///
/// Transitions consume the deployment, so a stale state cannot be reused
/// after the remote side has moved on.
#[derive(Debug)]
pub struct Deployment<S> {
    pub(crate) target: DeployTarget,
    pub(crate) archive: Archive,
    pub(crate) previous_version: Option<FunctionVersion>,
    pub(crate) state: S,
}

impl<S> Deployment<S> {
    pub fn target(&self) -> &DeployTarget {
        &self.target
    }

    pub fn function_name(&self) -> &FunctionName {
        &self.target.function
    }

    pub fn alias_name(&self) -> &AliasName {
        &self.target.alias
    }

    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    /// Highest published version before this upload (None on first deploy).
    pub fn previous_version(&self) -> Option<&FunctionVersion> {
        self.previous_version.as_ref()
    }

    /// Move to the next state, keeping the shared fields.
    pub(crate) fn transition<T>(self, state: T) -> Deployment<T> {
        Deployment {
            target: self.target,
            archive: self.archive,
            previous_version: self.previous_version,
            state,
        }
    }
}

// State-specific accessors for the published version
macro_rules! published_accessors {
    ($($state:ty),*) => {
        $(
            impl Deployment<$state> {
                /// Configuration of the newly published version.
                pub fn configuration(&self) -> &FunctionConfiguration {
                    &self.state.configuration
                }

                /// The newly published version.
                pub fn new_version(&self) -> &FunctionVersion {
                    &self.state.configuration.version
                }
            }
        )*
    };
}

published_accessors!(Uploaded, RoleResolved, AliasResolved, Verified, CutOver, RolledBack);

macro_rules! role_accessor {
    ($($state:ty),*) => {
        $(
            impl Deployment<$state> {
                pub fn role(&self) -> &ExecutionRole {
                    &self.state.role
                }
            }
        )*
    };
}

role_accessor!(RoleResolved, AliasResolved, Verified, CutOver, RolledBack);

impl Deployment<AliasResolved> {
    /// Version the alias currently routes to, if the alias exists.
    pub fn live_version(&self) -> Option<&FunctionVersion> {
        self.state.alias.as_ref().map(|a| &a.function_version)
    }
}

impl Deployment<RolledBack> {
    pub fn reason(&self) -> &str {
        &self.state.reason
    }

    /// Version the alias still routes to, if the alias exists.
    pub fn live_version(&self) -> Option<&FunctionVersion> {
        self.state.alias.as_ref().map(|a| &a.function_version)
    }
}
