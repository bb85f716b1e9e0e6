// ABOUTME: Summary of a finished deployment for humans and machine output.
// ABOUTME: Built from the terminal states; stamped with host and completion time.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use super::Deployment;
use super::state::{CutOver, RolledBack};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    CutOver,
    RolledBack,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::CutOver => write!(f, "cut over"),
            Outcome::RolledBack => write!(f, "rolled back"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeploymentReport {
    pub function: String,
    pub alias: String,
    pub outcome: Outcome,
    /// Version the alias routed to before this deployment.
    pub previous_version: Option<String>,
    pub new_version: String,
    pub code_sha256: String,
    pub role: String,
    pub reason: Option<String>,
    pub deployed_by: String,
    pub finished_at: DateTime<Utc>,
}

impl DeploymentReport {
    pub fn is_cut_over(&self) -> bool {
        self.outcome == Outcome::CutOver
    }
}

/// Hostname of the deploying machine.
pub fn deployed_by() -> String {
    gethostname::gethostname().to_string_lossy().into_owned()
}

impl Deployment<CutOver> {
    pub fn report(&self) -> DeploymentReport {
        DeploymentReport {
            function: self.target.function.to_string(),
            alias: self.target.alias.to_string(),
            outcome: Outcome::CutOver,
            previous_version: self.previous_version.as_ref().map(|v| v.to_string()),
            new_version: self.state.configuration.version.to_string(),
            code_sha256: self.state.configuration.code_sha256.clone(),
            role: self.state.role.arn.clone(),
            reason: None,
            deployed_by: deployed_by(),
            finished_at: Utc::now(),
        }
    }

    /// Version the alias now routes to.
    pub fn live_version(&self) -> &crate::types::FunctionVersion {
        &self.state.alias.function_version
    }

    /// Response of the verification invocation.
    pub fn invocation(&self) -> &crate::invoke::InvocationResult {
        &self.state.invocation
    }
}

impl Deployment<RolledBack> {
    pub fn report(&self) -> DeploymentReport {
        let previous = self
            .state
            .alias
            .as_ref()
            .map(|a| &a.function_version)
            .or(self.previous_version.as_ref());

        DeploymentReport {
            function: self.target.function.to_string(),
            alias: self.target.alias.to_string(),
            outcome: Outcome::RolledBack,
            previous_version: previous.map(|v| v.to_string()),
            new_version: self.state.configuration.version.to_string(),
            code_sha256: self.state.configuration.code_sha256.clone(),
            role: self.state.role.arn.clone(),
            reason: Some(self.state.reason.clone()),
            deployed_by: deployed_by(),
            finished_at: Utc::now(),
        }
    }
}
