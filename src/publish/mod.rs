// ABOUTME: Blue-green publishing using the type state pattern.
// ABOUTME: Exports state types, the Deployment struct, role resolution, and reports.

mod deployment;
mod error;
mod report;
mod role;
mod state;
mod transitions;

pub use deployment::{DeployTarget, Deployment};
pub use error::PublishError;
pub use report::{DeploymentReport, Outcome, deployed_by};
pub use role::{
    BASIC_EXECUTION_POLICY_ARN, LAMBDA_TRUST_POLICY, RoleLocks, RoleResolver, role_arn,
    synthesize_role_name,
};
pub use state::{AliasResolved, CutOver, RoleResolved, RolledBack, Uploaded, Validated, Verified};
pub use transitions::{TransitionResult, publish_and_verify};
