// ABOUTME: Composable capability traits for the cloud function service.
// ABOUTME: Defines FunctionOps, AliasOps, InvokeOps, IdentityOps, RoleOps and CloudOps.

mod alias;
mod error;
mod function;
mod identity;
mod invoke;
mod role;
pub(crate) mod sealed;
mod shared_types;

pub use alias::AliasOps;
pub use error::CloudError;
pub use function::FunctionOps;
pub use identity::IdentityOps;
pub use invoke::InvokeOps;
pub use role::RoleOps;
pub use shared_types::*;

/// Every capability a deployment needs. Implemented automatically.
pub trait CloudOps: FunctionOps + AliasOps + InvokeOps + IdentityOps + RoleOps {}

impl<T> CloudOps for T where T: FunctionOps + AliasOps + InvokeOps + IdentityOps + RoleOps {}
