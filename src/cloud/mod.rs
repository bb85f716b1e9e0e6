// ABOUTME: Cloud function service access for publishing and verification.
// ABOUTME: Capability traits plus the AWS SDK backed implementation.

mod aws;
pub mod traits;

pub use aws::AwsCloud;
pub use traits::*;
