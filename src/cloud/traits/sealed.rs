// ABOUTME: Sealed trait pattern for cloud capability traits.
// ABOUTME: Prevents external implementations, allowing non-breaking evolution.

/// Sealed trait to prevent external implementations.
///
/// Only types that implement Sealed (the AWS client and the in-memory fakes)
/// can implement the cloud traits.
pub trait Sealed {}
