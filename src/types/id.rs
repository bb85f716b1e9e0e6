// ABOUTME: Identifiers handed out by the build runtime and the cloud service.
// ABOUTME: Build containers, published function versions, and caller accounts never mix.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

pub enum ContainerMarker {}
pub enum VersionMarker {}
pub enum AccountMarker {}

/// An opaque identifier tagged with what it identifies.
///
/// A `FunctionVersion` cannot be passed where an `AccountId` is expected,
/// even though both are strings on the wire.
#[must_use = "IDs reference resources and should not be ignored"]
pub struct Id<T> {
    value: String,
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_inner(self) -> String {
        self.value
    }
}

impl<T> std::fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Id").field(&self.value).finish()
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> std::fmt::Display for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

/// Build container created by the Docker daemon.
pub type ContainerId = Id<ContainerMarker>;

/// Published function version. Numbered versions are immutable; `$LATEST` is not.
pub type FunctionVersion = Id<VersionMarker>;

/// Twelve-digit account the deploying credentials belong to.
pub type AccountId = Id<AccountMarker>;

/// Qualifier of the mutable, unpublished function code.
pub const UNPUBLISHED_VERSION: &str = "$LATEST";

impl ContainerId {
    /// Abbreviated form the Docker CLI prints.
    pub fn short(&self) -> &str {
        let end = self
            .value
            .char_indices()
            .nth(12)
            .map_or(self.value.len(), |(i, _)| i);
        &self.value[..end]
    }
}

impl FunctionVersion {
    /// Numeric value of a published version. `$LATEST` and malformed
    /// versions have none.
    pub fn number(&self) -> Option<u64> {
        self.value.parse().ok()
    }

    /// Whether this names an immutable published version that an alias may route to.
    pub fn is_published(&self) -> bool {
        self.number().is_some()
    }
}

impl AccountId {
    /// Account ids are exactly twelve ASCII digits.
    pub fn is_well_formed(&self) -> bool {
        self.value.len() == 12 && self.value.bytes().all(|b| b.is_ascii_digit())
    }
}
