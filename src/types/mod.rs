// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Uses phantom types to prevent ID confusion at compile time.

mod archive;
mod function_name;
mod id;
mod product_name;

pub use archive::{
    ARCHIVE_EXTENSION, Archive, ArchiveNameError, BOOTSTRAP_ENTRY, derive_archive_name,
    validate_archive_name,
};
pub use function_name::{
    AliasName, AliasNameError, DEFAULT_ALIAS, FunctionName, FunctionNameError,
};
pub use id::{AccountId, ContainerId, FunctionVersion, Id, UNPUBLISHED_VERSION};
pub use product_name::{ProductName, ProductNameError};
