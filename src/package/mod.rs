// ABOUTME: Packaging of built executables into custom-runtime function archives.
// ABOUTME: Stages bootstrap and shared libraries, then zips the result.

mod error;
mod packager;

pub use error::PackageError;
pub use packager::ExecutablePackager;
