// ABOUTME: Archive naming rule shared by the packager and the publisher.
// ABOUTME: An archive for executable `name` must be a file called exactly `name.zip`.

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::ProductName;

/// File extension of deployable archives.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Name of the entry point a custom-runtime function package must contain.
pub const BOOTSTRAP_ENTRY: &str = "bootstrap";

#[derive(Debug, Clone, Error)]
pub enum ArchiveNameError {
    #[error("invalid archive name {}: expected a file named {expected}", .path.display())]
    InvalidArchiveName { path: PathBuf, expected: String },
}

/// Derive the archive file name for an executable.
pub fn derive_archive_name(executable: &ProductName) -> String {
    format!("{}.{}", executable, ARCHIVE_EXTENSION)
}

/// Check that `path` is named after `executable` and return the typed archive.
///
/// Only the file name is inspected; existence is the caller's concern.
pub fn validate_archive_name(
    path: &Path,
    executable: &ProductName,
) -> Result<Archive, ArchiveNameError> {
    let expected = derive_archive_name(executable);

    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) if name == expected => Ok(Archive {
            path: path.to_path_buf(),
            executable_name: executable.clone(),
        }),
        _ => Err(ArchiveNameError::InvalidArchiveName {
            path: path.to_path_buf(),
            expected,
        }),
    }
}

/// A deployable zip archive. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    path: PathBuf,
    executable_name: ProductName,
}

impl Archive {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn executable_name(&self) -> &ProductName {
        &self.executable_name
    }
}

impl fmt::Display for Archive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str) -> ProductName {
        ProductName::new(name).unwrap()
    }

    #[test]
    fn derives_zip_name() {
        assert_eq!(derive_archive_name(&product("myapp")), "myapp.zip");
    }

    #[test]
    fn accepts_matching_name_in_any_directory() {
        let archive =
            validate_archive_name(Path::new("/tmp/out/myapp.zip"), &product("myapp")).unwrap();
        assert_eq!(archive.path(), Path::new("/tmp/out/myapp.zip"));
        assert_eq!(archive.executable_name().as_str(), "myapp");
    }

    #[test]
    fn rejects_other_executable() {
        let err = validate_archive_name(Path::new("app.zip"), &product("myapp")).unwrap_err();
        assert!(err.to_string().contains("myapp.zip"));
    }

    #[test]
    fn rejects_wrong_extension_and_case() {
        assert!(validate_archive_name(Path::new("myapp.tar.gz"), &product("myapp")).is_err());
        assert!(validate_archive_name(Path::new("MyApp.zip"), &product("myapp")).is_err());
        assert!(validate_archive_name(Path::new("myapp.zip.bak"), &product("myapp")).is_err());
    }
}
