// ABOUTME: ExecutablePackager stages a built binary with its bootstrap entry and libraries.
// ABOUTME: The staging directory is zipped into `<output_dir>/<product>.zip`.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::error::PackageError;
use crate::build::BuildProduct;
use crate::types::{Archive, BOOTSTRAP_ENTRY, ProductName, derive_archive_name, validate_archive_name};

const EXECUTABLE_MODE: u32 = 0o755;

/// Packages build products into deployable archives under one output directory.
pub struct ExecutablePackager {
    output_dir: PathBuf,
}

impl ExecutablePackager {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Staging directory used for `product`.
    pub fn staging_dir(&self, product: &ProductName) -> PathBuf {
        self.output_dir.join(product.as_str())
    }

    /// [`package`](Self::package) on tokio's blocking pool, off the async workers.
    pub async fn package_on_blocking_pool(
        &self,
        product: BuildProduct,
    ) -> Result<Archive, PackageError> {
        let packager = Self::new(self.output_dir.clone());
        tokio::task::spawn_blocking(move || packager.package(&product))
            .await
            .map_err(|e| PackageError::ArchivingFailure(format!("packaging task failed: {}", e)))?
    }

    /// Package a build product. Writes nothing if the binary is missing.
    pub fn package(&self, product: &BuildProduct) -> Result<Archive, PackageError> {
        if !product.binary_path.is_file() {
            return Err(PackageError::ProductNotFound(product.binary_path.clone()));
        }

        let staging = self.staging_dir(&product.name);
        stage_executable(&staging, &product.binary_path, &product.name)
            .map_err(PackageError::BootstrapFailure)?;

        if !product.unresolved_libraries.is_empty() {
            return Err(PackageError::DependencyFailure {
                dependencies: product.libraries.clone(),
                message: format!(
                    "unresolved libraries: {}",
                    product.unresolved_libraries.join(", ")
                ),
            });
        }
        copy_dependencies(&staging, &product.libraries)?;

        let archive_path = self.output_dir.join(derive_archive_name(&product.name));
        write_archive(&staging, &archive_path)
            .map_err(|e| PackageError::ArchivingFailure(e.to_string()))?;

        if !archive_path.is_file() {
            return Err(PackageError::ArchiveNotFound(archive_path));
        }

        tracing::info!(
            product = %product.name,
            archive = %archive_path.display(),
            libraries = product.libraries.len(),
            "packaged"
        );

        Ok(validate_archive_name(&archive_path, &product.name)?)
    }
}

/// Recreate the staging directory with the binary and its bootstrap entry.
fn stage_executable(staging: &Path, binary: &Path, name: &ProductName) -> Result<(), Vec<String>> {
    let step = |what: &str, e: io::Error| vec![format!("{}: {}", what, e)];

    if staging.exists() {
        fs::remove_dir_all(staging)
            .map_err(|e| step(&format!("remove {}", staging.display()), e))?;
    }
    fs::create_dir_all(staging).map_err(|e| step(&format!("create {}", staging.display()), e))?;

    let executable = staging.join(name.as_str());
    fs::copy(binary, &executable).map_err(|e| step(&format!("copy {}", binary.display()), e))?;
    set_executable(&executable).map_err(|e| step("set permissions", e))?;

    link_bootstrap(staging, name).map_err(|e| step("link bootstrap", e))
}

#[cfg(unix)]
fn set_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(EXECUTABLE_MODE))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn link_bootstrap(staging: &Path, name: &ProductName) -> io::Result<()> {
    std::os::unix::fs::symlink(name.as_str(), staging.join(BOOTSTRAP_ENTRY))
}

#[cfg(not(unix))]
fn link_bootstrap(staging: &Path, name: &ProductName) -> io::Result<()> {
    fs::copy(staging.join(name.as_str()), staging.join(BOOTSTRAP_ENTRY)).map(|_| ())
}

fn copy_dependencies(staging: &Path, dependencies: &[PathBuf]) -> Result<(), PackageError> {
    for library in dependencies {
        let failure = |message: String| PackageError::DependencyFailure {
            dependencies: dependencies.to_vec(),
            message,
        };

        let file_name = library
            .file_name()
            .ok_or_else(|| failure(format!("invalid library path {}", library.display())))?;

        fs::copy(library, staging.join(file_name))
            .map_err(|e| failure(format!("copy {}: {}", library.display(), e)))?;
    }

    Ok(())
}

/// Zip the staging directory. Symlinks are stored as symlink entries.
fn write_archive(staging: &Path, archive_path: &Path) -> zip::result::ZipResult<()> {
    let mut entries = fs::read_dir(staging)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<Vec<_>>>()?;
    entries.sort();

    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(EXECUTABLE_MODE);

    let mut zip = ZipWriter::new(File::create(archive_path)?);

    for path in entries {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        let metadata = fs::symlink_metadata(&path)?;
        if metadata.file_type().is_symlink() {
            let target = fs::read_link(&path)?;
            zip.add_symlink(name, target.to_string_lossy(), options)?;
        } else if metadata.is_file() {
            zip.start_file(name, options)?;
            io::copy(&mut File::open(&path)?, &mut zip)?;
        }
    }

    zip.finish()?;
    Ok(())
}
