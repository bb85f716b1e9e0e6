// ABOUTME: Integration tests for ExecutablePackager.
// ABOUTME: Checks archive layout, naming, bootstrap entry, and failure modes on a temp directory.

mod support;

use lamina::build::BuildProduct;
use lamina::package::{ExecutablePackager, PackageError};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use support::product;

fn built(dir: &Path, name: &str) -> BuildProduct {
    let binary_path = dir.join(name);
    fs::write(&binary_path, format!("binary of {name}")).unwrap();
    BuildProduct {
        name: product(name),
        binary_path,
        libraries: Vec::new(),
        unresolved_libraries: Vec::new(),
    }
}

fn with_libraries(mut product: BuildProduct, libraries: Vec<PathBuf>) -> BuildProduct {
    product.libraries = libraries;
    product
}

fn entry_names(archive: &Path) -> Vec<String> {
    let mut zip = zip::ZipArchive::new(fs::File::open(archive).unwrap()).unwrap();
    let mut names: Vec<String> = (0..zip.len())
        .map(|i| zip.by_index(i).unwrap().name().to_string())
        .collect();
    names.sort();
    names
}

#[test]
fn archive_is_named_after_the_product() {
    support::init_tracing();
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();

    let packager = ExecutablePackager::new(out.path());
    let archive = packager.package(&built(src.path(), "orders")).unwrap();

    assert_eq!(archive.path(), out.path().join("orders.zip"));
    assert_eq!(archive.executable_name().as_str(), "orders");
    assert_eq!(entry_names(archive.path()), vec!["bootstrap", "orders"]);
}

#[test]
fn executable_keeps_its_contents() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();

    let packager = ExecutablePackager::new(out.path());
    let archive = packager.package(&built(src.path(), "orders")).unwrap();

    let mut zip = zip::ZipArchive::new(fs::File::open(archive.path()).unwrap()).unwrap();
    let mut contents = String::new();
    zip.by_name("orders")
        .unwrap()
        .read_to_string(&mut contents)
        .unwrap();
    assert_eq!(contents, "binary of orders");
}

#[cfg(unix)]
#[test]
fn bootstrap_is_a_symlink_to_the_executable() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();

    let packager = ExecutablePackager::new(out.path());
    let archive = packager.package(&built(src.path(), "orders")).unwrap();

    let mut zip = zip::ZipArchive::new(fs::File::open(archive.path()).unwrap()).unwrap();
    let mut bootstrap = zip.by_name("bootstrap").unwrap();
    let mode = bootstrap.unix_mode().unwrap();
    assert_eq!(mode & 0o170000, 0o120000, "bootstrap should be a symlink entry");

    let mut target = String::new();
    bootstrap.read_to_string(&mut target).unwrap();
    assert_eq!(target, "orders");
}

#[cfg(unix)]
#[test]
fn staged_executable_is_executable() {
    use std::os::unix::fs::PermissionsExt;

    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();

    let packager = ExecutablePackager::new(out.path());
    packager.package(&built(src.path(), "orders")).unwrap();

    let staged = packager.staging_dir(&product("orders")).join("orders");
    let mode = fs::metadata(staged).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o755);
}

#[test]
fn shared_libraries_are_bundled() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let lib = src.path().join("libpq.so.5");
    fs::write(&lib, "library").unwrap();

    let packager = ExecutablePackager::new(out.path());
    let product = with_libraries(built(src.path(), "orders"), vec![lib]);
    let archive = packager.package(&product).unwrap();

    assert_eq!(
        entry_names(archive.path()),
        vec!["bootstrap", "libpq.so.5", "orders"]
    );
}

#[test]
fn repackaging_replaces_stale_staging_contents() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let packager = ExecutablePackager::new(out.path());

    let staging = packager.staging_dir(&product("orders"));
    fs::create_dir_all(&staging).unwrap();
    fs::write(staging.join("leftover.txt"), "stale").unwrap();

    let archive = packager.package(&built(src.path(), "orders")).unwrap();
    assert_eq!(entry_names(archive.path()), vec!["bootstrap", "orders"]);
}

#[test]
fn missing_binary_writes_nothing() {
    let out = tempfile::tempdir().unwrap();
    let packager = ExecutablePackager::new(out.path());

    let product = BuildProduct {
        name: product("orders"),
        binary_path: out.path().join("does-not-exist"),
        libraries: Vec::new(),
        unresolved_libraries: Vec::new(),
    };

    let err = packager.package(&product).unwrap_err();
    assert!(matches!(err, PackageError::ProductNotFound(_)));
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn missing_library_is_a_dependency_failure() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();

    let packager = ExecutablePackager::new(out.path());
    let product = with_libraries(
        built(src.path(), "orders"),
        vec![src.path().join("libgone.so.1")],
    );
    let err = packager.package(&product).unwrap_err();

    match err {
        PackageError::DependencyFailure { dependencies, .. } => {
            assert_eq!(dependencies.len(), 1);
        }
        other => panic!("expected DependencyFailure, got {other:?}"),
    }
    assert!(!out.path().join("orders.zip").exists());
}

#[test]
fn unresolved_library_is_a_dependency_failure() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();

    let packager = ExecutablePackager::new(out.path());
    let mut product = built(src.path(), "orders");
    product.unresolved_libraries = vec!["libssl.so.3".to_string()];
    let err = packager.package(&product).unwrap_err();

    assert!(matches!(err, PackageError::DependencyFailure { .. }));
    assert!(err.to_string().contains("libssl.so.3"));
    assert!(!out.path().join("orders.zip").exists());
}

#[tokio::test]
async fn packaging_off_the_async_workers_gives_the_same_archive() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();

    let packager = ExecutablePackager::new(out.path());
    let archive = packager
        .package_on_blocking_pool(built(src.path(), "orders"))
        .await
        .unwrap();

    assert_eq!(archive.path(), out.path().join("orders.zip"));
    assert_eq!(entry_names(archive.path()), vec!["bootstrap", "orders"]);
}
