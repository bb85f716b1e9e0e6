// ABOUTME: Runs one product build inside an isolated container and retrieves the binary.
// ABOUTME: BollardBuildRunner drives the local Docker daemon through bollard.

use async_trait::async_trait;
use bollard::Docker;
use bollard::exec::StartExecOptions;
use bollard::models::{ContainerCreateBody, HostConfig, Mount, MountTypeEnum};
use bollard::query_parameters::{
    BuildImageOptions, CreateContainerOptions, CreateImageOptions, DownloadFromContainerOptions,
    RemoveContainerOptions,
};
use bytes::Bytes;
use futures::StreamExt;
use http_body_util::{Either, Full};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use super::error::BuildError;
use super::libraries;
use crate::cloud::traits::sealed::Sealed;
use crate::types::{ContainerId, ProductName};

/// Where the project is mounted inside the build container.
///
/// The mount is read-only, so the build runs with `--locked`: a missing or
/// stale `Cargo.lock` fails with cargo's own message.
const WORKSPACE_DIR: &str = "/workspace";

/// Cargo target directory inside the container.
const TARGET_DIR: &str = "/build/target";

/// Keeps the container alive between execs.
const IDLE_ENTRYPOINT: [&str; 3] = ["tail", "-f", "/dev/null"];

static CONTAINER_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Everything a runner needs for one build.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub project_dir: PathBuf,
    pub product: ProductName,
    /// Image used when no dockerfile is given.
    pub image: String,
    pub dockerfile: Option<PathBuf>,
    /// Host directory the binary and its libraries are written to.
    pub artifact_dir: PathBuf,
}

impl BuildRequest {
    /// Host path the binary is written to.
    pub fn binary_destination(&self) -> PathBuf {
        self.artifact_dir.join(self.product.as_str())
    }

    /// Host directory the binary's shared libraries are written to, one file per soname.
    pub fn library_destination(&self) -> PathBuf {
        self.artifact_dir.join(format!("{}.libs", self.product))
    }
}

/// What the container produced.
#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    pub exit_code: i64,
    pub log: String,
    /// Host path of the retrieved binary, if any was retrieved.
    pub artifact: Option<PathBuf>,
    /// Host copies of the shared libraries the binary loads.
    pub libraries: Vec<PathBuf>,
    /// Sonames the loader could not find in the build image.
    pub unresolved_libraries: Vec<String>,
}

#[async_trait]
pub trait BuildRunner: Sealed + Send + Sync {
    async fn run_build(&self, request: &BuildRequest) -> Result<BuildOutput, BuildError>;
}

/// The command compiling one product inside the container.
pub fn cargo_build_command(product: &ProductName) -> Vec<String> {
    ["cargo", "build", "--release", "--locked", "--bin", product.as_str()]
        .into_iter()
        .map(str::to_string)
        .collect()
}

// =============================================================================
// Container cleanup
// =============================================================================

/// Removes a build container when dropped before it was disarmed.
///
/// A cancelled build is dropped at whatever await point it reached, so the
/// normal removal path never runs.
pub(crate) struct ContainerGuard {
    id: ContainerId,
    cleanup: Option<Box<dyn FnOnce(ContainerId) + Send>>,
}

impl ContainerGuard {
    pub(crate) fn new(id: ContainerId, cleanup: impl FnOnce(ContainerId) + Send + 'static) -> Self {
        Self {
            id,
            cleanup: Some(Box::new(cleanup)),
        }
    }

    pub(crate) fn id(&self) -> &ContainerId {
        &self.id
    }

    /// Take responsibility for removal back from the guard.
    pub(crate) fn disarm(mut self) -> ContainerId {
        self.cleanup = None;
        self.id.clone()
    }
}

impl Drop for ContainerGuard {
    fn drop(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup(self.id.clone());
        }
    }
}

// =============================================================================
// Error Mapping Helpers
// =============================================================================

fn map_image_error(e: bollard::errors::Error, image: &str) -> BuildError {
    BuildError::Container(format!("failed to prepare image {}: {}", image, e))
}

fn map_container_error(e: bollard::errors::Error, action: &str) -> BuildError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => {
            BuildError::Container(format!("failed to {}: not found: {}", action, message))
        }
        _ => BuildError::Container(format!("failed to {}: {}", action, e)),
    }
}

fn map_io_error(e: std::io::Error, action: &str) -> BuildError {
    BuildError::Container(format!("failed to {}: {}", action, e))
}

// =============================================================================
// BollardBuildRunner
// =============================================================================

/// Output of one command run inside the build container.
struct ExecOutput {
    exit_code: i64,
    stdout: String,
    stderr: String,
}

/// Build runner backed by the local Docker daemon.
pub struct BollardBuildRunner {
    client: Docker,
}

impl BollardBuildRunner {
    pub fn new(client: Docker) -> Self {
        Self { client }
    }

    /// Connect using the platform's default socket and `DOCKER_HOST`.
    pub fn connect() -> Result<Self, BuildError> {
        let client = Docker::connect_with_local_defaults()
            .map_err(|e| BuildError::Container(format!("failed to connect to docker: {}", e)))?;
        Ok(Self::new(client))
    }

    /// Make sure the build image exists, returning its reference.
    async fn prepare_image(&self, request: &BuildRequest) -> Result<String, BuildError> {
        match request.dockerfile {
            Some(ref dockerfile) => self.build_image(dockerfile).await,
            None => {
                self.pull_if_missing(&request.image).await?;
                Ok(request.image.clone())
            }
        }
    }

    async fn pull_if_missing(&self, image: &str) -> Result<(), BuildError> {
        match self.client.inspect_image(image).await {
            Ok(_) => return Ok(()),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => {}
            Err(e) => return Err(map_image_error(e, image)),
        }

        tracing::info!(image, "pulling build image");

        let opts = CreateImageOptions {
            from_image: Some(image.to_string()),
            ..Default::default()
        };

        let mut stream = self.client.create_image(Some(opts), None, None);
        while let Some(result) = stream.next().await {
            result.map_err(|e| map_image_error(e, image))?;
        }

        Ok(())
    }

    /// Build an image from a dockerfile, tagged by a hash of its contents.
    async fn build_image(&self, dockerfile: &Path) -> Result<String, BuildError> {
        let contents = tokio::fs::read(dockerfile)
            .await
            .map_err(|_| BuildError::InvalidDockerfilePath(dockerfile.to_path_buf()))?;

        let mut hasher = DefaultHasher::new();
        contents.hash(&mut hasher);
        let tag = format!("lamina-builder:{:016x}", hasher.finish());

        if self.client.inspect_image(&tag).await.is_ok() {
            tracing::debug!(tag, "build image already present");
            return Ok(tag);
        }

        tracing::info!(dockerfile = %dockerfile.display(), tag, "building build image");

        let context = build_context(&contents)
            .map_err(|e| BuildError::Container(format!("failed to create build context: {}", e)))?;

        let options = BuildImageOptions {
            dockerfile: "Dockerfile".to_string(),
            t: Some(tag.clone()),
            ..Default::default()
        };

        let body = Either::Left(Full::new(Bytes::from(context)));
        let mut stream = self.client.build_image(options, None, Some(body));

        while let Some(result) = stream.next().await {
            let info = result.map_err(|e| map_image_error(e, &tag))?;
            if let Some(detail) = info.error_detail {
                return Err(BuildError::Container(format!(
                    "image build failed: {}",
                    detail.message.unwrap_or_default()
                )));
            }
        }

        Ok(tag)
    }

    /// Create and start an idle container with the project mounted.
    async fn start_build_container(
        &self,
        image: &str,
        request: &BuildRequest,
    ) -> Result<ContainerGuard, BuildError> {
        let source = request
            .project_dir
            .canonicalize()
            .map_err(|e| BuildError::Container(format!("invalid project directory: {}", e)))?;

        let host_config = HostConfig {
            mounts: Some(vec![Mount {
                source: Some(source.to_string_lossy().into_owned()),
                target: Some(WORKSPACE_DIR.to_string()),
                typ: Some(MountTypeEnum::BIND),
                read_only: Some(true),
                ..Default::default()
            }]),
            ..Default::default()
        };

        let config = ContainerCreateBody {
            image: Some(image.to_string()),
            entrypoint: Some(IDLE_ENTRYPOINT.iter().map(|s| s.to_string()).collect()),
            env: Some(vec![format!("CARGO_TARGET_DIR={}", TARGET_DIR)]),
            working_dir: Some(WORKSPACE_DIR.to_string()),
            host_config: Some(host_config),
            ..Default::default()
        };

        let opts = CreateContainerOptions {
            name: Some(format!(
                "lamina-build-{}-{}-{}",
                request.product,
                std::process::id(),
                CONTAINER_SEQUENCE.fetch_add(1, Ordering::Relaxed)
            )),
            ..Default::default()
        };

        let response = self
            .client
            .create_container(Some(opts), config)
            .await
            .map_err(|e| map_container_error(e, "create build container"))?;

        let guard = self.guard(ContainerId::new(response.id));

        self.client
            .start_container(
                guard.id().as_str(),
                None::<bollard::query_parameters::StartContainerOptions>,
            )
            .await
            .map_err(|e| map_container_error(e, "start build container"))?;

        Ok(guard)
    }

    /// Guard that force-removes the container from a background task.
    fn guard(&self, id: ContainerId) -> ContainerGuard {
        let client = self.client.clone();
        ContainerGuard::new(id, move |id| match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::debug!(container = %id.short(), "removing abandoned build container");
                handle.spawn(async move { remove_container(&client, &id).await });
            }
            Err(_) => {
                tracing::warn!(container = %id.short(), "no runtime left to remove build container")
            }
        })
    }

    /// Run one command in the container, capturing its output and exit code.
    async fn exec(&self, id: &ContainerId, cmd: Vec<String>) -> Result<ExecOutput, BuildError> {
        let opts = bollard::models::ExecConfig {
            cmd: Some(cmd),
            working_dir: Some(WORKSPACE_DIR.to_string()),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            ..Default::default()
        };

        let exec_id = self
            .client
            .create_exec(id.as_str(), opts)
            .await
            .map_err(|e| map_container_error(e, "create exec"))?
            .id;

        let result = self
            .client
            .start_exec(
                &exec_id,
                Some(StartExecOptions {
                    detach: false,
                    ..Default::default()
                }),
            )
            .await
            .map_err(|e| map_container_error(e, "start exec"))?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        if let bollard::exec::StartExecResults::Attached { mut output, .. } = result {
            while let Some(item) = output.next().await {
                match item {
                    Ok(bollard::container::LogOutput::StdOut { message }) => {
                        stdout.extend(message);
                    }
                    Ok(bollard::container::LogOutput::StdErr { message }) => {
                        stderr.extend(message);
                    }
                    Ok(_) => {}
                    Err(e) => return Err(map_container_error(e, "read exec output")),
                }
            }
        }

        let details = self
            .client
            .inspect_exec(&exec_id)
            .await
            .map_err(|e| map_container_error(e, "inspect exec"))?;

        Ok(ExecOutput {
            exit_code: details.exit_code.unwrap_or(-1),
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }

    /// Copy one file out of the container. `None` when it does not exist.
    async fn download_file(
        &self,
        id: &ContainerId,
        container_path: &str,
        destination: &Path,
    ) -> Result<Option<PathBuf>, BuildError> {
        let opts = DownloadFromContainerOptions {
            path: container_path.to_string(),
        };

        let mut archive = Vec::new();
        let mut stream = self
            .client
            .download_from_container(id.as_str(), Some(opts));
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(bytes) => archive.extend_from_slice(&bytes),
                Err(bollard::errors::Error::DockerResponseServerError {
                    status_code: 404, ..
                }) => return Ok(None),
                Err(e) => return Err(map_container_error(e, "download from build container")),
            }
        }

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| map_io_error(e, "create artifact dir"))?;
        }

        unpack_single_file(&archive, destination)
            .map_err(|e| map_io_error(e, "unpack build artifact"))
    }

    /// Find the binary's shared libraries with the image's own loader and copy them out.
    async fn collect_libraries(
        &self,
        id: &ContainerId,
        request: &BuildRequest,
        binary: &str,
    ) -> Result<(Vec<PathBuf>, Vec<String>), BuildError> {
        let ldd = self
            .exec(id, vec!["ldd".to_string(), binary.to_string()])
            .await?;
        let linked = libraries::from_ldd(ldd.exit_code, &ldd.stdout, &ldd.stderr)
            .map_err(|message| {
                BuildError::Container(format!("failed to list shared libraries: {}", message))
            })?;

        let destination = request.library_destination();
        match tokio::fs::remove_dir_all(&destination).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(map_io_error(e, "clear stale libraries")),
        }

        if linked.paths.is_empty() {
            return Ok((Vec::new(), linked.missing));
        }

        // Download the files behind the sonames, not the symlinks.
        let mut cmd = vec!["readlink".to_string(), "-f".to_string()];
        cmd.extend(linked.paths.iter().cloned());
        let resolved = self.exec(id, cmd).await?;
        if resolved.exit_code != 0 {
            return Err(BuildError::Container(format!(
                "failed to resolve library paths: {}",
                resolved.stderr.trim()
            )));
        }

        let mut copied = Vec::new();
        let mut missing = linked.missing;

        for (soname_path, real_path) in linked.paths.iter().zip(resolved.stdout.lines()) {
            let soname = soname_path.rsplit('/').next().unwrap_or(soname_path);
            match self
                .download_file(id, real_path.trim(), &destination.join(soname))
                .await?
            {
                Some(path) => copied.push(path),
                None => missing.push(soname.to_string()),
            }
        }

        tracing::debug!(
            product = %request.product,
            libraries = copied.len(),
            "collected shared libraries"
        );

        Ok((copied, missing))
    }

    async fn build_in(
        &self,
        id: &ContainerId,
        request: &BuildRequest,
    ) -> Result<BuildOutput, BuildError> {
        let build = self
            .exec(id, cargo_build_command(&request.product))
            .await?;
        let log = format!("{}{}", build.stdout, build.stderr);

        if build.exit_code != 0 {
            return Ok(BuildOutput {
                exit_code: build.exit_code,
                log,
                ..Default::default()
            });
        }

        let binary = format!("{}/release/{}", TARGET_DIR, request.product);
        let Some(artifact) = self
            .download_file(id, &binary, &request.binary_destination())
            .await?
        else {
            return Ok(BuildOutput {
                exit_code: 0,
                log,
                ..Default::default()
            });
        };

        let (libraries, unresolved_libraries) =
            self.collect_libraries(id, request, &binary).await?;

        Ok(BuildOutput {
            exit_code: 0,
            log,
            artifact: Some(artifact),
            libraries,
            unresolved_libraries,
        })
    }
}

async fn remove_container(client: &Docker, id: &ContainerId) {
    let opts = RemoveContainerOptions {
        force: true,
        ..Default::default()
    };

    if let Err(e) = client.remove_container(id.as_str(), Some(opts)).await {
        tracing::warn!(container = %id.short(), "failed to remove build container: {}", e);
    }
}

impl Sealed for BollardBuildRunner {}

#[async_trait]
impl BuildRunner for BollardBuildRunner {
    async fn run_build(&self, request: &BuildRequest) -> Result<BuildOutput, BuildError> {
        let image = self.prepare_image(request).await?;
        let guard = self.start_build_container(&image, request).await?;

        tracing::debug!(
            container = %guard.id().short(),
            product = %request.product,
            "build container started"
        );

        let result = self.build_in(guard.id(), request).await;

        let id = guard.disarm();
        remove_container(&self.client, &id).await;
        result
    }
}

/// Tar build context containing only the dockerfile.
fn build_context(dockerfile: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut ar = tar::Builder::new(Vec::new());

    let mut header = tar::Header::new_gnu();
    header.set_path("Dockerfile")?;
    header.set_size(dockerfile.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    ar.append(&header, dockerfile)?;

    ar.into_inner()
}

/// Extract the first regular file of a tar stream to `destination`.
fn unpack_single_file(archive: &[u8], destination: &Path) -> std::io::Result<Option<PathBuf>> {
    let mut ar = tar::Archive::new(archive);

    for entry in ar.entries()? {
        let mut entry = entry?;
        if entry.header().entry_type().is_file() {
            entry.unpack(destination)?;
            return Ok(Some(destination.to_path_buf()));
        }
    }

    Ok(None)
}
