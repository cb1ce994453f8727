// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Release deployment logic.
//!
//! Utilities to turn an archive into a live __release__ on a single host. A
//! release is a directory under the releases directory that holds the unpacked
//! content of exactly one archive. The __current pointer__ is a symbolic link
//! that designates which release is live.
//!
//! # Deployment Sequence
//!
//! 1. Read where the current pointer points to, so it can be restored later.
//! 2. Check if release directory already exists. An existing release is never
//!    modified, so steps 3 through 7 are skipped for it.
//! 3. Upload archive to the remote temporary directory.
//! 4. Create release directory named after the archive.
//! 5. Extract archive into release directory.
//! 6. Remove uploaded archive.
//! 7. Flatten release, such that content of the archive's top-level directory
//!    sits directly inside of the release directory.
//! 8. Create new link to release under a temporary name.
//! 9. Rename temporary link over the current pointer.
//!
//! The last step is a single rename, so the current pointer always references
//! either the old release or the new one. No step is retried, and nothing is
//! cleaned up when a step fails.

use crate::{
    archive::{release_name, top_level_entry},
    config::RemoteLayout,
    remote::{RemoteOp, Transport, TransportError},
};

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Component, Path, PathBuf},
};
use tracing::{info, instrument, warn};

/// Release that was made live on a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// Name of host release lives on.
    pub host: String,

    /// Name of release.
    pub name: String,

    /// Remote directory of release.
    pub dir: PathBuf,

    /// Release that current pointer referenced beforehand, if any.
    pub previous: Option<PathBuf>,
}

/// Deploys archives into releases.
#[derive(Debug, Clone, Default)]
pub struct Deployer {
    layout: RemoteLayout,
}

impl Deployer {
    /// Construct new deployer for remote layout.
    pub fn new(layout: RemoteLayout) -> Self {
        Self { layout }
    }

    /// Remote layout releases are deployed into.
    pub fn layout(&self) -> &RemoteLayout {
        &self.layout
    }

    /// Deploy local archive to host reached through transport.
    ///
    /// If the release is already live on the host, then nothing is changed.
    ///
    /// # Errors
    ///
    /// - Return [`DeployError::ArchiveMissing`] if archive does not exist
    ///   locally. No remote operation is attempted.
    /// - Return [`DeployError::InvalidArchive`] if archive has no usable file
    ///   name, or no top-level directory to flatten.
    /// - Return [`DeployError::Step`] naming the first remote step that fails.
    #[instrument(skip(self, transport), fields(host = transport.host()), level = "debug")]
    pub fn deploy(&self, transport: &dyn Transport, archive: &Path) -> Result<Release> {
        if !archive.is_file() {
            return Err(DeployError::ArchiveMissing {
                path: archive.to_path_buf(),
            });
        }

        let invalid = |reason: &str| DeployError::InvalidArchive {
            path: archive.to_path_buf(),
            reason: reason.to_string(),
        };
        let file_name = archive
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| invalid("file name is not valid UTF-8"))?;
        let name = release_name(archive).ok_or_else(|| invalid("file name has no stem"))?;
        let nested = top_level_entry(archive)
            .map_err(|err| invalid(&err.to_string()))?
            .ok_or_else(|| invalid("no top-level directory"))?;

        let host = transport.host();
        let upload = self.layout.upload_path(file_name);
        let dir = self.layout.release_dir(&name);
        let previous = self.current_target(transport)?;

        if previous.as_deref() == Some(dir.as_path()) {
            warn!("{host}: release {name} is already current");
            return Ok(Release {
                host: host.to_string(),
                name,
                dir,
                previous,
            });
        }

        if self.release_exists(transport, &dir)? {
            warn!("{host}: release {name} already exists, switching to it as is");
        } else {
            self.unpack(transport, archive, &upload, &dir, nested)?;
        }

        self.switch_current(transport, &dir)?;
        info!("{host}: release {name} is live");

        Ok(Release {
            host: host.to_string(),
            name,
            dir,
            previous,
        })
    }

    /// Point current pointer back at a previous release.
    ///
    /// # Errors
    ///
    /// - Return [`DeployError::Step`] if pointer cannot be switched.
    #[instrument(skip(self, transport), fields(host = transport.host()), level = "debug")]
    pub fn rollback(&self, transport: &dyn Transport, previous: &Path) -> Result<()> {
        warn!("{}: roll back to {}", transport.host(), previous.display());
        self.switch_current(transport, previous)
    }

    /// Read release current pointer references on host.
    ///
    /// # Errors
    ///
    /// - Return [`DeployError::Step`] if pointer cannot be read.
    pub fn current_target(&self, transport: &dyn Transport) -> Result<Option<PathBuf>> {
        let output = self.run(
            transport,
            DeployStep::ReadCurrent,
            RemoteOp::ReadLink {
                path: self.layout.current_link.clone(),
            },
        )?;
        let target = output.trim();
        if target.is_empty() {
            return Ok(None);
        }

        // INVARIANT: Relative links are relative to the link's own directory.
        let base = self.layout.current_link.parent().unwrap_or(Path::new("/"));
        Ok(Some(normalize(&base.join(target))))
    }

    fn release_exists(&self, transport: &dyn Transport, dir: &Path) -> Result<bool> {
        let output = self.run(
            transport,
            DeployStep::InspectRelease,
            RemoteOp::IsDir {
                path: dir.to_path_buf(),
            },
        )?;

        Ok(output.trim() == "yes")
    }

    fn unpack(
        &self,
        transport: &dyn Transport,
        archive: &Path,
        upload: &Path,
        dir: &Path,
        nested: String,
    ) -> Result<()> {
        let host = transport.host();
        info!("{host}: upload {} to {}", archive.display(), upload.display());
        transport
            .upload(archive, upload)
            .map_err(step_error(host, DeployStep::Upload))?;

        info!("{host}: create release {}", dir.display());
        self.run(
            transport,
            DeployStep::MakeReleaseDir,
            RemoteOp::MakeDir {
                path: dir.to_path_buf(),
            },
        )?;

        info!("{host}: extract {}", upload.display());
        self.run(
            transport,
            DeployStep::Extract,
            RemoteOp::Extract {
                archive: upload.to_path_buf(),
                dest: dir.to_path_buf(),
            },
        )?;
        self.run(
            transport,
            DeployStep::CleanupUpload,
            RemoteOp::RemoveFile {
                path: upload.to_path_buf(),
            },
        )?;

        info!("{host}: flatten {nested} into {}", dir.display());
        self.run(
            transport,
            DeployStep::Flatten,
            RemoteOp::Flatten {
                dir: dir.to_path_buf(),
                nested,
            },
        )?;

        Ok(())
    }

    fn switch_current(&self, transport: &dyn Transport, target: &Path) -> Result<()> {
        let staging = self.layout.staging_link();
        self.run(
            transport,
            DeployStep::Symlink,
            RemoteOp::Symlink {
                target: target.to_path_buf(),
                link: staging.clone(),
            },
        )?;
        self.run(
            transport,
            DeployStep::Swap,
            RemoteOp::Rename {
                from: staging,
                to: self.layout.current_link.clone(),
            },
        )?;

        Ok(())
    }

    fn run(&self, transport: &dyn Transport, step: DeployStep, op: RemoteOp) -> Result<String> {
        transport
            .execute(&op)
            .map_err(step_error(transport.host(), step))
    }
}

/// Deploy archive to host with given remote layout.
///
/// # Errors
///
/// See [`Deployer::deploy`].
pub fn deploy_to_host(
    transport: &dyn Transport,
    archive: impl AsRef<Path>,
    layout: &RemoteLayout,
) -> Result<Release> {
    Deployer::new(layout.clone()).deploy(transport, archive.as_ref())
}

/// Step of deployment sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployStep {
    ReadCurrent,
    InspectRelease,
    Upload,
    MakeReleaseDir,
    Extract,
    CleanupUpload,
    Flatten,
    Symlink,
    Swap,
}

impl Display for DeployStep {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let step = match self {
            Self::ReadCurrent => "read current pointer",
            Self::InspectRelease => "inspect release directory",
            Self::Upload => "upload archive",
            Self::MakeReleaseDir => "create release directory",
            Self::Extract => "extract archive",
            Self::CleanupUpload => "remove uploaded archive",
            Self::Flatten => "flatten release",
            Self::Symlink => "link release",
            Self::Swap => "swap current pointer",
        };
        fmt.write_str(step)
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut normal = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                normal.pop();
            }
            Component::CurDir => {}
            other => normal.push(other),
        }
    }

    normal
}

fn step_error(host: &str, step: DeployStep) -> impl FnOnce(TransportError) -> DeployError {
    let host = host.to_string();
    move |source| DeployError::Step { host, step, source }
}

/// Deployment error types.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Archive does not exist locally.
    #[error("archive {:?} does not exist", path.display())]
    ArchiveMissing { path: PathBuf },

    /// Archive cannot be deployed as a release.
    #[error("archive {:?} cannot be deployed: {reason}", path.display())]
    InvalidArchive { path: PathBuf, reason: String },

    /// Step of deployment sequence fails on host.
    #[error("{host}: failed to {step}")]
    Step {
        host: String,
        step: DeployStep,
        #[source]
        source: TransportError,
    },
}

impl DeployError {
    /// Step that failed, if the failure happened on a host.
    pub fn step(&self) -> Option<DeployStep> {
        match self {
            Self::Step { step, .. } => Some(*step),
            _ => None,
        }
    }
}

/// Friendly result alias :3
pub type Result<T, E = DeployError> = std::result::Result<T, E>;
