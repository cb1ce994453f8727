// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Remote host interaction.
//!
//! Deployment never talks to a host directly. Instead, every host is reached
//! through a __transport__ that can upload files to the host, and execute a
//! closed set of file system operations on it. Keeping the operation set
//! closed means that every transport agrees on what each step of a deployment
//! actually does.
//!
//! # Available Transports
//!
//! - [`SshTransport`]: uploads through `scp`, and executes operations as POSIX
//!   shell commands through `ssh`.
//! - [`LocalTransport`]: treats a local directory as the root of a host's file
//!   system. Useful for staging areas, and for testing deployments without a
//!   network.

pub mod local;
pub mod ssh;

pub use local::LocalTransport;
pub use ssh::SshTransport;

use crate::config::{HostEntry, HostTarget};

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};

/// Name given to nested content directory while it is being flattened.
pub(crate) const FLATTEN_STAGING_NAME: &str = ".webdeploy-flatten";

/// File system operation executed on a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOp {
    /// Create directory and any missing parents.
    MakeDir { path: PathBuf },

    /// Extract gzip compressed tarball into directory.
    Extract { archive: PathBuf, dest: PathBuf },

    /// Remove a single file. Fails if file is missing.
    RemoveFile { path: PathBuf },

    /// Move every child of `dir/nested` into `dir`, then remove the now empty
    /// `dir/nested` directory.
    Flatten { dir: PathBuf, nested: String },

    /// Create symbolic link at `link` pointing to `target`, replacing any
    /// existing link at `link`.
    Symlink { target: PathBuf, link: PathBuf },

    /// Rename `from` over `to` in one atomic step.
    Rename { from: PathBuf, to: PathBuf },

    /// Print target of symbolic link. Prints nothing if `path` is not a link.
    ReadLink { path: PathBuf },

    /// Print `yes` if `path` is a directory. Prints nothing otherwise.
    IsDir { path: PathBuf },
}

impl RemoteOp {
    /// Render operation as POSIX shell command.
    pub fn to_shell(&self) -> String {
        match self {
            Self::MakeDir { path } => format!("mkdir -p {}", shell_quote(path)),
            Self::Extract { archive, dest } => {
                format!("tar -xzf {} -C {}", shell_quote(archive), shell_quote(dest))
            }
            Self::RemoveFile { path } => format!("rm {}", shell_quote(path)),
            Self::Flatten { dir, nested } => {
                let nested = shell_quote(&dir.join(nested));
                let staging = shell_quote(&dir.join(FLATTEN_STAGING_NAME));
                let dir = shell_quote(dir);
                // INVARIANT: Rename nested directory first, so a child that
                // shares its name can still be moved up.
                format!(
                    "mv -T {nested} {staging} && \
                     find {staging} -mindepth 1 -maxdepth 1 -exec mv -t {dir} {{}} + && \
                     rmdir {staging}"
                )
            }
            Self::Symlink { target, link } => {
                format!("ln -sfn {} {}", shell_quote(target), shell_quote(link))
            }
            Self::Rename { from, to } => {
                format!("mv -Tf {} {}", shell_quote(from), shell_quote(to))
            }
            Self::ReadLink { path } => format!("readlink {} || true", shell_quote(path)),
            Self::IsDir { path } => {
                format!("test -d {} && echo yes || true", shell_quote(path))
            }
        }
    }
}

impl Display for RemoteOp {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.to_shell().as_str())
    }
}

/// Way to reach a single host.
pub trait Transport {
    /// Name of host being reached.
    fn host(&self) -> &str;

    /// Upload local file to remote path.
    ///
    /// # Errors
    ///
    /// - Return [`TransportError`] if upload fails.
    fn upload(&self, local: &Path, remote: &Path) -> Result<()>;

    /// Execute operation on host, returning whatever it printed.
    ///
    /// # Errors
    ///
    /// - Return [`TransportError`] if operation fails.
    fn execute(&self, op: &RemoteOp) -> Result<String>;
}

/// Construct transport for host entry.
pub fn connect(host: &HostEntry) -> Box<dyn Transport> {
    match host.target() {
        HostTarget::Ssh(_) => Box::new(SshTransport::new(host)),
        HostTarget::Local(root) => Box::new(LocalTransport::new(&host.name, root)),
    }
}

/// Quote a path for safe use in shell commands.
pub fn shell_quote(path: &Path) -> String {
    format!("'{}'", path.to_string_lossy().replace('\'', "'\\''"))
}

/// Transport error types.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// External program cannot be spawned.
    #[error("failed to spawn {program:?}")]
    Spawn {
        #[source]
        source: std::io::Error,
        program: String,
    },

    /// External program exited unsuccessfully.
    #[error("command {command:?} failed on {host} ({status}):\n{message}")]
    CommandFailed {
        host: String,
        command: String,
        status: String,
        message: String,
    },

    /// Local file system operation fails.
    #[error("failed to {action} {:?}", path.display())]
    Io {
        #[source]
        source: std::io::Error,
        action: &'static str,
        path: PathBuf,
    },

    /// Remote path is not absolute.
    #[error("remote path {:?} must be absolute", path.display())]
    RelativePath { path: PathBuf },

    /// Remote path cannot be handed to `scp` without being mangled.
    #[error("remote path {:?} contains characters scp cannot carry", path.display())]
    UnsafePath { path: PathBuf },
}

/// Friendly result alias :3
pub type Result<T, E = TransportError> = std::result::Result<T, E>;
