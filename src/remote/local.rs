// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Transport into a local directory.
//!
//! A local directory plays the role of a host's file system root, so a remote
//! path like `/data/web_static/current` lands at
//! `<root>/data/web_static/current`. Symbolic links created through this
//! transport point at their re-rooted targets, so following a link from the
//! local machine reaches the right release.

use crate::remote::{RemoteOp, Result, Transport, TransportError, FLATTEN_STAGING_NAME};

use flate2::read::GzDecoder;
use std::{
    fs::{self, File},
    path::{Component, Path, PathBuf},
};
use tracing::{debug, instrument};

/// Transport that treats local directory as host's file system root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTransport {
    name: String,
    root: PathBuf,
}

impl LocalTransport {
    /// Construct new local transport rooted at directory.
    ///
    /// A relative root is made absolute against the current working
    /// directory, so links created under it stay valid from anywhere.
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            name: name.into(),
            root: std::path::absolute(&root).unwrap_or(root),
        }
    }

    /// Directory acting as host's file system root.
    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    /// Map remote absolute path to its location under root.
    ///
    /// # Errors
    ///
    /// - Return [`TransportError::RelativePath`] if path is not absolute, or
    ///   tries to climb out of root through `..`.
    pub fn resolve(&self, remote: &Path) -> Result<PathBuf> {
        if !remote.has_root() {
            return Err(TransportError::RelativePath {
                path: remote.to_path_buf(),
            });
        }

        let mut resolved = self.root.clone();
        for component in remote.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::RootDir | Component::CurDir | Component::Prefix(_) => continue,
                Component::ParentDir => {
                    return Err(TransportError::RelativePath {
                        path: remote.to_path_buf(),
                    })
                }
            }
        }

        Ok(resolved)
    }

    /// Map location under root back to remote absolute path.
    fn unresolve(&self, local: &Path) -> PathBuf {
        match local.strip_prefix(&self.root) {
            Ok(relative) => Path::new("/").join(relative),
            Err(_) => local.to_path_buf(),
        }
    }

    fn flatten(&self, dir: &Path, nested: &str) -> Result<()> {
        let staging = dir.join(FLATTEN_STAGING_NAME);
        fs::rename(dir.join(nested), &staging).map_err(io_error("move", &staging))?;

        let entries = fs::read_dir(&staging).map_err(io_error("read", &staging))?;
        for entry in entries {
            let entry = entry.map_err(io_error("read", &staging))?;
            let dest = dir.join(entry.file_name());
            fs::rename(entry.path(), &dest).map_err(io_error("move", &dest))?;
        }

        fs::remove_dir(&staging).map_err(io_error("remove", &staging))
    }
}

impl Transport for LocalTransport {
    fn host(&self) -> &str {
        self.name.as_str()
    }

    #[instrument(skip(self), level = "debug")]
    fn upload(&self, local: &Path, remote: &Path) -> Result<()> {
        let dest = self.resolve(remote)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(io_error("create", parent))?;
        }

        fs::copy(local, &dest).map_err(io_error("copy", local))?;
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    fn execute(&self, op: &RemoteOp) -> Result<String> {
        debug!("{}: {op}", self.name);
        match op {
            RemoteOp::MakeDir { path } => {
                let path = self.resolve(path)?;
                fs::create_dir_all(&path).map_err(io_error("create", &path))?;
            }
            RemoteOp::Extract { archive, dest } => {
                let archive = self.resolve(archive)?;
                let dest = self.resolve(dest)?;
                let file = File::open(&archive).map_err(io_error("open", &archive))?;
                tar::Archive::new(GzDecoder::new(file))
                    .unpack(&dest)
                    .map_err(io_error("extract", &archive))?;
            }
            RemoteOp::RemoveFile { path } => {
                let path = self.resolve(path)?;
                fs::remove_file(&path).map_err(io_error("remove", &path))?;
            }
            RemoteOp::Flatten { dir, nested } => {
                let dir = self.resolve(dir)?;
                self.flatten(&dir, nested)?;
            }
            RemoteOp::Symlink { target, link } => {
                let target = self.resolve(target)?;
                let link = self.resolve(link)?;
                if fs::symlink_metadata(&link).is_ok() {
                    fs::remove_file(&link).map_err(io_error("remove", &link))?;
                }

                symlink(&target, &link).map_err(io_error("link", &link))?;
            }
            RemoteOp::Rename { from, to } => {
                let from = self.resolve(from)?;
                let to = self.resolve(to)?;
                fs::rename(&from, &to).map_err(io_error("rename", &from))?;
            }
            RemoteOp::ReadLink { path } => {
                let path = self.resolve(path)?;
                return match fs::read_link(&path) {
                    Ok(target) => Ok(self.unresolve(&target).display().to_string()),
                    Err(_) => Ok(String::new()),
                };
            }
            RemoteOp::IsDir { path } => {
                let path = self.resolve(path)?;
                if path.is_dir() {
                    return Ok("yes".into());
                }
            }
        }

        Ok(String::new())
    }
}

fn io_error(action: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> TransportError {
    let path = path.to_path_buf();
    move |source| TransportError::Io {
        source,
        action,
        path,
    }
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}
