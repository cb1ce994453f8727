// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout for the deployment configuration file that webdeploy
//! uses to simplify the process of serialization and deserialization. File I/O
//! is left to the caller to figure out.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    str::FromStr,
};

/// Deployment configuration layout.
///
/// A deployment configuration is composed of three parts: pack settings,
/// remote layout, and the host listing. The pack settings determine what
/// gets archived and where archives are kept locally. The remote layout
/// determines where releases live on every host. The host listing names each
/// server that an archive gets deployed to.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct DeployConfig {
    /// Settings for packing and rollout behavior.
    #[serde(default)]
    pub settings: PackSettings,

    /// Remote directory layout shared by all hosts.
    #[serde(default)]
    pub remote: RemoteLayout,

    /// Listing of target hosts.
    #[serde(rename = "host", default)]
    pub hosts: Vec<HostEntry>,
}

impl FromStr for DeployConfig {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut config: DeployConfig = toml::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on every local path field.
        config.settings.source_dir = expand_path(&config.settings.source_dir)?;
        config.settings.versions_dir = expand_path(&config.settings.versions_dir)?;
        for host in &mut config.hosts {
            if let Some(identity_file) = &host.identity_file {
                host.identity_file = Some(expand_path(identity_file)?);
            }

            if let Some(root) = host.address.strip_prefix(LOCAL_ADDRESS_PREFIX) {
                host.address = format!(
                    "{LOCAL_ADDRESS_PREFIX}{}",
                    shellexpand::full(root).map_err(ConfigError::ShellExpansion)?
                );
            }
        }

        Ok(config)
    }
}

impl Display for DeployConfig {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Pack settings.
///
/// Determine what directory gets archived, where archives are stored, and how
/// a failed host affects the rest of a rollout.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PackSettings {
    /// Directory of static content to archive.
    pub source_dir: PathBuf,

    /// Directory that receives generated archives.
    pub versions_dir: PathBuf,

    /// File name prefix of generated archives.
    pub archive_prefix: String,

    /// Gitignore style patterns of content to leave out of archives.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,

    /// What to do when deployment to a host fails.
    pub on_failure: FailurePolicy,
}

impl Default for PackSettings {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from(DEFAULT_SOURCE_DIR),
            versions_dir: PathBuf::from(DEFAULT_VERSIONS_DIR),
            archive_prefix: DEFAULT_SOURCE_DIR.into(),
            exclude: None,
            on_failure: FailurePolicy::default(),
        }
    }
}

/// Rollout behavior when a host fails.
#[derive(Default, Debug, PartialEq, Eq, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Attempt every host, and report each outcome.
    #[default]
    Continue,

    /// Stop at first failure, and roll back hosts that already switched.
    Abort,
}

/// Remote directory layout.
///
/// Every host uses the same layout. Paths are absolute paths on the remote
/// file system.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RemoteLayout {
    /// Directory that temporarily holds uploaded archives.
    pub tmp_dir: PathBuf,

    /// Directory holding every release.
    pub releases_dir: PathBuf,

    /// Symbolic link pointing at the active release.
    pub current_link: PathBuf,
}

impl RemoteLayout {
    /// Remote path that an archive gets uploaded to.
    pub fn upload_path(&self, archive_file_name: &str) -> PathBuf {
        self.tmp_dir.join(archive_file_name)
    }

    /// Remote directory of named release.
    pub fn release_dir(&self, release_name: &str) -> PathBuf {
        self.releases_dir.join(release_name)
    }

    /// Temporary name that new current links are created under before being
    /// renamed over the real current link.
    pub fn staging_link(&self) -> PathBuf {
        let mut name = self.current_link.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl Default for RemoteLayout {
    fn default() -> Self {
        Self {
            tmp_dir: PathBuf::from("/tmp"),
            releases_dir: PathBuf::from("/data/web_static/releases"),
            current_link: PathBuf::from("/data/web_static/current"),
        }
    }
}

/// Target host entry.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct HostEntry {
    /// Name used to identify the host in logs and reports.
    pub name: String,

    /// Network address, or `local:<dir>` to deploy into a local directory.
    pub address: String,

    /// Login user for ssh.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Port of ssh daemon.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Private key to authenticate with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_file: Option<PathBuf>,

    /// Seconds to wait for ssh connection to be established.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<u64>,
}

impl HostEntry {
    /// Construct new host entry with name and address only.
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            ..Default::default()
        }
    }

    /// Determine how the host is reached.
    pub fn target(&self) -> HostTarget<'_> {
        match self.address.strip_prefix(LOCAL_ADDRESS_PREFIX) {
            Some(root) => HostTarget::Local(Path::new(root)),
            None => HostTarget::Ssh(self.destination()),
        }
    }

    /// Ssh destination of form `user@address`, or `address` without a user.
    pub fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{user}@{}", self.address),
            None => self.address.clone(),
        }
    }
}

/// How a host is reached.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum HostTarget<'cfg> {
    /// Remote host reached over ssh at destination.
    Ssh(String),

    /// Local directory acting as the root of a host's file system.
    Local(&'cfg Path),
}

/// Configuration error types.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

const DEFAULT_SOURCE_DIR: &str = "web_static";
const DEFAULT_VERSIONS_DIR: &str = "versions";
const LOCAL_ADDRESS_PREFIX: &str = "local:";

fn expand_path(path: &Path) -> Result<PathBuf> {
    Ok(PathBuf::from(
        shellexpand::full(path.to_string_lossy().as_ref())
            .map_err(ConfigError::ShellExpansion)?
            .into_owned(),
    ))
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
