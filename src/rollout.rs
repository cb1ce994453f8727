// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Rollout of an archive across every configured host.
//!
//! A __rollout__ packs the source directory once, and deploys the resulting
//! archive to each host in configuration order, one host at a time. What
//! happens when a host fails depends on the configured [`FailurePolicy`]:
//!
//! - [`FailurePolicy::Continue`]: every host is attempted regardless, and the
//!   report lists how each one fared.
//! - [`FailurePolicy::Abort`]: the first failure stops the rollout. Hosts that
//!   already switched to the new release are pointed back at the release they
//!   had before. Hosts that had no release before keep the new one.

use crate::{
    archive::{Archive, PackError, Packer},
    config::{DeployConfig, FailurePolicy, HostEntry},
    release::{DeployError, Deployer, Release},
    remote::{connect, Transport},
};

use chrono::{Local, NaiveDateTime};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument, warn};

/// Outcome of rollout on a single host.
#[derive(Debug)]
pub enum HostStatus {
    /// Current pointer references new release.
    Deployed(Release),

    /// Deployment failed.
    Failed(DeployError),

    /// Host was not attempted, because rollout aborted earlier.
    Skipped,

    /// Host switched to new release, then got switched back after rollout
    /// aborted.
    RolledBack(Release),

    /// Host switched to new release, and could not be switched back after
    /// rollout aborted.
    RollbackFailed { release: Release, error: DeployError },
}

/// Outcome of rollout on a named host.
#[derive(Debug)]
pub struct HostOutcome {
    /// Name of host.
    pub host: String,

    /// How host fared.
    pub status: HostStatus,
}

/// Report of a complete rollout.
#[derive(Debug)]
pub struct RolloutReport {
    /// Archive that was rolled out.
    pub archive: PathBuf,

    /// Outcome of each host in configuration order.
    pub outcomes: Vec<HostOutcome>,

    /// Rollout stopped at first failure.
    pub aborted: bool,
}

impl RolloutReport {
    /// Check if every host now serves new release.
    pub fn is_success(&self) -> bool {
        !self.aborted
            && self
                .outcomes
                .iter()
                .all(|outcome| matches!(outcome.status, HostStatus::Deployed(_)))
    }

    /// Hosts that failed to deploy.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &DeployError)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match &outcome.status {
                HostStatus::Failed(error) => Some((outcome.host.as_str(), error)),
                _ => None,
            })
    }
}

/// Rollout across every host in deployment configuration.
#[derive(Debug)]
pub struct Rollout<'cfg> {
    config: &'cfg DeployConfig,
    bar: ProgressBar,
}

impl<'cfg> Rollout<'cfg> {
    /// Construct new rollout over deployment configuration.
    pub fn new(config: &'cfg DeployConfig) -> Self {
        Self {
            config,
            bar: ProgressBar::hidden(),
        }
    }

    /// Report progress through progress bar, one tick per host.
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.bar = bar;
        self
    }

    /// Pack source directory at current local time, and deploy it everywhere.
    ///
    /// # Errors
    ///
    /// See [`Rollout::deploy_at`].
    pub fn deploy(&self) -> Result<RolloutReport> {
        self.deploy_at(Local::now().naive_local())
    }

    /// Pack source directory as if packed at timestamp, and deploy it
    /// everywhere.
    ///
    /// # Errors
    ///
    /// - Return [`RolloutError::NoHosts`] if configuration lists no hosts.
    /// - Return [`RolloutError::Pack`] if packing fails. No host is touched.
    #[instrument(skip(self), level = "debug")]
    pub fn deploy_at(&self, timestamp: NaiveDateTime) -> Result<RolloutReport> {
        if self.config.hosts.is_empty() {
            return Err(RolloutError::NoHosts);
        }

        let archive = self.pack_at(timestamp)?;
        self.deploy_archive(archive.path())
    }

    /// Pack source directory as if packed at timestamp.
    ///
    /// # Errors
    ///
    /// - Return [`RolloutError::Pack`] if packing fails.
    pub fn pack_at(&self, timestamp: NaiveDateTime) -> Result<Archive> {
        let settings = &self.config.settings;
        Ok(Packer::from_settings(settings).pack_at(&settings.source_dir, timestamp)?)
    }

    /// Deploy existing archive everywhere.
    ///
    /// # Errors
    ///
    /// - Return [`RolloutError::NoHosts`] if configuration lists no hosts.
    /// - Return [`RolloutError::ArchiveMissing`] if archive does not exist. No
    ///   host is touched.
    #[instrument(skip(self), level = "debug")]
    pub fn deploy_archive(&self, archive: &Path) -> Result<RolloutReport> {
        self.deploy_archive_with(archive, connect)
    }

    /// Deploy existing archive everywhere, reaching each host through
    /// transports made by given connector.
    ///
    /// # Errors
    ///
    /// See [`Rollout::deploy_archive`].
    pub fn deploy_archive_with<C>(&self, archive: &Path, connector: C) -> Result<RolloutReport>
    where
        C: Fn(&HostEntry) -> Box<dyn Transport>,
    {
        if self.config.hosts.is_empty() {
            return Err(RolloutError::NoHosts);
        }

        if !archive.is_file() {
            return Err(RolloutError::ArchiveMissing {
                path: archive.to_path_buf(),
            });
        }

        let deployer = Deployer::new(self.config.remote.clone());
        let policy = self.config.settings.on_failure;
        let mut transports: Vec<Box<dyn Transport>> = Vec::new();
        let mut outcomes = Vec::new();
        let mut aborted = false;

        self.bar.set_length(self.config.hosts.len() as u64);
        for host in &self.config.hosts {
            if aborted {
                outcomes.push(HostOutcome {
                    host: host.name.clone(),
                    status: HostStatus::Skipped,
                });
                continue;
            }

            self.bar.set_message(host.name.clone());
            let transport = connector(host);
            let status = match deployer.deploy(transport.as_ref(), archive) {
                Ok(release) => HostStatus::Deployed(release),
                Err(err) => {
                    error!("{err}");
                    if policy == FailurePolicy::Abort {
                        aborted = true;
                    }
                    HostStatus::Failed(err)
                }
            };

            outcomes.push(HostOutcome {
                host: host.name.clone(),
                status,
            });
            transports.push(transport);
            self.bar.inc(1);
        }
        self.bar.finish_and_clear();

        if aborted {
            warn!("rollout aborted, rolling back hosts that already switched");
            for (outcome, transport) in outcomes.iter_mut().zip(&transports) {
                outcome.status = roll_back(&deployer, transport.as_ref(), outcome.status.take());
            }
        }

        let report = RolloutReport {
            archive: archive.to_path_buf(),
            outcomes,
            aborted,
        };

        if report.is_success() {
            info!("{} deployed to every host", archive.display());
        }

        Ok(report)
    }
}

impl HostStatus {
    fn take(&mut self) -> Self {
        std::mem::replace(self, Self::Skipped)
    }
}

fn roll_back(deployer: &Deployer, transport: &dyn Transport, status: HostStatus) -> HostStatus {
    let release = match status {
        HostStatus::Deployed(release) => release,
        other => return other,
    };

    let previous = match release.previous.clone() {
        Some(previous) if previous != release.dir => previous,
        Some(_) => return HostStatus::Deployed(release),
        None => {
            warn!(
                "{}: no previous release, keeping {}",
                release.host, release.name
            );
            return HostStatus::Deployed(release);
        }
    };

    match deployer.rollback(transport, &previous) {
        Ok(()) => HostStatus::RolledBack(release),
        Err(error) => {
            error!("{error}");
            HostStatus::RollbackFailed { release, error }
        }
    }
}

/// Pack source directory, and deploy resulting archive to every configured
/// host.
///
/// # Errors
///
/// See [`Rollout::deploy_at`].
pub fn deploy(config: &DeployConfig) -> Result<RolloutReport> {
    Rollout::new(config).deploy()
}

/// Rollout error types.
#[derive(Debug, thiserror::Error)]
pub enum RolloutError {
    /// Source directory cannot be packed.
    #[error(transparent)]
    Pack(#[from] PackError),

    /// Archive to deploy does not exist.
    #[error("archive {:?} does not exist", path.display())]
    ArchiveMissing { path: PathBuf },

    /// Configuration lists no hosts to deploy to.
    #[error("no hosts configured")]
    NoHosts,
}

/// Friendly result alias :3
pub type Result<T, E = RolloutError> = std::result::Result<T, E>;
