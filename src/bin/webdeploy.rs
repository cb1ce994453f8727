// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use webdeploy::{
    archive::{list_archives, Packer},
    config::{DeployConfig, HostEntry},
    path::default_config_path,
    rollout::{HostStatus, Rollout, RolloutReport},
};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::{
    error::Error,
    fs,
    path::{Path, PathBuf},
    process::exit,
    time::Duration,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "webdeploy [options] <command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Path to deployment configuration file.
    #[arg(short, long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        let config_path = match self.config {
            Some(path) => path,
            None => default_config_path()?,
        };

        match self.command {
            Command::Init(opts) => run_init(config_path, opts),
            Command::Pack => run_pack(load_config(&config_path)?),
            Command::Deploy => run_deploy(load_config(&config_path)?),
            Command::DeployArchive(opts) => run_deploy_archive(load_config(&config_path)?, opts),
            Command::List => run_list(load_config(&config_path)?),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Write starter deployment configuration.
    #[command(override_usage = "webdeploy init [options] [<host>]...")]
    Init(InitOptions),

    /// Pack source directory into new archive.
    #[command(override_usage = "webdeploy pack [options]")]
    Pack,

    /// Pack source directory, and deploy it to every host.
    #[command(override_usage = "webdeploy deploy [options]")]
    Deploy,

    /// Deploy existing archive to every host.
    #[command(override_usage = "webdeploy deploy-archive [options] <archive>")]
    DeployArchive(DeployArchiveOptions),

    /// List archives in versions directory.
    #[command(override_usage = "webdeploy list [options]")]
    List,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct InitOptions {
    /// Addresses of hosts to deploy to.
    #[arg(value_name = "host")]
    pub hosts: Vec<String>,

    /// Overwrite existing configuration file.
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct DeployArchiveOptions {
    /// Path to archive to deploy.
    #[arg(required = true, value_name = "archive")]
    pub archive: PathBuf,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn load_config(path: &Path) -> Result<DeployConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration {:?}", path.display()))?;
    data.parse()
        .with_context(|| format!("failed to parse configuration {:?}", path.display()))
}

fn run_init(config_path: PathBuf, opts: InitOptions) -> Result<()> {
    if config_path.exists() && !opts.force {
        return Err(anyhow!(
            "configuration {:?} already exists, use --force to overwrite",
            config_path.display()
        ));
    }

    let mut config = DeployConfig::default();
    config.hosts = if opts.hosts.is_empty() {
        vec![
            HostEntry::new("web-01", "<IP web-01>"),
            HostEntry::new("web-02", "<IP web-02>"),
        ]
    } else {
        opts.hosts
            .iter()
            .enumerate()
            .map(|(index, address)| HostEntry::new(format!("web-{:02}", index + 1), address))
            .collect()
    };

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&config_path, config.to_string())?;
    info!("wrote configuration to {:?}", config_path.display());

    Ok(())
}

fn run_pack(config: DeployConfig) -> Result<()> {
    let settings = &config.settings;
    let archive = Packer::from_settings(settings).pack(&settings.source_dir)?;
    println!("{}", archive.path().display());

    Ok(())
}

fn run_deploy(config: DeployConfig) -> Result<()> {
    let report = Rollout::new(&config)
        .with_progress(host_progress_bar(config.hosts.len())?)
        .deploy()?;
    summarize(&report)
}

fn run_deploy_archive(config: DeployConfig, opts: DeployArchiveOptions) -> Result<()> {
    let report = Rollout::new(&config)
        .with_progress(host_progress_bar(config.hosts.len())?)
        .deploy_archive(&opts.archive)?;
    summarize(&report)
}

fn run_list(config: DeployConfig) -> Result<()> {
    let settings = &config.settings;
    for archive in list_archives(&settings.versions_dir, &settings.archive_prefix)? {
        println!(
            "{}  {:>10}  {}",
            archive.timestamp().format("%Y-%m-%d %H:%M:%S"),
            archive.size(),
            archive.path().display()
        );
    }

    Ok(())
}

fn host_progress_bar(hosts: usize) -> Result<ProgressBar> {
    let style = ProgressStyle::with_template(
        "{elapsed_precise:.green}  {msg:<30}  [{wide_bar:.yellow/blue}] {pos}/{len}",
    )?
    .progress_chars("-Cco.");
    let bar = ProgressBar::new(hosts as u64);
    bar.set_style(style);
    bar.enable_steady_tick(Duration::from_millis(100));

    Ok(bar)
}

fn summarize(report: &RolloutReport) -> Result<()> {
    for outcome in &report.outcomes {
        match &outcome.status {
            HostStatus::Deployed(release) => {
                info!("{}: serving {}", outcome.host, release.name)
            }
            HostStatus::Failed(error) => warn!("{}: {}", outcome.host, error_chain(error)),
            HostStatus::Skipped => warn!("{}: skipped", outcome.host),
            HostStatus::RolledBack(release) => warn!(
                "{}: rolled back from {} to {}",
                outcome.host,
                release.name,
                release
                    .previous
                    .as_ref()
                    .map(|previous| previous.display().to_string())
                    .unwrap_or_default()
            ),
            HostStatus::RollbackFailed { release, error } => warn!(
                "{}: stuck on {} after failed roll back: {}",
                outcome.host,
                release.name,
                error_chain(error)
            ),
        }
    }

    if !report.is_success() {
        return Err(anyhow!(
            "deployment of {:?} did not reach every host",
            report.archive.display()
        ));
    }

    Ok(())
}

fn error_chain(error: &dyn Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(format!(": {cause}").as_str());
        source = cause.source();
    }

    message
}
