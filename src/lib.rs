// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Pack static web content, and ship it to a fleet of web servers.
//!
//! Webdeploy does two things. It __packs__ a directory of static content into
//! a timestamped archive, and it __deploys__ that archive to each configured
//! host as a new release, before atomically switching the host's current
//! pointer over to it.
//!
//! # Remote Layout
//!
//! Every host follows the same layout by default:
//!
//! ```text
//! /tmp/<archive>.tgz                      # upload, removed after extraction
//! /data/web_static/releases/<release>/    # one directory per release
//! /data/web_static/current -> releases/<release>
//! ```
//!
//! Releases are never removed, so an older release stays around to switch
//! back to.

pub mod archive;
pub mod config;
pub mod path;
pub mod release;
pub mod remote;
pub mod rollout;

pub use archive::{pack, Archive, Packer};
pub use config::{DeployConfig, FailurePolicy, HostEntry, RemoteLayout};
pub use release::{deploy_to_host, Deployer, Release};
pub use rollout::{deploy, Rollout, RolloutReport};
