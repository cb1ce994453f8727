// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{read_tree, timestamp, SiteFixture};

use anyhow::Result;
use indoc::formatdoc;
use pretty_assertions::assert_eq;
use sealed_test::prelude::*;
use std::{fs, path::Path};
use webdeploy::{
    archive::{list_archives, top_level_entry, Packer},
    config::DeployConfig,
    release::deploy_to_host,
    remote::LocalTransport,
    rollout::{HostStatus, Rollout},
    RemoteLayout,
};

#[sealed_test]
fn pack_then_deploy_hello() -> Result<()> {
    let site = SiteFixture::new("web_static")?;
    site.write("index.html", "hello")?;

    let archive = Packer::default().pack_at("web_static", timestamp(1, 12, 0, 0))?;
    assert_eq!(
        archive.path(),
        Path::new("versions/web_static_20240101120000.tgz")
    );
    assert_eq!(top_level_entry(archive.path())?.as_deref(), Some("web_static"));

    let transport = LocalTransport::new("web-01", "hosts/web-01");
    deploy_to_host(&transport, archive.path(), &RemoteLayout::default())?;

    let index = fs::read_to_string("hosts/web-01/data/web_static/current/index.html")?;
    assert_eq!(index, "hello");

    Ok(())
}

#[sealed_test]
fn pack_default_source_directory() -> Result<()> {
    let site = SiteFixture::new("web_static")?;
    site.write("index.html", "hello")?;

    let archive = webdeploy::pack("web_static")?;
    let name = archive
        .path()
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string();
    assert!(archive.path().starts_with("versions"));
    assert!(name.starts_with("web_static_") && name.ends_with(".tgz"));
    assert_eq!(name.len(), "web_static_".len() + 14 + ".tgz".len());
    assert!(archive.size() > 0);

    Ok(())
}

#[sealed_test]
fn pack_missing_source_leaves_no_archive() -> Result<()> {
    assert!(webdeploy::pack("web_static").is_err());
    assert!(list_archives("versions", "web_static")?.is_empty());

    Ok(())
}

#[cfg(unix)]
#[test]
fn deployed_release_matches_source_tree() -> Result<()> {
    let root = tempfile::tempdir()?;
    let site = SiteFixture::new(root.path().join("web_static"))?;
    site.write("index.html", "<h1>hello</h1>")?;
    site.write(".well-known/security.txt", "Contact: ops@example.org")?;
    site.write("styles/4-common.css", "body { margin: 0; }")?;
    site.write("images/icons/logo.svg", "<svg/>")?;
    site.write("web_static/nested.txt", "same name as content directory")?;

    let archive = Packer::new(root.path().join("versions"), "web_static")
        .pack_at(site.path(), timestamp(1, 12, 0, 0))?;
    let transport = LocalTransport::new("web-01", root.path().join("web-01"));
    let release = deploy_to_host(&transport, archive.path(), &RemoteLayout::default())?;
    assert_eq!(release.previous, None);

    let current = root.path().join("web-01/data/web_static/current");
    assert_eq!(read_tree(&current)?, read_tree(site.path())?);

    Ok(())
}

#[cfg(unix)]
#[test]
fn rollout_from_configuration() -> Result<()> {
    let root = tempfile::tempdir()?;
    let site = SiteFixture::new(root.path().join("web_static"))?;
    site.write("index.html", "hello")?;
    site.write("notes.swp", "scratch")?;

    let config: DeployConfig = formatdoc! {r#"
        [settings]
        source_dir = "{root}/web_static"
        versions_dir = "{root}/versions"
        exclude = ["*.swp"]
        on_failure = "continue"

        [[host]]
        name = "web-01"
        address = "local:{root}/web-01"

        [[host]]
        name = "web-02"
        address = "local:{root}/web-02"
    "#, root = root.path().display()}
    .parse()?;

    let rollout = Rollout::new(&config);
    let first = rollout.deploy_at(timestamp(1, 12, 0, 0))?;
    assert!(first.is_success());

    site.write("index.html", "hello again")?;
    let second = rollout.deploy_at(timestamp(2, 8, 30, 0))?;
    assert!(second.is_success());

    for host in ["web-01", "web-02"] {
        let current = root.path().join(host).join("data/web_static/current");
        assert_eq!(fs::read_to_string(current.join("index.html"))?, "hello again");
        assert!(!current.join("notes.swp").exists());

        let releases = root.path().join(host).join("data/web_static/releases");
        assert!(releases.join("web_static_20240101120000").is_dir());
        assert!(releases.join("web_static_20240102083000").is_dir());
    }

    for outcome in &second.outcomes {
        match &outcome.status {
            HostStatus::Deployed(release) => {
                assert_eq!(
                    release.previous.as_deref(),
                    Some(Path::new(
                        "/data/web_static/releases/web_static_20240101120000"
                    ))
                );
            }
            other => panic!("unexpected status {other:?}"),
        }
    }

    let archives = list_archives(root.path().join("versions"), "web_static")?;
    assert_eq!(archives.len(), 2);

    Ok(())
}
