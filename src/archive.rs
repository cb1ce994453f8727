// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Archive creation and discovery.
//!
//! Webdeploy ships static content as a single gzip compressed tarball called
//! an __archive__. Every archive is named after the moment it was packed, so
//! the versions directory doubles as a history of everything that was ever
//! packed.
//!
//! # Archive Layout
//!
//! An archive is named `<prefix>_<YYYYMMDDHHMMSS>.tgz`, e.g.,
//! `web_static_20240101120000.tgz`. The packed directory keeps its own name as
//! the top-level entry of the tarball. Thus, packing `web_static/` yields
//! entries like `web_static/index.html`. Deployment relies on this to flatten
//! releases on the remote end.
//!
//! # Pitfalls
//!
//! Timestamps only have second resolution. Packing twice within the same
//! second produces the same archive path, and the second pack silently
//! overwrites the first.

pub mod exclude;

use crate::{archive::exclude::ExcludeRules, config::PackSettings};

use chrono::{Local, NaiveDateTime};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use std::{
    fs::{self, File},
    path::{Component, Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

/// Timestamp layout embedded in archive names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// File extension of archives.
pub const ARCHIVE_EXTENSION: &str = "tgz";

/// Packed archive residing in versions directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    path: PathBuf,
    timestamp: NaiveDateTime,
    size: u64,
}

impl Archive {
    /// Open existing archive at path.
    ///
    /// Recovers the pack timestamp from the archive's file name.
    ///
    /// # Errors
    ///
    /// - Return [`PackError::InvalidName`] if file name does not follow
    ///   archive naming layout for given prefix.
    /// - Return [`PackError::Inspect`] if archive metadata cannot be read.
    pub fn open(path: impl Into<PathBuf>, prefix: &str) -> Result<Self> {
        let path = path.into();
        let timestamp = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| parse_archive_name(name, prefix))
            .ok_or_else(|| PackError::InvalidName { path: path.clone() })?;
        let size = fs::metadata(&path)
            .map_err(|err| PackError::Inspect {
                source: err,
                path: path.clone(),
            })?
            .len();

        Ok(Self {
            path,
            timestamp,
            size,
        })
    }

    /// Path to archive on local file system.
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Moment archive was packed.
    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    /// Size of archive in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Name of the release this archive unpacks into.
    pub fn release_name(&self) -> String {
        // INVARIANT: Archive paths always carry a UTF-8 file name.
        release_name(&self.path).unwrap_or_default()
    }
}

/// Determine release name of archive at path.
///
/// The release name is the archive's file name cut at its first `.`, so
/// `versions/web_static_20240101120000.tgz` becomes
/// `web_static_20240101120000`. Returns [`None`] if the path has no file name,
/// or the file name is not valid UTF-8.
pub fn release_name(path: impl AsRef<Path>) -> Option<String> {
    let file_name = path.as_ref().file_name()?.to_str()?;
    let stem = file_name.split('.').next().unwrap_or(file_name);
    if stem.is_empty() {
        return None;
    }

    Some(stem.to_string())
}

/// Format archive file name for prefix and timestamp.
pub fn archive_name(prefix: &str, timestamp: NaiveDateTime) -> String {
    format!(
        "{prefix}_{}.{ARCHIVE_EXTENSION}",
        timestamp.format(TIMESTAMP_FORMAT)
    )
}

/// Parse timestamp out of archive file name for prefix.
///
/// Returns [`None`] if the name does not follow the archive naming layout.
pub fn parse_archive_name(file_name: &str, prefix: &str) -> Option<NaiveDateTime> {
    let stamp = file_name
        .strip_prefix(prefix)?
        .strip_prefix('_')?
        .strip_suffix(ARCHIVE_EXTENSION)?
        .strip_suffix('.')?;

    // INVARIANT: Exactly fourteen digits, so chrono does not accept shorter
    // fields that happen to parse.
    if stamp.len() != 14 || !stamp.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }

    NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()
}

/// Archive packer.
///
/// Packs a directory into a timestamped archive inside of a versions
/// directory.
#[derive(Debug, Clone)]
pub struct Packer {
    versions_dir: PathBuf,
    prefix: String,
    exclude: Vec<String>,
}

impl Packer {
    /// Construct new packer that stores archives in versions directory under
    /// prefix.
    pub fn new(versions_dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            versions_dir: versions_dir.into(),
            prefix: prefix.into(),
            exclude: Vec::new(),
        }
    }

    /// Construct packer from pack settings of deployment configuration.
    pub fn from_settings(settings: &PackSettings) -> Self {
        Self::new(&settings.versions_dir, &settings.archive_prefix)
            .with_exclude(settings.exclude.iter().flatten())
    }

    /// Leave content matching exclusion rules out of archives.
    pub fn with_exclude(mut self, rules: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.exclude.extend(rules.into_iter().map(Into::into));
        self
    }

    /// Directory archives are stored in.
    pub fn versions_dir(&self) -> &Path {
        self.versions_dir.as_path()
    }

    /// File name prefix of archives.
    pub fn prefix(&self) -> &str {
        self.prefix.as_str()
    }

    /// Path of archive packed at timestamp.
    pub fn archive_path(&self, timestamp: NaiveDateTime) -> PathBuf {
        self.versions_dir
            .join(archive_name(&self.prefix, timestamp))
    }

    /// Pack source directory using current local time.
    ///
    /// # Errors
    ///
    /// See [`Packer::pack_at`].
    pub fn pack(&self, source_dir: impl AsRef<Path>) -> Result<Archive> {
        self.pack_at(source_dir, Local::now().naive_local())
    }

    /// Pack source directory as if packed at given timestamp.
    ///
    /// Creates the versions directory if it does not exist yet. The source
    /// directory keeps its own name as the top-level entry of the archive.
    /// An existing archive with the same timestamp is overwritten.
    ///
    /// # Errors
    ///
    /// - Return [`PackError::SourceMissing`] if source directory does not
    ///   exist. Nothing is created on disk in this case.
    /// - Return [`PackError::InvalidExclude`] if exclusion rules are invalid.
    /// - Return [`PackError::VersionsDir`] if versions directory cannot be
    ///   created.
    /// - Return [`PackError::Compression`] if tarball cannot be written. The
    ///   partially written archive is removed.
    #[instrument(skip(self, source_dir), level = "debug")]
    pub fn pack_at(&self, source_dir: impl AsRef<Path>, timestamp: NaiveDateTime) -> Result<Archive> {
        let source_dir = source_dir.as_ref();
        if !source_dir.is_dir() {
            return Err(PackError::SourceMissing {
                path: source_dir.to_path_buf(),
            });
        }

        let exclude = ExcludeRules::new(source_dir, &self.exclude)?;
        let top_level = top_level_name(source_dir)?;

        fs::create_dir_all(&self.versions_dir).map_err(|err| PackError::VersionsDir {
            source: err,
            path: self.versions_dir.clone(),
        })?;

        let path = self.archive_path(timestamp);
        if path.exists() {
            warn!("overwrite existing archive {:?}", path.display());
        }

        info!("packing {:?} to {:?}", source_dir.display(), path.display());
        let skip = fs::canonicalize(&self.versions_dir).ok();
        if let Err(err) = write_tarball(&path, source_dir, &top_level, &exclude, skip.as_deref()) {
            // INVARIANT: Never leave half written archives behind.
            fs::remove_file(&path).ok();
            return Err(PackError::Compression { source: err, path });
        }

        let archive = Archive::open(path, &self.prefix)?;
        info!(
            "{} packed: {} -> {}Bytes",
            top_level,
            archive.path().display(),
            archive.size()
        );

        Ok(archive)
    }
}

impl Default for Packer {
    fn default() -> Self {
        Self::from_settings(&PackSettings::default())
    }
}

/// Pack source directory into default versions directory with default prefix.
///
/// # Errors
///
/// See [`Packer::pack_at`].
pub fn pack(source_dir: impl AsRef<Path>) -> Result<Archive> {
    Packer::default().pack(source_dir)
}

/// List all archives in versions directory for prefix, oldest first.
///
/// Files that do not follow archive naming layout are skipped. A missing
/// versions directory has no archives.
///
/// # Errors
///
/// - Return [`PackError::Inspect`] if versions directory cannot be read.
pub fn list_archives(versions_dir: impl AsRef<Path>, prefix: &str) -> Result<Vec<Archive>> {
    let versions_dir = versions_dir.as_ref();
    if !versions_dir.exists() {
        return Ok(Vec::new());
    }

    let inspect = |err| PackError::Inspect {
        source: err,
        path: versions_dir.to_path_buf(),
    };

    let mut archives = Vec::new();
    for entry in fs::read_dir(versions_dir).map_err(inspect)? {
        let entry = entry.map_err(inspect)?;
        if !entry.file_type().map_err(inspect)?.is_file() {
            continue;
        }

        match Archive::open(entry.path(), prefix) {
            Ok(archive) => archives.push(archive),
            Err(PackError::InvalidName { path }) => {
                debug!("skip non-archive {:?}", path.display());
            }
            Err(err) => return Err(err),
        }
    }

    archives.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.path.cmp(&b.path)));

    Ok(archives)
}

/// Find newest archive in versions directory for prefix.
///
/// # Errors
///
/// - Return [`PackError::Inspect`] if versions directory cannot be read.
pub fn latest_archive(versions_dir: impl AsRef<Path>, prefix: &str) -> Result<Option<Archive>> {
    Ok(list_archives(versions_dir, prefix)?.pop())
}

/// Read name of the top-level directory that archive at path unpacks into.
///
/// Returns [`None`] if the archive holds no entries, or its first entry sits
/// at the top level without a directory around it.
///
/// # Errors
///
/// - Return [`std::io::Error`] if archive cannot be read as a gzip compressed
///   tarball.
pub fn top_level_entry(path: impl AsRef<Path>) -> std::io::Result<Option<String>> {
    let file = File::open(path.as_ref())?;
    let mut tarball = tar::Archive::new(GzDecoder::new(file));
    let mut entries = tarball.entries()?;
    let Some(entry) = entries.next() else {
        return Ok(None);
    };

    let entry = entry?;
    let entry_path = entry.path()?;
    let mut components = entry_path.components().filter_map(|component| match component {
        Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
        _ => None,
    });
    let first = components.next();

    // INVARIANT: A lone file at the top level is not a content directory.
    if first.is_some() && components.next().is_none() && !entry.header().entry_type().is_dir() {
        return Ok(None);
    }

    Ok(first)
}

// Keep the name the source directory was given, even when it is a link.
fn top_level_name(source_dir: &Path) -> Result<String> {
    let inspect = |err| PackError::Inspect {
        source: err,
        path: source_dir.to_path_buf(),
    };
    let mut resolved = std::path::absolute(source_dir).map_err(inspect)?;
    if resolved.file_name().is_none() {
        resolved = fs::canonicalize(source_dir).map_err(inspect)?;
    }

    resolved
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| PackError::SourceMissing {
            path: source_dir.to_path_buf(),
        })
}

fn write_tarball(
    path: &Path,
    source_dir: &Path,
    top_level: &str,
    exclude: &ExcludeRules,
    skip: Option<&Path>,
) -> std::io::Result<()> {
    let file = File::create(path)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);

    builder.append_dir(top_level, source_dir)?;
    append_tree(&mut builder, source_dir, Path::new(top_level), exclude, skip)?;

    let encoder = builder.into_inner()?;
    let file = encoder.finish()?;
    file.sync_all()?;

    Ok(())
}

// Walk depth first in sorted order so archives of identical trees list their
// entries identically.
fn append_tree<W: std::io::Write>(
    builder: &mut tar::Builder<W>,
    disk_dir: &Path,
    archive_dir: &Path,
    exclude: &ExcludeRules,
    skip: Option<&Path>,
) -> std::io::Result<()> {
    let mut entries = fs::read_dir(disk_dir)?.collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let disk_path = entry.path();
        let archive_path = archive_dir.join(entry.file_name());
        // INVARIANT: Links are stored as links, never followed.
        let is_dir = entry.file_type()?.is_dir();

        if exclude.is_excluded(&disk_path, is_dir) {
            debug!("exclude {:?}", disk_path.display());
            continue;
        }

        // INVARIANT: Never pack the versions directory into itself.
        if is_dir && skip.is_some() && fs::canonicalize(&disk_path).ok().as_deref() == skip {
            debug!("skip versions directory {:?}", disk_path.display());
            continue;
        }

        if is_dir {
            builder.append_dir(&archive_path, &disk_path)?;
            append_tree(builder, &disk_path, &archive_path, exclude, skip)?;
        } else {
            builder.append_path_with_name(&disk_path, &archive_path)?;
        }
    }

    Ok(())
}

/// Archive packing error types.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    /// Source directory to pack does not exist.
    #[error("source directory {:?} does not exist", path.display())]
    SourceMissing { path: PathBuf },

    /// Exclusion rules are not valid gitignore syntax.
    #[error(transparent)]
    InvalidExclude(#[from] ignore::Error),

    /// Versions directory cannot be created.
    #[error("failed to create versions directory {:?}", path.display())]
    VersionsDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Tarball cannot be written.
    #[error("failed to write archive {:?}", path.display())]
    Compression {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// File name does not follow archive naming layout.
    #[error("{:?} is not a webdeploy archive", path.display())]
    InvalidName { path: PathBuf },

    /// File system metadata cannot be read.
    #[error("failed to inspect {:?}", path.display())]
    Inspect {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = PackError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;
    use std::io::Read;

    fn at(hour: u32, min: u32, sec: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|date| date.and_hms_opt(hour, min, sec))
            .unwrap()
    }

    fn site(root: &Path) -> PathBuf {
        let source = root.join("web_static");
        fs::create_dir_all(source.join("styles")).unwrap();
        fs::write(source.join("index.html"), "hello").unwrap();
        fs::write(source.join("styles/main.css"), "body {}").unwrap();
        fs::write(source.join("styles/main.css.swp"), "junk").unwrap();
        source
    }

    fn entries(path: &Path) -> Vec<(String, String)> {
        let mut tarball = tar::Archive::new(GzDecoder::new(File::open(path).unwrap()));
        let mut entries = Vec::new();
        for entry in tarball.entries().unwrap() {
            let mut entry = entry.unwrap();
            let name = entry.path().unwrap().to_string_lossy().into_owned();
            let mut data = String::new();
            entry.read_to_string(&mut data).unwrap();
            entries.push((name.trim_end_matches('/').to_string(), data));
        }
        entries
    }

    #[test_case("web_static_20240101120000.tgz", "web_static", Some(at(12, 0, 0)); "valid name")]
    #[test_case("web_static_20240101120000.tar.gz", "web_static", None; "wrong extension")]
    #[test_case("web_static_2024010112000.tgz", "web_static", None; "short stamp")]
    #[test_case("web_static_2024010112000a.tgz", "web_static", None; "non digit stamp")]
    #[test_case("web_static_20241301120000.tgz", "web_static", None; "impossible month")]
    #[test_case("site_20240101120000.tgz", "web_static", None; "other prefix")]
    #[test]
    fn parse_archive_names(name: &str, prefix: &str, expect: Option<NaiveDateTime>) {
        pretty_assertions::assert_eq!(parse_archive_name(name, prefix), expect);
    }

    #[test_case("versions/web_static_20240101120000.tgz", Some("web_static_20240101120000"); "archive path")]
    #[test_case("/tmp/site.v2.tar.gz", Some("site"); "cut at first dot")]
    #[test_case("plain", Some("plain"); "no extension")]
    #[test_case(".hidden", None; "empty stem")]
    #[test]
    fn release_names(path: &str, expect: Option<&str>) {
        pretty_assertions::assert_eq!(release_name(path).as_deref(), expect);
    }

    #[test]
    fn archive_name_layout() {
        assert_eq!(
            archive_name("web_static", at(12, 0, 0)),
            "web_static_20240101120000.tgz"
        );
    }

    #[test]
    fn pack_source_directory() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let source = site(root.path());
        let packer = Packer::new(root.path().join("versions"), "web_static");

        let archive = packer.pack_at(&source, at(12, 0, 0))?;
        assert_eq!(
            archive.path(),
            root.path().join("versions/web_static_20240101120000.tgz")
        );
        assert_eq!(archive.timestamp(), at(12, 0, 0));
        assert_eq!(archive.release_name(), "web_static_20240101120000");
        assert!(archive.size() > 0);
        assert_eq!(archive.size(), fs::metadata(archive.path())?.len());

        let result = entries(archive.path());
        let expect = vec![
            ("web_static".to_string(), String::new()),
            ("web_static/index.html".to_string(), "hello".to_string()),
            ("web_static/styles".to_string(), String::new()),
            ("web_static/styles/main.css".to_string(), "body {}".to_string()),
            ("web_static/styles/main.css.swp".to_string(), "junk".to_string()),
        ];
        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn pack_with_exclusion_rules() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let source = site(root.path());
        let packer =
            Packer::new(root.path().join("versions"), "web_static").with_exclude(["*.swp"]);

        let archive = packer.pack_at(&source, at(12, 0, 0))?;
        let names = entries(archive.path())
            .into_iter()
            .map(|(name, _)| name)
            .collect::<Vec<_>>();
        assert!(!names.contains(&"web_static/styles/main.css.swp".to_string()));
        assert!(names.contains(&"web_static/styles/main.css".to_string()));

        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn pack_keeps_symlinks_as_links() -> anyhow::Result<()> {
        use std::os::unix::fs::symlink;

        let root = tempfile::tempdir()?;
        let source = site(root.path());
        symlink(".", source.join("self"))?;
        symlink("index.html", source.join("home.html"))?;
        symlink("styles", source.join("css"))?;

        let archive = Packer::new(root.path().join("versions"), "web_static")
            .pack_at(&source, at(12, 0, 0))?;

        let mut tarball = tar::Archive::new(GzDecoder::new(File::open(archive.path())?));
        let mut links = Vec::new();
        let mut names = Vec::new();
        for entry in tarball.entries()? {
            let entry = entry?;
            let name = entry.path()?.to_string_lossy().into_owned();
            if entry.header().entry_type().is_symlink() {
                let target = entry.link_name()?.unwrap_or_default();
                links.push((name.clone(), target.to_string_lossy().into_owned()));
            }
            names.push(name);
        }

        let expect = vec![
            ("web_static/css".to_string(), "styles".to_string()),
            ("web_static/home.html".to_string(), "index.html".to_string()),
            ("web_static/self".to_string(), ".".to_string()),
        ];
        assert_eq!(links, expect);
        assert!(!names.iter().any(|name| name.starts_with("web_static/self/")));
        assert!(!names.iter().any(|name| name.starts_with("web_static/css/")));

        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn pack_linked_source_keeps_its_name() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let real = root.path().join("site");
        fs::create_dir_all(&real)?;
        fs::write(real.join("index.html"), "hello")?;
        let source = root.path().join("web_static");
        std::os::unix::fs::symlink(&real, &source)?;

        let archive = Packer::new(root.path().join("versions"), "web_static")
            .pack_at(&source, at(12, 0, 0))?;
        assert_eq!(top_level_entry(archive.path())?.as_deref(), Some("web_static"));

        let names = entries(archive.path())
            .into_iter()
            .map(|(name, _)| name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["web_static", "web_static/index.html"]);

        Ok(())
    }

    #[test]
    fn pack_missing_source_creates_nothing() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let versions = root.path().join("versions");
        let packer = Packer::new(&versions, "web_static");

        let result = packer.pack_at(root.path().join("web_static"), at(12, 0, 0));
        assert!(matches!(result, Err(PackError::SourceMissing { .. })));
        assert!(!versions.exists());

        Ok(())
    }

    #[test]
    fn pack_twice_in_same_second_overwrites() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let source = site(root.path());
        let packer = Packer::new(root.path().join("versions"), "web_static");

        let first = packer.pack_at(&source, at(12, 0, 0))?;
        fs::write(source.join("index.html"), "hello again")?;
        let second = packer.pack_at(&source, at(12, 0, 0))?;
        assert_eq!(first.path(), second.path());
        assert_eq!(list_archives(packer.versions_dir(), "web_static")?.len(), 1);

        let index = entries(second.path())
            .into_iter()
            .find(|(name, _)| name == "web_static/index.html")
            .map(|(_, data)| data);
        assert_eq!(index.as_deref(), Some("hello again"));

        Ok(())
    }

    #[test]
    fn pack_skips_versions_directory_inside_source() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let source = site(root.path());
        let packer = Packer::new(source.join("versions"), "web_static");

        packer.pack_at(&source, at(12, 0, 0))?;
        let archive = packer.pack_at(&source, at(12, 0, 1))?;
        let names = entries(archive.path())
            .into_iter()
            .map(|(name, _)| name)
            .collect::<Vec<_>>();
        assert!(!names.iter().any(|name| name.starts_with("web_static/versions")));

        Ok(())
    }

    #[test]
    fn list_archives_oldest_first() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let source = site(root.path());
        let packer = Packer::new(root.path().join("versions"), "web_static");

        packer.pack_at(&source, at(12, 0, 5))?;
        packer.pack_at(&source, at(9, 30, 0))?;
        packer.pack_at(&source, at(12, 0, 0))?;
        fs::write(packer.versions_dir().join("notes.txt"), "not an archive")?;

        let result = list_archives(packer.versions_dir(), "web_static")?
            .into_iter()
            .map(|archive| archive.timestamp())
            .collect::<Vec<_>>();
        assert_eq!(result, vec![at(9, 30, 0), at(12, 0, 0), at(12, 0, 5)]);

        let latest = latest_archive(packer.versions_dir(), "web_static")?;
        assert_eq!(latest.map(|archive| archive.timestamp()), Some(at(12, 0, 5)));

        Ok(())
    }

    #[test]
    fn top_level_entry_of_packed_archive() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let source = site(root.path());
        let packer = Packer::new(root.path().join("versions"), "web_static");

        let archive = packer.pack_at(&source, at(12, 0, 0))?;
        assert_eq!(top_level_entry(archive.path())?.as_deref(), Some("web_static"));

        Ok(())
    }

    #[test]
    fn list_archives_in_missing_directory() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        assert!(list_archives(root.path().join("versions"), "web_static")?.is_empty());
        Ok(())
    }
}
