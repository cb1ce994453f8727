// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

mod integration;

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

/// Tree of static content laid out on disk.
pub(crate) struct SiteFixture {
    root: PathBuf,
}

impl SiteFixture {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub(crate) fn write(&self, path: impl AsRef<Path>, contents: impl AsRef<str>) -> Result<()> {
        let path = self.root.join(path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, contents.as_ref())?;
        Ok(())
    }

    pub(crate) fn path(&self) -> &Path {
        self.root.as_path()
    }
}

/// Map every file under directory to its contents, keyed by relative path.
pub(crate) fn read_tree(root: impl AsRef<Path>) -> Result<BTreeMap<PathBuf, String>> {
    let mut tree = BTreeMap::new();
    let mut pending = vec![root.as_ref().to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else {
                let relative = path.strip_prefix(root.as_ref())?.to_path_buf();
                tree.insert(relative, fs::read_to_string(&path)?);
            }
        }
    }

    Ok(tree)
}

pub(crate) fn timestamp(day: u32, hour: u32, min: u32, sec: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .and_then(|date| date.and_hms_opt(hour, min, sec))
        .unwrap()
}
