// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Exclusion rule handling.
//!
//! Content that should never ship, e.g., editor swap files or version control
//! metadata, can be left out of an archive through __exclusion rules__. An
//! exclusion rule uses gitignore syntax, and is matched relative to the root of
//! the directory being packed. Unlike a real gitignore file, exclusion rules
//! come from the deployment configuration rather than from files inside of the
//! packed directory.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;

/// Compiled set of exclusion rules.
#[derive(Clone, Debug)]
pub struct ExcludeRules {
    matcher: Gitignore,
}

impl ExcludeRules {
    /// Compile exclusion rules relative to root of directory being packed.
    ///
    /// # Errors
    ///
    /// - Return [`ignore::Error`] if any rule is not valid gitignore syntax.
    pub fn new(
        root: impl AsRef<Path>,
        rules: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> Result<Self, ignore::Error> {
        let mut builder = GitignoreBuilder::new(root.as_ref());
        for rule in rules {
            builder.add_line(None, rule.as_ref())?;
        }

        Ok(Self {
            matcher: builder.build()?,
        })
    }

    /// Check if path should be left out of archive.
    ///
    /// Path must be located under the root the rules were compiled against.
    /// A path is excluded if it or any of its parents match a rule.
    pub fn is_excluded(&self, path: impl AsRef<Path>, is_dir: bool) -> bool {
        self.matcher
            .matched_path_or_any_parents(path.as_ref(), is_dir)
            .is_ignore()
    }
}
