#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Concrete `.dupeignore` glob parser (C7's external collaborator).
//!
//! `.dupeignore` uses gitignore syntax: one glob per line, blank lines and
//! `#` comment lines skipped, `!` negates a prior match. This crate just
//! hands that format to the `ignore` crate's own gitignore matcher rather
//! than reinventing glob semantics.

use dupehash_core::ignore::IgnoreFilter;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;
use tracing::warn;

/// Name of the ignore file consulted in each scanned directory's root.
pub const IGNORE_FILE_NAME: &str = ".dupeignore";

/// An `IgnoreFilter` backed by a single `.dupeignore` file found at `root`.
pub struct DupeIgnore {
    matcher: Gitignore,
}

impl DupeIgnore {
    /// Build a matcher from `root/.dupeignore`. A missing file yields a
    /// matcher that ignores nothing; a malformed one logs a warning and does
    /// the same, since a broken ignore file must never abort a scan.
    #[must_use]
    pub fn load(root: &Path) -> Self {
        let ignore_file = root.join(IGNORE_FILE_NAME);
        if !ignore_file.is_file() {
            return Self {
                matcher: Gitignore::empty(),
            };
        }

        let mut builder = GitignoreBuilder::new(root);
        if let Some(err) = builder.add(&ignore_file) {
            warn!(path = %ignore_file.display(), error = %err, "failed to parse .dupeignore; ignoring no paths");
            return Self {
                matcher: Gitignore::empty(),
            };
        }

        match builder.build() {
            Ok(matcher) => Self { matcher },
            Err(err) => {
                warn!(path = %ignore_file.display(), error = %err, "failed to compile .dupeignore; ignoring no paths");
                Self {
                    matcher: Gitignore::empty(),
                }
            }
        }
    }

    /// An ignore filter that never ignores anything, for runs with no
    /// `.dupeignore` collaborator configured at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            matcher: Gitignore::empty(),
        }
    }
}

impl IgnoreFilter for DupeIgnore {
    fn is_ignored(&self, path: &Path) -> bool {
        let is_dir = path.is_dir();
        self.matcher.matched(path, is_dir).is_ignore()
    }
}
