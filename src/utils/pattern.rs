//! Filename patterns for `build.ignores`.
//!
//! Glob syntax (`*`, `?`, `[abc]`, `{a,b}`) matched against the file name
//! only.

use globset::{Glob, GlobSet, GlobSetBuilder};

/// Compiled set of ignore patterns.
#[derive(Debug)]
pub struct IgnoreSet {
    patterns: GlobSet,
}

impl Default for IgnoreSet {
    fn default() -> Self {
        Self {
            patterns: GlobSet::empty(),
        }
    }
}

/// Filenames skipped regardless of configuration.
const IGNORED_FILE_NAME: &[&str] = &[".DS_Store", "Thumbs.db"];

impl IgnoreSet {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, globset::Error> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            builder.add(Glob::new(pattern.as_ref())?);
        }
        Ok(Self {
            patterns: builder.build()?,
        })
    }

    /// Whether `name` should be skipped. Dotfiles are always skipped.
    pub fn is_ignored(&self, name: &str) -> bool {
        name.starts_with('.') || IGNORED_FILE_NAME.contains(&name) || self.patterns.is_match(name)
    }
}
