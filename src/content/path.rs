//! Content identity: directory segments plus a filename.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A malformed `ContentPath` (empty filename, separator inside a segment).
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid content path `{0}`")]
pub struct InvalidContentPath(pub String);

/// Identity of one content item.
///
/// Ordered by directory segments first, then filename, which keeps
/// `BTreeMap<ContentPath, _>` iteration grouped by directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentPath {
    dirs: Vec<String>,
    filename: String,
}

fn has_separator(s: &str) -> bool {
    s.contains(['/', '\\'])
}

impl ContentPath {
    /// Build a content path, validating every component.
    pub fn new<I, S>(dirs: I, filename: impl Into<String>) -> Result<Self, InvalidContentPath>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let dirs: Vec<String> = dirs.into_iter().map(Into::into).collect();
        let filename = filename.into();

        let bad_dir = dirs.iter().any(|d| d.is_empty() || has_separator(d));
        if filename.is_empty() || has_separator(&filename) || bad_dir {
            let mut shown = dirs.join("/");
            shown.push('/');
            shown.push_str(&filename);
            return Err(InvalidContentPath(shown));
        }

        Ok(Self { dirs, filename })
    }

    /// Parse a `/`-separated path such as `"blog/2024/post.html"`.
    pub fn parse(s: &str) -> Result<Self, InvalidContentPath> {
        let trimmed = s.trim_matches('/');
        let mut parts: Vec<&str> = trimmed.split('/').collect();
        let filename = parts.pop().unwrap_or_default();
        Self::new(parts, filename).map_err(|_| InvalidContentPath(s.to_string()))
    }

    /// Derive a content path from a file below `base`.
    pub fn from_relative(base: &Path, file: &Path) -> Result<Self, InvalidContentPath> {
        let shown = || InvalidContentPath(file.display().to_string());
        let rel = file.strip_prefix(base).map_err(|_| shown())?;

        let mut parts: Vec<String> = Vec::new();
        for component in rel.components() {
            let part = component.as_os_str().to_str().ok_or_else(shown)?;
            parts.push(part.to_string());
        }
        let filename = parts.pop().ok_or_else(shown)?;
        Self::new(parts, filename)
    }

    pub fn dirs(&self) -> &[String] {
        &self.dirs
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Filename without its final extension.
    pub fn stem(&self) -> &str {
        match self.filename.rfind('.') {
            Some(0) | None => &self.filename,
            Some(pos) => &self.filename[..pos],
        }
    }

    /// Filename extension, lowercased.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
    }

    /// Whether this item lives at or below `dirs`.
    pub fn is_under(&self, dirs: &[String]) -> bool {
        self.dirs.starts_with(dirs)
    }

    /// Same directory, different filename.
    pub fn with_filename(&self, filename: impl Into<String>) -> Result<Self, InvalidContentPath> {
        Self::new(self.dirs.clone(), filename)
    }

    /// Relative filesystem form (`dir/dir/file`).
    pub fn to_path_buf(&self) -> PathBuf {
        let mut path: PathBuf = self.dirs.iter().collect();
        path.push(&self.filename);
        path
    }
}

impl fmt::Display for ContentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for dir in &self.dirs {
            write!(f, "{dir}/")?;
        }
        f.write_str(&self.filename)
    }
}
