//! Path normalization utilities.
//!
//! Pure functions, no filesystem access:
//! - `expand_tilde` - expand a leading `~` to the home directory
//! - `normalize_path` - absolute, lexically normalized form (no symlink resolution)
//! - `resolve_path` - site-relative configuration paths

use std::path::{Component, Path, PathBuf};

/// Expand a leading `~` in `path`.
///
/// Non-UTF-8 paths are returned unchanged.
pub fn expand_tilde(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(shellexpand::tilde(s).into_owned()),
        None => path.to_path_buf(),
    }
}

/// Collapse `.` and `..` components without touching the filesystem.
///
/// `..` at the root stays at the root, `..` at the start of a relative
/// path is kept.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Normalize a path to absolute, lexically clean form.
///
/// Relative paths are joined with the current directory. Unlike
/// `canonicalize`, symlinks are not resolved and the path need not exist,
/// so the result is stable for output directories that are created later.
///
/// # Example
/// ```ignore
/// use crate::utils::path::normalize_path;
/// let abs = normalize_path(Path::new("./output/../output/blog"));
/// ```
pub fn normalize_path(path: &Path) -> PathBuf {
    let expanded = expand_tilde(path);
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir().map_or_else(|_| expanded.clone(), |cwd| cwd.join(&expanded))
    };
    normalize_lexically(&absolute)
}

/// Resolve a configured path against the site root.
///
/// Always returns an absolute path. `~` is expanded first, then relative
/// paths are taken relative to `root`.
pub fn resolve_path(path: &Path, root: &Path) -> PathBuf {
    let expanded = expand_tilde(path);
    if expanded.is_absolute() {
        return normalize_lexically(&expanded);
    }
    normalize_path(&root.join(expanded))
}

/// Join path components with `/` regardless of platform.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
