//! Output path resolution.
//!
//! Turns `(directory segments, filename)` into an absolute destination below
//! the output root, creates the parent directory, and clears whatever file
//! occupied the destination.
//!
//! Directory creation retries with jitter: several build processes (or a
//! build racing a dev server) may create the same tree at the same time.

use std::fs;
use std::io;
use std::path::{Path, PathBuf, is_separator};
use std::thread;
use std::time::Duration;

use super::OutputError;
use crate::debug;
use crate::utils::path::{expand_tilde, normalize_lexically, normalize_path};

/// Attempts at creating a parent directory before giving up.
const MKDIR_MAX_RETRY: usize = 5;

/// Upper bound of the randomized pause between attempts, in seconds.
const MKDIR_WAIT: f64 = 0.1;

/// Absolute, normalized form of an output root.
///
/// Every destination is checked against this form, so callers comparing
/// written paths to the root should use it too.
pub fn output_root(root: &Path) -> PathBuf {
    normalize_path(root)
}

/// Resolve and prepare the destination for one output file.
///
/// Fails with [`OutputError::PathEscape`] when the result would land outside
/// `root` (traversal through `..`, absolute filenames); nothing is created in
/// that case.
pub fn prepare_output_path<S: AsRef<str>>(
    root: &Path,
    directory: &[S],
    filename: &str,
) -> Result<PathBuf, OutputError> {
    let root = output_root(root);
    let dest = resolve_destination(&root, directory, filename)?;

    if let Some(dir) = dest.parent() {
        ensure_dir(dir)?;
    }
    remove_existing(&dest)?;

    Ok(dest)
}

fn resolve_destination<S: AsRef<str>>(
    root: &Path,
    directory: &[S],
    filename: &str,
) -> Result<PathBuf, OutputError> {
    let escape = |dest: PathBuf| OutputError::PathEscape {
        filename: filename.to_string(),
        dest,
    };

    if is_absolute_name(filename) {
        return Err(escape(PathBuf::from(filename)));
    }
    let name = filename.trim_matches(['/', '\\']);
    if name.is_empty() {
        return Err(escape(root.to_path_buf()));
    }

    let mut dest = root.to_path_buf();
    dest.extend(directory.iter().map(AsRef::as_ref));
    dest.push(name);
    let dest = normalize_lexically(&expand_tilde(&dest));

    if is_inside(root, &dest) {
        Ok(dest)
    } else {
        Err(escape(dest))
    }
}

/// `/x`, `\x`, anything the platform itself calls absolute, and on Windows
/// drive-relative names like `C:x`.
fn is_absolute_name(name: &str) -> bool {
    name.starts_with(['/', '\\']) || has_drive_prefix(name) || Path::new(name).is_absolute()
}

fn has_drive_prefix(name: &str) -> bool {
    let bytes = name.as_bytes();
    cfg!(windows) && bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// String-prefix containment: `dest` starts with `root` and the next
/// character is a separator.
fn is_inside(root: &Path, dest: &Path) -> bool {
    let root = root.to_string_lossy();
    let dest = dest.to_string_lossy();

    let Some(rest) = dest.strip_prefix(root.as_ref()) else {
        return false;
    };
    if root.ends_with(is_separator) {
        return !rest.is_empty();
    }
    rest.chars().next().is_some_and(is_separator) && rest.len() > 1
}

fn ensure_dir(dir: &Path) -> Result<(), OutputError> {
    let mut last_error = None;

    for attempt in 1..=MKDIR_MAX_RETRY {
        if dir.is_dir() {
            return Ok(());
        }
        if let Err(err) = fs::create_dir_all(dir) {
            debug!("write"; "mkdir {} failed ({}/{}): {}", dir.display(), attempt, MKDIR_MAX_RETRY, err);
            last_error = Some(err);
            thread::sleep(Duration::from_secs_f64(MKDIR_WAIT * rand::random::<f64>()));
        }
    }

    if dir.is_dir() {
        return Ok(());
    }
    Err(OutputError::DirectoryCreation {
        dir: dir.to_path_buf(),
        source: last_error.unwrap_or_else(|| io::Error::other("not a directory")),
    })
}

/// Drop a stale file or symlink so its permissions or target do not leak
/// into the new output.
fn remove_existing(dest: &Path) -> Result<(), OutputError> {
    match fs::symlink_metadata(dest) {
        Ok(meta) if meta.is_dir() => Err(OutputError::io(
            dest,
            io::Error::other("destination is a directory"),
        )),
        Ok(_) => fs::remove_file(dest).map_err(|e| OutputError::io(dest, e)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(OutputError::io(dest, e)),
    }
}
