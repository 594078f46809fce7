//! One artifact queued for writing.

use std::fs::{self, File, FileTimes, Permissions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use super::{OutputError, prepare_output_path};
use crate::content::ContentPath;
use crate::context::ContextState;

/// What gets written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// In-memory bytes (rendered text, package resources).
    Bytes(Vec<u8>),
    /// Byte-for-byte copy of a file on disk. No metadata is carried over.
    Copy(PathBuf),
}

impl Payload {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Bytes(text.into().into_bytes())
    }
}

/// Filesystem metadata snapshot re-applied after writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    pub modified: Option<SystemTime>,
    pub accessed: Option<SystemTime>,
    pub permissions: Permissions,
}

impl FileStat {
    pub fn from_metadata(meta: &fs::Metadata) -> Self {
        Self {
            modified: meta.modified().ok(),
            accessed: meta.accessed().ok(),
            permissions: meta.permissions(),
        }
    }

    pub fn read(path: &Path) -> io::Result<Self> {
        fs::metadata(path).map(|meta| Self::from_metadata(&meta))
    }

    /// Apply timestamps, then permissions (a read-only mode would block the
    /// timestamp update).
    pub fn restore(&self, path: &Path) -> io::Result<()> {
        let mut times = FileTimes::new();
        if let Some(modified) = self.modified {
            times = times.set_modified(modified);
        }
        if let Some(accessed) = self.accessed {
            times = times.set_accessed(accessed);
        }
        File::options().write(true).open(path)?.set_times(times)?;
        fs::set_permissions(path, self.permissions.clone())
    }
}

/// An output file: destination, payload, optional stat, and the state of
/// the context that produced it.
///
/// Two outputs with the same `(directory, filename)` are the same file.
#[derive(Debug)]
pub struct Output {
    directory: Vec<String>,
    filename: String,
    payload: Payload,
    stat: Option<FileStat>,
    context: Arc<ContextState>,
}

impl Output {
    pub fn new(
        directory: Vec<String>,
        filename: impl Into<String>,
        payload: Payload,
        context: Arc<ContextState>,
    ) -> Self {
        Self {
            directory,
            filename: filename.into(),
            payload,
            stat: None,
            context,
        }
    }

    /// Output mirroring a content item's own location.
    pub fn at(path: &ContentPath, payload: Payload, context: Arc<ContextState>) -> Self {
        Self::new(path.dirs().to_vec(), path.filename(), payload, context)
    }

    pub fn with_stat(mut self, stat: Option<FileStat>) -> Self {
        self.stat = stat;
        self
    }

    pub fn directory(&self) -> &[String] {
        &self.directory
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn stat(&self) -> Option<&FileStat> {
        self.stat.as_ref()
    }

    pub fn context(&self) -> &Arc<ContextState> {
        &self.context
    }

    pub(super) fn key(&self) -> (Vec<String>, String) {
        (self.directory.clone(), self.filename.clone())
    }

    /// Write below `root`, returning the absolute destination.
    pub fn write(&self, root: &Path) -> Result<PathBuf, OutputError> {
        let dest = prepare_output_path(root, &self.directory, &self.filename)?;

        match &self.payload {
            Payload::Bytes(bytes) => fs::write(&dest, bytes).map_err(|e| OutputError::io(&dest, e))?,
            Payload::Copy(src) => copy_bytes(src, &dest)?,
        }

        if let Some(stat) = &self.stat {
            stat.restore(&dest).map_err(|e| OutputError::io(&dest, e))?;
        }

        Ok(dest)
    }
}

/// `fs::copy` also copies permission bits; only the bytes are wanted here.
fn copy_bytes(src: &Path, dest: &Path) -> Result<(), OutputError> {
    let mut reader = File::open(src).map_err(|e| OutputError::io(src, e))?;
    let mut writer = File::create(dest).map_err(|e| OutputError::io(dest, e))?;
    io::copy(&mut reader, &mut writer).map_err(|e| OutputError::io(dest, e))?;
    Ok(())
}
