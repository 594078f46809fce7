//! Output writing: path resolution, output records, and the write-time
//! collection that inverts dependencies.
//!
//! # Module Structure
//!
//! ```text
//! output/
//! ├── path.rs        # prepare_output_path: containment check + mkdir retry
//! ├── record.rs      # Output, Payload, FileStat
//! └── collection.rs  # OutputCollection, DependencyMap
//! ```

mod collection;
mod path;
mod record;

pub use collection::{DependencyMap, OutputCollection};
pub use path::{output_root, prepare_output_path};
pub use record::{FileStat, Output, Payload};

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving or writing an output file.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("invalid file name `{filename}`: resolves to `{}` outside the output directory", dest.display())]
    PathEscape { filename: String, dest: PathBuf },

    #[error("failed to create directory `{}`", dir.display())]
    DirectoryCreation {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error when writing `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl OutputError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
