//! Build error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::content::ContentPath;
use crate::output::OutputError;

/// Errors raised while rendering or writing one output context.
///
/// None of these are retried; the build driver aborts on the first one.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to render `{identity}`")]
    TemplateResolution {
        /// Template name, or `<content>#<property>` for inline templates.
        identity: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("`{content}` has no `{key}` metadata")]
    MissingMetadata { content: String, key: String },

    #[error("`{content}`: metadata `{key}` must be {expected}")]
    InvalidMetadata {
        content: String,
        key: String,
        expected: &'static str,
    },

    #[error("unknown content `{0}`")]
    UnknownContent(ContentPath),

    #[error("`{0}` renders its own html")]
    RecursiveHtml(String),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error("IO error when reading `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
