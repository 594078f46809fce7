//! Mutable state shared by one output context and the records it produces.
//!
//! Every lock here is held for a single map operation: template rendering
//! re-enters this state (a page's template reading `page.html` renders the
//! body, which may load further contents), and `parking_lot` mutexes are not
//! reentrant.

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;
use std::sync::Arc;

use super::BuildError;
use super::html::HtmlInfo;
use crate::content::{Content, ContentPath};

#[derive(Debug)]
pub struct ContextState {
    contentpath: ContentPath,
    depends: Mutex<BTreeSet<ContentPath>>,
    html_cache: Mutex<FxHashMap<ContentPath, Arc<HtmlInfo>>>,
    /// Contents whose html is being rendered right now.
    rendering: Mutex<FxHashSet<ContentPath>>,
    /// First error raised where it could not be returned (template
    /// attribute access), re-raised by the enclosing evaluation.
    error: Mutex<Option<BuildError>>,
}

impl ContextState {
    pub fn new(contentpath: ContentPath) -> Self {
        Self {
            contentpath,
            depends: Mutex::default(),
            html_cache: Mutex::default(),
            rendering: Mutex::default(),
            error: Mutex::new(None),
        }
    }

    /// The content this context renders.
    pub fn contentpath(&self) -> &ContentPath {
        &self.contentpath
    }

    /// Record `content` as an input of this context's outputs.
    ///
    /// Takes a loaded `Content` so only members of the site's content set
    /// are ever recorded.
    pub fn add_depend(&self, content: &Content) {
        self.depends.lock().insert(content.src.contentpath().clone());
    }

    /// Recorded dependencies, sorted.
    pub fn depends(&self) -> Vec<ContentPath> {
        self.depends.lock().iter().cloned().collect()
    }

    pub fn get_html_cache(&self, path: &ContentPath) -> Option<Arc<HtmlInfo>> {
        self.html_cache.lock().get(path).cloned()
    }

    pub fn set_html_cache(&self, path: ContentPath, info: Arc<HtmlInfo>) {
        self.html_cache.lock().insert(path, info);
    }

    /// Mark `path` as being rendered; `false` if it already is.
    pub(crate) fn begin_html(&self, path: &ContentPath) -> bool {
        self.rendering.lock().insert(path.clone())
    }

    pub(crate) fn end_html(&self, path: &ContentPath) {
        self.rendering.lock().remove(path);
    }

    /// Keep `err` for the enclosing evaluation. Only the first is kept.
    pub(crate) fn stash_error(&self, err: BuildError) {
        let mut slot = self.error.lock();
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    pub(crate) fn take_error(&self) -> Option<BuildError> {
        self.error.lock().take()
    }
}
