//! Output contexts: one per content item (per page for indexes) per build.
//!
//! # Module Structure
//!
//! ```text
//! context/
//! ├── state.rs   # ContextState: depends, html_cache, stashed errors
//! ├── eval.rs    # eval_jinja, eval_jinja_template
//! ├── proxy.rs   # ContentProxy: content as a template object
//! ├── html.rs    # HtmlInfo: rendered html + headings
//! └── error.rs   # BuildError
//! ```
//!
//! # Lifecycle
//!
//! A context is created right before it is built and consumed by
//! [`OutputContext::render`] or [`OutputContext::build`]; building the same
//! instance twice is impossible. Its [`ContextState`] outlives it inside the
//! produced [`Output`] records so the collection can read `depends` at write
//! time.
//!
//! | Tag         | Variant   | Renders                                  |
//! |-------------|-----------|------------------------------------------|
//! | `"binary"`  | `Binary`  | body text, package bytes, or file copy   |
//! | `"article"` | `Article` | `article_template` with the page vars    |
//! | `"index"`   | `Index`   | nothing yet (one context per page)       |

mod error;
mod eval;
mod html;
mod proxy;
mod state;

pub use error::BuildError;
pub use eval::{eval_jinja, eval_jinja_template};
pub use html::HtmlInfo;
pub use proxy::ContentProxy;
pub use state::ContextState;

use std::path::PathBuf;
use std::sync::Arc;

use crate::content::{Content, ContentPath, Origin};
use crate::output::{Output, Payload};
use crate::site::Site;

/// Builds every context a content item needs for one build.
pub type ContextCtor = fn(&Arc<Site>, &ContentPath) -> Result<Vec<OutputContext>, BuildError>;

/// Tag to constructor table.
const CONTEXTS: &[(&str, ContextCtor)] = &[
    ("binary", binary_contexts),
    ("article", article_contexts),
    ("index", index_contexts),
];

// ============================================================================
// Variants
// ============================================================================

#[derive(Debug, Clone)]
pub enum ContextKind {
    Binary,
    Article,
    Index(IndexPage),
}

impl ContextKind {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Article => "article",
            Self::Index(_) => "index",
        }
    }
}

/// One page of an index listing.
#[derive(Debug, Clone)]
pub struct IndexPage {
    /// Group values identifying this listing; empty when ungrouped.
    pub names: Vec<String>,
    /// Articles on this page.
    pub items: Vec<Arc<Content>>,
    /// 1-based.
    pub cur_page: usize,
    pub num_pages: usize,
}

// ============================================================================
// OutputContext
// ============================================================================

pub struct OutputContext {
    site: Arc<Site>,
    content: Arc<Content>,
    state: Arc<ContextState>,
    kind: ContextKind,
}

impl std::fmt::Debug for OutputContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputContext")
            .field("contentpath", self.contentpath())
            .field("kind", &self.kind.tag())
            .finish()
    }
}

impl OutputContext {
    /// Create a context for `contentpath`, resolving the content from the
    /// site's content set.
    pub fn new(site: Arc<Site>, contentpath: &ContentPath, kind: ContextKind) -> Result<Self, BuildError> {
        let content = site.files.get_content(contentpath)?;
        Ok(Self::with_content(site, content, kind))
    }

    fn with_content(site: Arc<Site>, content: Arc<Content>, kind: ContextKind) -> Self {
        let state = Arc::new(ContextState::new(content.src.contentpath().clone()));
        Self {
            site,
            content,
            state,
            kind,
        }
    }

    /// Constructor registered for `tag`.
    pub fn from_tag(tag: &str) -> Option<ContextCtor> {
        CONTEXTS.iter().find(|(name, _)| *name == tag).map(|(_, ctor)| *ctor)
    }

    pub fn site(&self) -> &Arc<Site> {
        &self.site
    }

    pub fn content(&self) -> &Arc<Content> {
        &self.content
    }

    pub fn contentpath(&self) -> &ContentPath {
        self.state.contentpath()
    }

    pub fn state(&self) -> &Arc<ContextState> {
        &self.state
    }

    pub fn kind(&self) -> &ContextKind {
        &self.kind
    }

    pub fn add_depend(&self, content: &Content) {
        self.state.add_depend(content);
    }

    /// Produce output records without touching the filesystem.
    pub fn render(self) -> Result<Vec<Output>, BuildError> {
        match self.kind {
            ContextKind::Binary => self.render_binary(),
            ContextKind::Article => self.render_article(),
            // Listing pages are an extension seam: the page carries
            // `items`/`cur_page`/`num_pages` but nothing is written and no
            // dependency is recorded.
            ContextKind::Index(_) => Ok(Vec::new()),
        }
    }

    /// Render and write. Returns the written files and the recorded
    /// dependencies (sorted).
    pub fn build(self) -> Result<(Vec<PathBuf>, Vec<ContentPath>), BuildError> {
        let outputdir = self.site.outputdir.clone();
        let state = self.state.clone();

        let files = self
            .render()?
            .iter()
            .map(|output| output.write(&outputdir))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((files, state.depends()))
    }

    fn render_binary(self) -> Result<Vec<Output>, BuildError> {
        let content = &self.content;
        self.state.add_depend(content);

        let payload = match (content.body(), content.src.origin()) {
            (Some(body), _) => Payload::text(body),
            (None, Origin::Package { bytes, .. }) => Payload::Bytes(bytes.to_vec()),
            (None, Origin::File(path)) => Payload::Copy(path.clone()),
        };
        let stat = self
            .site
            .config
            .build
            .preserve_stat
            .then(|| content.src.stat().cloned())
            .flatten();

        let output = Output::at(content.src.contentpath(), payload, self.state.clone()).with_stat(stat);
        Ok(vec![output])
    }

    fn render_article(self) -> Result<Vec<Output>, BuildError> {
        let ctx = Arc::new(self);
        let content = ctx.content.clone();
        ctx.add_depend(&content);

        let template = content.metadata_str(&ctx.site, "article_template")?;
        let text = eval_jinja_template(&ctx, &content, &template)?;

        let output = Output::at(content.src.contentpath(), Payload::text(text), ctx.state.clone());
        Ok(vec![output])
    }
}

// ============================================================================
// Constructors
// ============================================================================

fn binary_contexts(site: &Arc<Site>, path: &ContentPath) -> Result<Vec<OutputContext>, BuildError> {
    Ok(vec![OutputContext::new(site.clone(), path, ContextKind::Binary)?])
}

fn article_contexts(site: &Arc<Site>, path: &ContentPath) -> Result<Vec<OutputContext>, BuildError> {
    Ok(vec![OutputContext::new(site.clone(), path, ContextKind::Article)?])
}

/// One context per page of `indexpage_max_articles` articles found at or
/// below the index's directory. An empty listing still gets one page.
fn index_contexts(site: &Arc<Site>, path: &ContentPath) -> Result<Vec<OutputContext>, BuildError> {
    let content = site.files.get_content(path)?;
    let per_page = content.metadata_usize(site, "indexpage_max_articles")?.max(1);

    let items: Vec<Arc<Content>> = site.files.articles_under(path.dirs()).collect();
    let num_pages = items.len().div_ceil(per_page).max(1);

    let mut pages: Vec<Vec<Arc<Content>>> = items.chunks(per_page).map(<[_]>::to_vec).collect();
    if pages.is_empty() {
        pages.push(Vec::new());
    }

    let contexts = pages
        .into_iter()
        .enumerate()
        .map(|(i, items)| {
            let page = IndexPage {
                names: Vec::new(),
                items,
                cur_page: i + 1,
                num_pages,
            };
            OutputContext::with_content(site.clone(), content.clone(), ContextKind::Index(page))
        })
        .collect();
    Ok(contexts)
}

// ============================================================================
// Tests
// ============================================================================
