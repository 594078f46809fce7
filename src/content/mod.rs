//! Loaded content items.
//!
//! # Module Structure
//!
//! ```text
//! content/
//! ├── path.rs    # ContentPath identity
//! ├── loader.rs  # directory walk, front matter, ContentFiles
//! └── mod.rs     # ContentSrc, Content, metadata lookup (this file)
//! ```
//!
//! # Metadata lookup
//!
//! | Order | Source                       |
//! |-------|------------------------------|
//! | 1     | front matter (`+++` TOML)    |
//! | 2     | `[defaults]` and `-D` props  |
//! | 3     | built-in defaults            |

mod loader;
mod path;

pub use loader::{ContentFiles, load_files};
pub use path::ContentPath;

use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::context::{BuildError, ContentProxy, ContextKind, HtmlInfo, OutputContext, eval_jinja};
use crate::output::FileStat;
use crate::site::Site;
use crate::config::SiteSection;
use crate::template::{Vars, from_toml_table};

/// Template used for articles without `article_template` metadata.
pub const DEFAULT_ARTICLE_TEMPLATE: &str = "page_article.html";

/// Articles per index page without `indexpage_max_articles` metadata.
pub const DEFAULT_INDEXPAGE_MAX_ARTICLES: i64 = 5;

// ============================================================================
// ContentSrc
// ============================================================================

/// Where a content item's bytes come from.
#[derive(Debug, Clone)]
pub enum Origin {
    File(PathBuf),
    /// Embedded in a compiled-in theme.
    Package { name: String, bytes: Arc<[u8]> },
}

#[derive(Debug, Clone)]
pub struct ContentSrc {
    contentpath: ContentPath,
    origin: Origin,
    stat: Option<FileStat>,
}

impl ContentSrc {
    /// A file on disk; the stat snapshot is taken now.
    pub fn file(contentpath: ContentPath, srcpath: PathBuf) -> Self {
        let stat = FileStat::read(&srcpath).ok();
        Self {
            contentpath,
            origin: Origin::File(srcpath),
            stat,
        }
    }

    pub fn embedded(contentpath: ContentPath, package: impl Into<String>, bytes: Arc<[u8]>) -> Self {
        Self {
            contentpath,
            origin: Origin::Package {
                name: package.into(),
                bytes,
            },
            stat: None,
        }
    }

    pub fn contentpath(&self) -> &ContentPath {
        &self.contentpath
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn stat(&self) -> Option<&FileStat> {
        self.stat.as_ref()
    }

    /// Package name for embedded sources.
    pub fn package(&self) -> Option<&str> {
        match &self.origin {
            Origin::Package { name, .. } => Some(name),
            Origin::File(_) => None,
        }
    }

    /// Filesystem path for sources on disk.
    pub fn srcpath(&self) -> Option<&Path> {
        match &self.origin {
            Origin::File(path) => Some(path),
            Origin::Package { .. } => None,
        }
    }

    pub fn read_bytes(&self) -> io::Result<Cow<'_, [u8]>> {
        match &self.origin {
            Origin::File(path) => fs::read(path).map(Cow::Owned),
            Origin::Package { bytes, .. } => Ok(Cow::Borrowed(&bytes[..])),
        }
    }

    /// Lossy UTF-8 text of the source.
    pub fn read_text(&self) -> io::Result<String> {
        Ok(String::from_utf8_lossy(&self.read_bytes()?).into_owned())
    }
}

// ============================================================================
// Content
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Binary,
    Article,
    Index,
}

impl ContentKind {
    /// Tag used for the `type` metadata and the context table.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Article => "article",
            Self::Index => "index",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "binary" => Some(Self::Binary),
            "article" => Some(Self::Article),
            "index" => Some(Self::Index),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Content {
    pub src: ContentSrc,
    kind: ContentKind,
    metadata: toml::Table,
    body: Option<String>,
}

impl Content {
    pub fn new(src: ContentSrc, kind: ContentKind, metadata: toml::Table, body: Option<String>) -> Self {
        Self {
            src,
            kind,
            metadata,
            body,
        }
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    /// Pre-rendered body (article source text, or a hook-supplied body).
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Front matter only, without defaults.
    pub fn metadata(&self) -> &toml::Table {
        &self.metadata
    }

    /// Diagnostic name: the source path, or `package!path` for embedded
    /// sources.
    pub fn repr_filename(&self) -> String {
        match self.src.origin() {
            Origin::File(path) => path.display().to_string(),
            Origin::Package { name, .. } => format!("{name}!{}", self.src.contentpath()),
        }
    }

    pub fn get_metadata(&self, site: &Site, key: &str) -> Option<toml::Value> {
        self.metadata
            .get(key)
            .or_else(|| site.config.defaults.get(key))
            .cloned()
            .or_else(|| self.builtin_metadata(key))
    }

    fn builtin_metadata(&self, key: &str) -> Option<toml::Value> {
        let value: toml::Value = match key {
            "article_template" => DEFAULT_ARTICLE_TEMPLATE.into(),
            "indexpage_max_articles" => DEFAULT_INDEXPAGE_MAX_ARTICLES.into(),
            "title" => self.src.contentpath().stem().into(),
            "type" => self.kind.tag().into(),
            _ => return None,
        };
        Some(value)
    }

    /// String metadata, required.
    pub fn metadata_str(&self, site: &Site, key: &str) -> Result<String, BuildError> {
        match self.get_metadata(site, key) {
            Some(toml::Value::String(s)) => Ok(s),
            Some(_) => Err(self.invalid_metadata(key, "a string")),
            None => Err(BuildError::MissingMetadata {
                content: self.repr_filename(),
                key: key.to_string(),
            }),
        }
    }

    /// Non-negative integer metadata, required.
    pub fn metadata_usize(&self, site: &Site, key: &str) -> Result<usize, BuildError> {
        match self.get_metadata(site, key) {
            Some(toml::Value::Integer(n)) => {
                usize::try_from(n).map_err(|_| self.invalid_metadata(key, "a non-negative integer"))
            }
            Some(_) => Err(self.invalid_metadata(key, "an integer")),
            None => Err(BuildError::MissingMetadata {
                content: self.repr_filename(),
                key: key.to_string(),
            }),
        }
    }

    fn invalid_metadata(&self, key: &str, expected: &'static str) -> BuildError {
        BuildError::InvalidMetadata {
            content: self.repr_filename(),
            key: key.to_string(),
            expected,
        }
    }

    /// Render this article's body as an inline template, once per context.
    ///
    /// Binaries and indexes have no html.
    pub fn build_html(self: &Arc<Self>, ctx: &Arc<OutputContext>) -> Result<Option<Arc<HtmlInfo>>, BuildError> {
        if self.kind != ContentKind::Article {
            return Ok(None);
        }

        let path = self.src.contentpath();
        let state = ctx.state();
        if let Some(info) = state.get_html_cache(path) {
            return Ok(Some(info));
        }
        if !state.begin_html(path) {
            return Err(BuildError::RecursiveHtml(self.repr_filename()));
        }

        let body = self.body().unwrap_or_default();
        let html = eval_jinja(ctx, self, "html", body, Vars::new());
        state.end_html(path);

        let info = Arc::new(HtmlInfo::new(html?));
        state.set_html_cache(path.clone(), info.clone());
        Ok(Some(info))
    }

    /// Variables for templates rendered on behalf of `content` within
    /// `ctx`: `page` is the context's own content, `content` the one being
    /// evaluated, `site` the `[site]` section.
    pub fn get_jinja_vars(&self, ctx: &Arc<OutputContext>, content: &Arc<Content>) -> Vars {
        let mut vars = Vars::new();
        vars.insert("page".into(), ContentProxy::value(ctx, ctx.content()));
        vars.insert("content".into(), ContentProxy::value(ctx, content));
        vars.insert("site".into(), site_value(&ctx.site().config.site));

        if let ContextKind::Index(page) = ctx.kind() {
            let items: Vec<_> = page.items.iter().map(|item| ContentProxy::value(ctx, item)).collect();
            vars.insert("items".into(), items.into());
            vars.insert("names".into(), minijinja::Value::from_serialize(&page.names));
            vars.insert("cur_page".into(), page.cur_page.into());
            vars.insert("num_pages".into(), page.num_pages.into());
        }
        vars
    }

    /// Every output context this item needs for one build.
    pub fn output_contexts(&self, site: &Arc<Site>) -> Result<Vec<OutputContext>, BuildError> {
        let path = self.src.contentpath();
        let ctor = OutputContext::from_tag(self.kind.tag())
            .ok_or_else(|| BuildError::UnknownContent(path.clone()))?;
        ctor(site, path)
    }
}

/// `[site]` as a template value.
fn site_value(site: &SiteSection) -> minijinja::Value {
    minijinja::Value::from_iter([
        ("title", minijinja::Value::from(site.title.clone())),
        ("url", minijinja::Value::from(site.url.clone())),
        ("lang", minijinja::Value::from(site.lang.as_str())),
        ("extra", from_toml_table(&site.extra)),
    ])
}

#[cfg(test)]
pub(crate) fn test_content(path: &str, kind: ContentKind, body: Option<&str>) -> Arc<Content> {
    let contentpath = ContentPath::parse(path).unwrap();
    let src = ContentSrc::embedded(contentpath, "test", Arc::from(&b""[..]));
    Arc::new(Content::new(src, kind, toml::Table::new(), body.map(str::to_string)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::test_site;
    use tempfile::TempDir;

    #[test]
    fn test_src_accessors() {
        let path = ContentPath::parse("a/b.css").unwrap();
        let src = ContentSrc::embedded(path.clone(), "base", Arc::from(&b"body{}"[..]));

        assert_eq!(src.package(), Some("base"));
        assert!(src.srcpath().is_none());
        assert_eq!(src.read_bytes().unwrap().as_ref(), b"body{}");
        assert_eq!(src.read_text().unwrap(), "body{}");
    }

    #[test]
    fn test_file_src_reads_disk() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("x.txt");
        std::fs::write(&file, "disk").unwrap();

        let src = ContentSrc::file(ContentPath::parse("x.txt").unwrap(), file.clone());
        assert_eq!(src.srcpath(), Some(file.as_path()));
        assert!(src.package().is_none());
        assert!(src.stat().is_some());
        assert_eq!(src.read_bytes().unwrap().as_ref(), b"disk");
    }

    #[test]
    fn test_repr_filename() {
        let content = test_content("css/site.css", ContentKind::Binary, None);
        assert_eq!(content.repr_filename(), "test!css/site.css");
    }

    #[test]
    fn test_metadata_precedence() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("quire.toml"),
            "[defaults]\narticle_template = \"post.html\"\nlayout = \"wide\"\n",
        )
        .unwrap();
        let site = test_site(dir.path());

        let mut front = toml::Table::new();
        front.insert("layout".into(), "narrow".into());
        let src = ContentSrc::embedded(ContentPath::parse("p.html").unwrap(), "t", Arc::from(&b""[..]));
        let content = Content::new(src, ContentKind::Article, front, None);

        assert_eq!(content.metadata_str(&site, "layout").unwrap(), "narrow");
        assert_eq!(content.metadata_str(&site, "article_template").unwrap(), "post.html");
        assert_eq!(content.metadata_str(&site, "title").unwrap(), "p");
        assert_eq!(content.metadata_usize(&site, "indexpage_max_articles").unwrap(), 5);
        assert!(matches!(
            content.metadata_str(&site, "nothing"),
            Err(BuildError::MissingMetadata { .. })
        ));
        assert!(matches!(
            content.metadata_usize(&site, "layout"),
            Err(BuildError::InvalidMetadata { .. })
        ));
    }

    #[test]
    fn test_kind_tags() {
        for kind in [ContentKind::Binary, ContentKind::Article, ContentKind::Index] {
            assert_eq!(ContentKind::from_tag(kind.tag()), Some(kind));
            assert!(OutputContext::from_tag(kind.tag()).is_some());
        }
        assert_eq!(ContentKind::from_tag("feed"), None);
    }
}
