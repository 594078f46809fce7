//! Content loading: directory walk, front matter, theme files.
//!
//! | Source                | Kind                                   |
//! |-----------------------|----------------------------------------|
//! | `contents/**/*.html`  | article, or index with `type = "index"` |
//! | `contents/**/*` other | binary                                 |
//! | `files/**/*`          | binary                                 |
//! | theme files           | binary, unless the site defines the path |

use anyhow::{Context, Result, anyhow};
use jwalk::WalkDir;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{Content, ContentKind, ContentPath, ContentSrc};
use crate::config::SiteConfig;
use crate::context::BuildError;
use crate::hooks::HookRegistry;
use crate::log;
use crate::theme::Theme;
use crate::utils::pattern::IgnoreSet;

/// Front matter fence.
const FENCE: &str = "+++";

/// Extensions loaded as articles from the contents directory.
const ARTICLE_EXTENSIONS: &[&str] = &["html", "htm"];

// ============================================================================
// ContentFiles
// ============================================================================

/// The site's content set.
#[derive(Debug, Default)]
pub struct ContentFiles {
    items: BTreeMap<ContentPath, Arc<Content>>,
}

impl ContentFiles {
    /// Insert `content`, replacing any item at the same path.
    pub fn add(&mut self, content: Content) {
        self.items.insert(content.src.contentpath().clone(), Arc::new(content));
    }

    pub fn contains(&self, path: &ContentPath) -> bool {
        self.items.contains_key(path)
    }

    pub fn get_content(&self, path: &ContentPath) -> Result<Arc<Content>, BuildError> {
        self.items
            .get(path)
            .cloned()
            .ok_or_else(|| BuildError::UnknownContent(path.clone()))
    }

    /// All items, ordered by content path.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Content>> {
        self.items.values()
    }

    /// Articles at or below `dirs`, ordered by content path.
    pub fn articles_under<'a>(&'a self, dirs: &'a [String]) -> impl Iterator<Item = Arc<Content>> + 'a {
        self.items
            .iter()
            .filter(move |(path, content)| {
                content.kind() == ContentKind::Article && path.is_under(dirs)
            })
            .map(|(_, content)| content.clone())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Load the contents and files directories, then theme files the site does
/// not define.
pub fn load_files(
    config: &SiteConfig,
    hooks: &HookRegistry,
    themes: &[Arc<dyn Theme>],
) -> Result<ContentFiles> {
    let ignores = IgnoreSet::new(&config.build.ignores).context("invalid build.ignores pattern")?;
    let mut files = ContentFiles::default();

    for (dir, binary_only) in [(&config.build.contents, false), (&config.build.files, true)] {
        for path in collect_files(dir, &ignores) {
            let contentpath = ContentPath::from_relative(dir, &path)?;
            if files.contains(&contentpath) {
                log!("warning"; "`{}` defined twice, ignoring {}", contentpath, config.root_relative(&path).display());
                continue;
            }

            let binary = binary_only || !is_article_file(&contentpath);
            let src = ContentSrc::file(contentpath, path);
            if let Some(content) = load_content(config, hooks, src, binary)? {
                files.add(content);
            }
        }
    }

    for theme in themes {
        for (path, bytes) in theme.files() {
            let contentpath = ContentPath::parse(path)?;
            if files.contains(&contentpath) {
                continue;
            }
            let src = ContentSrc::embedded(contentpath, theme.name(), Arc::from(*bytes));
            if let Some(content) = load_content(config, hooks, src, true)? {
                files.add(content);
            }
        }
    }

    Ok(files)
}

fn is_article_file(path: &ContentPath) -> bool {
    path.extension()
        .is_some_and(|ext| ARTICLE_EXTENSIONS.contains(&ext.as_str()))
}

/// Regular files below `dir`, skipping ignored names at any depth. A
/// missing directory yields nothing.
fn collect_files(dir: &Path, ignores: &IgnoreSet) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .sort(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path())
        .filter(|path| {
            path.strip_prefix(dir).is_ok_and(|rel| {
                rel.components()
                    .all(|c| !ignores.is_ignored(&c.as_os_str().to_string_lossy()))
            })
        })
        .collect();
    files.sort();
    files
}

/// Run load hooks and build the content. `None` when a pre-load hook drops
/// the source.
fn load_content(
    config: &SiteConfig,
    hooks: &HookRegistry,
    src: ContentSrc,
    binary: bool,
) -> Result<Option<Content>> {
    let Some(src) = hooks.run_pre_load(config, src, binary) else {
        return Ok(None);
    };

    if binary {
        let body = hooks.run_post_load(config, &src, true, None);
        return Ok(Some(Content::new(src, ContentKind::Binary, toml::Table::new(), body)));
    }

    let text = src
        .read_text()
        .with_context(|| format!("failed to read `{}`", src.contentpath()))?;
    let (front, body) = split_front_matter(&text);
    let metadata: toml::Table = match front {
        Some(front) => toml::from_str(front)
            .with_context(|| format!("invalid front matter in `{}`", src.contentpath()))?,
        None => toml::Table::new(),
    };

    let kind = match metadata.get("type") {
        None => ContentKind::Article,
        Some(value) => value
            .as_str()
            .and_then(ContentKind::from_tag)
            .ok_or_else(|| anyhow!("`{}`: unknown type {}", src.contentpath(), value))?,
    };

    let body = hooks.run_post_load(config, &src, false, Some(body.to_string()));
    Ok(Some(Content::new(src, kind, metadata, body)))
}

/// Split `+++` fenced TOML front matter from the body.
///
/// Text without a complete fence is all body.
fn split_front_matter(text: &str) -> (Option<&str>, &str) {
    let Some(rest) = text
        .strip_prefix(FENCE)
        .and_then(|r| r.strip_prefix("\r\n").or_else(|| r.strip_prefix('\n')))
    else {
        return (None, text);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FENCE {
            return (Some(&rest[..offset]), &rest[offset + line.len()..]);
        }
        offset += line.len();
    }
    (None, text)
}

// ============================================================================
// Tests
// ============================================================================
