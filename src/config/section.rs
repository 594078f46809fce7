//! `[site]` and `[build]` sections.
//!
//! # Example
//!
//! ```toml
//! [site]
//! title = "Notes"
//! url = "https://example.com"
//!
//! [build]
//! output = "public"
//! themes = ["base"]
//! ignores = ["*.bak"]
//!
//! [[build.hooks.post]]
//! command = ["pagefind", "--site", "$QUIRE_OUTPUT_DIR"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// [site]
// ============================================================================

/// Site-wide values, exposed to templates as `site`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSection {
    pub title: Option<String>,
    pub url: Option<String>,
    pub lang: String,
    /// Free-form table for theme and template use.
    pub extra: toml::Table,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            title: None,
            url: None,
            lang: "en".into(),
            extra: toml::Table::new(),
        }
    }
}

// ============================================================================
// [build]
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSection {
    /// Articles, indexes, and binaries.
    pub contents: PathBuf,
    /// Binary-only files.
    pub files: PathBuf,
    /// Site templates, searched before theme templates.
    pub templates: PathBuf,
    pub output: PathBuf,
    pub themes: Vec<String>,
    /// Filename globs skipped while loading.
    pub ignores: Vec<String>,
    /// Restore mtime/atime/permissions on copied binaries.
    pub preserve_stat: bool,
    /// Render threads, 0 = one per core.
    pub jobs: usize,
    pub hooks: HooksConfig,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            contents: "contents".into(),
            files: "files".into(),
            templates: "templates".into(),
            output: "output".into(),
            themes: vec!["base".into()],
            ignores: Vec::new(),
            preserve_stat: false,
            jobs: 0,
            hooks: HooksConfig::default(),
        }
    }
}

/// External commands run around the build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HooksConfig {
    /// Run before rendering.
    pub pre: Vec<HookConfig>,
    /// Run after every output is written.
    pub post: Vec<HookConfig>,
}

/// A single command hook.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HookConfig {
    pub enable: bool,

    /// Display name for logging (defaults to command[0]).
    pub name: Option<String>,

    /// Command and arguments. `$QUIRE_ROOT` and `$QUIRE_OUTPUT_DIR` are
    /// substituted.
    pub command: Vec<String>,

    /// Suppress stdout.
    pub quiet: bool,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            enable: true,
            name: None,
            command: Vec::new(),
            quiet: true,
        }
    }
}

impl HookConfig {
    /// `name` if set, otherwise `command[0]`.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .unwrap_or_else(|| self.command.first().map(String::as_str).unwrap_or("hook"))
    }
}
