//! Site configuration management for `quire.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section.rs     # [site], [build], [build.hooks]
//! ├── error.rs       # ConfigError
//! └── mod.rs         # SiteConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section            | Purpose                                        |
//! |--------------------|------------------------------------------------|
//! | `[site]`           | Site metadata (title, url, lang, extra)        |
//! | `[build]`          | Source/output paths, themes, ignores, hooks    |
//! | `[defaults]`       | Metadata defaults applied to every content item |

mod error;
mod section;

pub use error::ConfigError;
pub use section::{BuildSection, HookConfig, SiteSection};

use crate::log;
use crate::utils::path::{normalize_path, resolve_path};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Config file name, looked up at the site root.
pub const CONFIG_FILE: &str = "quire.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing quire.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Site root, the directory holding quire.toml (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    pub site: SiteSection,

    pub build: BuildSection,

    /// Metadata defaults, below front matter and above built-in values.
    pub defaults: toml::Table,
}

impl SiteConfig {
    /// Load `quire.toml` from `root`. A missing file yields the defaults.
    ///
    /// Paths come back absolute and the result is validated.
    pub fn load(root: &Path) -> Result<Self> {
        let root = normalize_path(root);
        let path = root.join(CONFIG_FILE);

        let mut config = if path.exists() {
            Self::from_path(&path)?
        } else {
            Self::default()
        };

        config.root = root;
        config.normalize_paths();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            log!("warning"; "unknown fields in {}, ignoring: {}", CONFIG_FILE, ignored.join(", "));
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Make every configured directory absolute, relative to the root.
    pub fn normalize_paths(&mut self) {
        let root = self.root.clone();
        for path in [
            &mut self.build.contents,
            &mut self.build.files,
            &mut self.build.templates,
            &mut self.build.output,
        ] {
            *path = resolve_path(path, &root);
        }
    }

    /// The output directory and the source directories must not overlap.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let output = &self.build.output;
        for (name, source) in [
            ("contents", &self.build.contents),
            ("files", &self.build.files),
            ("templates", &self.build.templates),
        ] {
            if source.starts_with(output) || output.starts_with(source) {
                return Err(ConfigError::Validation(format!(
                    "build.output `{}` overlaps build.{name} `{}`",
                    output.display(),
                    source.display()
                )));
            }
        }
        if self.build.themes.iter().any(String::is_empty) {
            return Err(ConfigError::Validation("build.themes contains an empty name".into()));
        }
        Ok(())
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Override the output directory (`-o`), relative to the working
    /// directory.
    pub fn set_output(&mut self, output: &Path) {
        self.build.output = normalize_path(output);
    }

    /// Merge `-D key=value` properties into `[defaults]`.
    pub fn apply_props<'a>(&mut self, props: impl IntoIterator<Item = (&'a str, &'a str)>) {
        for (key, value) in props {
            self.defaults.insert(key.to_string(), parse_prop_value(value));
        }
    }

    /// Get path relative to the site root
    pub fn root_relative(&self, path: impl AsRef<Path>) -> PathBuf {
        path.as_ref()
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.as_ref().to_path_buf())
    }
}

/// Parse a property value as a TOML scalar (`5`, `true`, `"x"`), falling
/// back to a plain string.
pub fn parse_prop_value(value: &str) -> toml::Value {
    toml::from_str::<toml::Table>(&format!("v = {value}"))
        .ok()
        .and_then(|mut table| table.remove("v"))
        .unwrap_or_else(|| toml::Value::String(value.to_string()))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = SiteConfig::from_str("").unwrap();
        assert_eq!(config.build.contents, PathBuf::from("contents"));
        assert_eq!(config.build.themes, ["base"]);
        assert_eq!(config.site.lang, "en");
        assert!(!config.build.preserve_stat);
    }

    #[test]
    fn test_parse_sections() {
        let config = SiteConfig::from_str(
            r#"
            [site]
            title = "Notes"
            [site.extra]
            author = "someone"

            [build]
            output = "public"
            preserve_stat = true

            [[build.hooks.pre]]
            command = ["echo", "$QUIRE_OUTPUT_DIR"]

            [defaults]
            article_template = "post.html"
            "#,
        )
        .unwrap();

        assert_eq!(config.site.title.as_deref(), Some("Notes"));
        assert_eq!(config.site.extra["author"].as_str(), Some("someone"));
        assert_eq!(config.build.output, PathBuf::from("public"));
        assert!(config.build.preserve_stat);
        assert_eq!(config.build.hooks.pre[0].display_name(), "echo");
        assert_eq!(config.defaults["article_template"].as_str(), Some("post.html"));
    }

    #[test]
    fn test_unknown_fields_collected() {
        let (_, ignored) =
            SiteConfig::parse_with_ignored("[build]\noutptu = \"x\"\n[nope]\na = 1").unwrap();
        assert_eq!(ignored, ["build.outptu", "nope"]);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = SiteConfig::load(dir.path()).unwrap();

        let root = normalize_path(dir.path());
        assert_eq!(config.root, root);
        assert_eq!(config.build.output, root.join("output"));
        assert_eq!(config.build.templates, root.join("templates"));
    }

    #[test]
    fn test_load_rejects_output_containing_sources() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "[build]\noutput = \".\"\n").unwrap();

        let err = SiteConfig::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("overlaps"), "{err}");
    }

    #[test]
    fn test_load_rejects_output_inside_sources() {
        for (output, source) in [("contents/out", "contents"), ("files/out", "files"), ("templates", "templates")] {
            let dir = TempDir::new().unwrap();
            let text = format!("[build]\noutput = \"{output}\"\n");
            fs::write(dir.path().join(CONFIG_FILE), text).unwrap();

            let err = SiteConfig::load(dir.path()).unwrap_err();
            assert!(err.to_string().contains(&format!("build.{source}")), "{err}");
        }
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "[build\n").unwrap();
        let err = SiteConfig::load(dir.path()).unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }

    #[test]
    fn test_apply_props() {
        let mut config = SiteConfig::default();
        config.apply_props([("indexpage_max_articles", "3"), ("title", "hello world")]);

        assert_eq!(config.defaults["indexpage_max_articles"].as_integer(), Some(3));
        assert_eq!(config.defaults["title"].as_str(), Some("hello world"));
    }

    #[test]
    fn test_parse_prop_value() {
        assert_eq!(parse_prop_value("true"), toml::Value::Boolean(true));
        assert_eq!(parse_prop_value("\"q\""), toml::Value::String("q".into()));
        assert_eq!(parse_prop_value("page.html"), toml::Value::String("page.html".into()));
        assert!(matches!(parse_prop_value("2024-01-02"), toml::Value::Datetime(_)));
    }
}
