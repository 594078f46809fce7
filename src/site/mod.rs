//! The loaded site: configuration, themes, templates, content, and hooks.
//!
//! A [`Site`] is built once per run and shared read-only (`Arc<Site>`) by
//! every output context.
//!
//! # Load order
//!
//! 1. `quire.toml`, then `-D` properties and `-o`
//! 2. themes (`build.themes` and their `requires`)
//! 3. template environment: site templates, then theme templates
//! 4. `initialized` hooks
//! 5. content from `contents/`, `files/`, and theme files
//! 6. `load_finished` hooks

use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::SiteConfig;
use crate::content::{Content, ContentFiles, ContentPath, load_files};
use crate::context::BuildError;
use crate::debug;
use crate::hooks::HookRegistry;
use crate::output::output_root;
use crate::template::TemplateEnv;
use crate::theme::{Theme, resolve_themes};

/// Caller-supplied overrides for [`Site::load`].
#[derive(Debug, Default)]
pub struct SiteOptions {
    /// `-D key=value` metadata defaults.
    pub props: Vec<(String, String)>,
    /// `-o` output directory.
    pub output: Option<PathBuf>,
    pub hooks: HookRegistry,
    /// Themes available by name in addition to the built-ins.
    pub themes: Vec<Arc<dyn Theme>>,
}

#[derive(Debug)]
pub struct Site {
    pub config: SiteConfig,
    /// Normalized output root; every written file lands below it.
    pub outputdir: PathBuf,
    pub env: TemplateEnv,
    pub files: ContentFiles,
    pub hooks: HookRegistry,
    pub themes: Vec<Arc<dyn Theme>>,
}

impl Site {
    pub fn load(root: &Path, options: SiteOptions) -> Result<Arc<Self>> {
        let SiteOptions {
            props,
            output,
            hooks,
            themes: extra,
        } = options;

        let mut config = SiteConfig::load(root)?;
        config.apply_props(props.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        if let Some(output) = output {
            config.set_output(&output);
            config.validate()?;
        }

        let themes = resolve_themes(&config.build.themes, &extra)?;
        debug!("site"; "themes: {}", themes.iter().map(|t| t.name()).collect::<Vec<_>>().join(", "));

        let env = template_env(&config, &themes);
        let outputdir = output_root(&config.build.output);

        let mut site = Self {
            config,
            outputdir,
            env,
            files: ContentFiles::default(),
            hooks,
            themes,
        };
        site.hooks.run_initialized(&site);

        site.files = load_files(&site.config, &site.hooks, &site.themes)
            .with_context(|| format!("failed to load content from {}", site.config.root.display()))?;
        debug!("site"; "{} content items", site.files.len());

        site.hooks.run_load_finished(&site);
        Ok(Arc::new(site))
    }

    pub fn get_content(&self, path: &ContentPath) -> Result<Arc<Content>, BuildError> {
        self.files.get_content(path)
    }
}

/// Site templates first, then theme templates in lookup order; the first
/// theme defining a name wins.
fn template_env(config: &SiteConfig, themes: &[Arc<dyn Theme>]) -> TemplateEnv {
    let mut embedded = FxHashMap::default();
    for theme in themes {
        for (name, source) in theme.templates() {
            embedded.entry(name.to_string()).or_insert(*source);
        }
    }

    let mut env = TemplateEnv::new(vec![config.build.templates.clone()], embedded);
    for theme in themes {
        theme.load_package(&mut env);
    }
    env
}

/// Load the site at `root` with default options.
#[cfg(test)]
pub(crate) fn test_site(root: &Path) -> Arc<Site> {
    Site::load(root, SiteOptions::default()).unwrap()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Vars;
    use crate::theme::BaseTheme;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct Override;

    impl Theme for Override {
        fn name(&self) -> &str {
            "override"
        }

        fn requires(&self) -> &[&'static str] {
            &["base"]
        }

        fn templates(&self) -> &[(&'static str, &'static str)] {
            &[("page_article.html", "override:{{ page.html }}")]
        }
    }

    #[test]
    fn test_defaults() {
        let dir = TempDir::new().unwrap();
        let site = test_site(dir.path());

        assert_eq!(site.outputdir, output_root(&dir.path().join("output")));
        assert_eq!(site.themes.len(), 1);
        assert!(site.get_content(&ContentPath::parse("static/quire.css").unwrap()).is_ok());

        let page = site.env.get_template("page_article.html").unwrap();
        assert!(page.source().contains("page.html"));
    }

    #[test]
    fn test_site_templates_shadow_themes() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("templates")).unwrap();
        fs::write(dir.path().join("templates/page_article.html"), "mine").unwrap();

        let site = test_site(dir.path());
        assert_eq!(site.env.render_template("page_article.html", &Vars::new()).unwrap(), "mine");
    }

    #[test]
    fn test_dependent_theme_overrides_base() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("quire.toml"), "[build]\nthemes = [\"override\"]\n").unwrap();

        let options = SiteOptions {
            themes: vec![Arc::new(Override), Arc::new(BaseTheme)],
            ..SiteOptions::default()
        };
        let site = Site::load(dir.path(), options).unwrap();

        let names: Vec<&str> = site.themes.iter().map(|t| t.name()).collect();
        assert_eq!(names, ["override", "base"]);
        let page = site.env.get_template("page_article.html").unwrap();
        assert!(page.source().starts_with("override:"));
        // base still contributes its files and globals
        assert!(site.files.contains(&ContentPath::parse("static/quire.css").unwrap()));
        assert!(site.env.render_inline("g", "{{ generator }}", &Vars::new()).unwrap().starts_with("quire"));
    }

    #[test]
    fn test_options_applied() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("public");

        let options = SiteOptions {
            props: vec![("indexpage_max_articles".into(), "7".into())],
            output: Some(out.clone()),
            ..SiteOptions::default()
        };
        let site = Site::load(dir.path(), options).unwrap();

        assert_eq!(site.outputdir, output_root(&out));
        assert_eq!(site.config.defaults["indexpage_max_articles"].as_integer(), Some(7));
    }

    #[test]
    fn test_output_over_contents_rejected() {
        let dir = TempDir::new().unwrap();
        let options = SiteOptions {
            output: Some(dir.path().to_path_buf()),
            ..SiteOptions::default()
        };
        assert!(Site::load(dir.path(), options).is_err());
    }

    #[test]
    fn test_lifecycle_hooks() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("contents")).unwrap();
        fs::write(dir.path().join("contents/a.html"), "a").unwrap();

        let seen = Arc::new(AtomicUsize::new(0));
        let mut hooks = HookRegistry::default();
        let counter = seen.clone();
        hooks.on_initialized(move |site| {
            assert!(site.files.is_empty());
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = seen.clone();
        hooks.on_load_finished(move |site| {
            assert!(site.files.contains(&ContentPath::parse("a.html").unwrap()));
            counter.fetch_add(10, Ordering::SeqCst);
        });

        let options = SiteOptions {
            hooks,
            ..SiteOptions::default()
        };
        Site::load(dir.path(), options).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn test_unknown_theme_fails_load() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("quire.toml"), "[build]\nthemes = [\"missing\"]\n").unwrap();
        assert!(Site::load(dir.path(), SiteOptions::default()).is_err());
    }
}
