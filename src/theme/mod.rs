//! Compiled-in themes.
//!
//! A theme contributes templates, embedded files, and template globals.
//! Themes named in `build.themes` are expanded with their `requires`
//! depth-first: each theme precedes the themes it requires, so it can
//! override their templates and files.
//!
//! | Theme  | Templates           | Files              | Globals     |
//! |--------|---------------------|--------------------|-------------|
//! | `base` | `page_article.html` | `static/quire.css` | `generator` |

use minijinja::Value;
use rustc_hash::FxHashSet;
use std::fmt;
use std::sync::Arc;

use crate::config::ConfigError;
use crate::template::TemplateEnv;

pub trait Theme: Send + Sync {
    fn name(&self) -> &str;

    /// Names of themes this one builds on.
    fn requires(&self) -> &[&'static str] {
        &[]
    }

    /// `(name, source)` pairs served by the template loader.
    fn templates(&self) -> &[(&'static str, &'static str)] {
        &[]
    }

    /// `(contentpath, bytes)` pairs loaded as binary content.
    fn files(&self) -> &[(&'static str, &'static [u8])] {
        &[]
    }

    /// Register globals or other setup on the environment.
    fn load_package(&self, _env: &mut TemplateEnv) {}
}

impl fmt::Debug for dyn Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Theme({})", self.name())
    }
}

// ============================================================================
// Built-in themes
// ============================================================================

/// Minimal article layout and stylesheet.
pub struct BaseTheme;

const BASE_TEMPLATES: &[(&str, &str)] = &[("page_article.html", include_str!("base/page_article.html"))];

const BASE_FILES: &[(&str, &[u8])] = &[("static/quire.css", include_bytes!("base/static/quire.css"))];

impl Theme for BaseTheme {
    fn name(&self) -> &str {
        "base"
    }

    fn templates(&self) -> &[(&'static str, &'static str)] {
        BASE_TEMPLATES
    }

    fn files(&self) -> &[(&'static str, &'static [u8])] {
        BASE_FILES
    }

    fn load_package(&self, env: &mut TemplateEnv) {
        let generator = format!("quire {}", env!("CARGO_PKG_VERSION"));
        env.add_global("generator", Value::from(generator));
    }
}

fn builtin(name: &str) -> Option<Arc<dyn Theme>> {
    match name {
        "base" => Some(Arc::new(BaseTheme)),
        _ => None,
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Expand `names` into lookup order. `extra` themes shadow built-ins of the
/// same name.
pub fn resolve_themes(names: &[String], extra: &[Arc<dyn Theme>]) -> Result<Vec<Arc<dyn Theme>>, ConfigError> {
    let mut resolved = Vec::new();
    let mut seen = FxHashSet::default();
    for name in names {
        visit(name, extra, &mut seen, &mut resolved)?;
    }
    Ok(resolved)
}

fn visit(
    name: &str,
    extra: &[Arc<dyn Theme>],
    seen: &mut FxHashSet<String>,
    resolved: &mut Vec<Arc<dyn Theme>>,
) -> Result<(), ConfigError> {
    if !seen.insert(name.to_string()) {
        return Ok(());
    }

    let theme = extra
        .iter()
        .find(|t| t.name() == name)
        .cloned()
        .or_else(|| builtin(name))
        .ok_or_else(|| ConfigError::Validation(format!("unknown theme `{name}`")))?;

    resolved.push(theme.clone());
    for dep in theme.requires() {
        visit(dep, extra, seen, resolved)?;
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct Child;

    impl Theme for Child {
        fn name(&self) -> &str {
            "child"
        }

        fn requires(&self) -> &[&'static str] {
            &["base", "child"]
        }
    }

    fn names(themes: &[Arc<dyn Theme>]) -> Vec<&str> {
        themes.iter().map(|t| t.name()).collect()
    }

    #[test]
    fn test_base_only() {
        let themes = resolve_themes(&["base".to_string()], &[]).unwrap();
        assert_eq!(names(&themes), ["base"]);
        assert_eq!(themes[0].templates()[0].0, "page_article.html");
        assert_eq!(themes[0].files()[0].0, "static/quire.css");
    }

    #[test]
    fn test_requires_follow_dependent() {
        let extra: Vec<Arc<dyn Theme>> = vec![Arc::new(Child)];
        let list = ["base".to_string(), "child".to_string()];

        let themes = resolve_themes(&["child".to_string()], &extra).unwrap();
        assert_eq!(names(&themes), ["child", "base"]);

        // already seen names are skipped
        let themes = resolve_themes(&list, &extra).unwrap();
        assert_eq!(names(&themes), ["base", "child"]);
    }

    #[test]
    fn test_unknown_theme() {
        let err = resolve_themes(&["nope".to_string()], &[]).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(msg) if msg.contains("nope")));
    }

    #[test]
    fn test_base_registers_generator() {
        let mut env = TemplateEnv::new(Vec::new(), Default::default());
        BaseTheme.load_package(&mut env);
        let out = env.render_inline("g", "{{ generator }}", &Default::default()).unwrap();
        assert!(out.starts_with("quire "));
    }
}
