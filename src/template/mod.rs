//! Template environment.
//!
//! Wraps a `minijinja` environment whose loader searches the site template
//! directories first, then the templates embedded in themes (in theme
//! lookup order). Inline templates (article bodies, metadata fields) are
//! rendered under an identity used in error messages.

use minijinja::{Environment, Error, ErrorKind, Value};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Variables passed to a render.
pub type Vars = BTreeMap<String, Value>;

#[derive(Debug)]
pub struct TemplateEnv {
    env: Environment<'static>,
}

impl TemplateEnv {
    /// `dirs` are searched in order; `embedded` maps template names to
    /// compiled-in sources and is consulted last.
    pub fn new(dirs: Vec<PathBuf>, embedded: FxHashMap<String, &'static str>) -> Self {
        let mut env = Environment::new();
        env.set_loader(move |name| load_template(&dirs, &embedded, name));
        Self { env }
    }

    pub fn add_global(&mut self, name: impl Into<String>, value: Value) {
        self.env.add_global(name.into(), value);
    }

    pub fn get_template(&self, name: &str) -> Result<minijinja::Template<'_, '_>, Error> {
        self.env.get_template(name)
    }

    pub fn render_template(&self, name: &str, vars: &Vars) -> Result<String, Error> {
        self.get_template(name)?.render(vars)
    }

    /// Render `source` as a one-off template named `identity`.
    pub fn render_inline(&self, identity: &str, source: &str, vars: &Vars) -> Result<String, Error> {
        self.env.render_named_str(identity, source, vars)
    }
}

/// Template value for a TOML value. Datetimes become their RFC 3339 text.
pub fn from_toml(value: &toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::from(s.as_str()),
        toml::Value::Integer(n) => Value::from(*n),
        toml::Value::Float(f) => Value::from(*f),
        toml::Value::Boolean(b) => Value::from(*b),
        toml::Value::Datetime(dt) => Value::from(dt.to_string()),
        toml::Value::Array(items) => items.iter().map(from_toml).collect(),
        toml::Value::Table(table) => from_toml_table(table),
    }
}

pub fn from_toml_table(table: &toml::Table) -> Value {
    table
        .iter()
        .map(|(key, value)| (key.as_str(), from_toml(value)))
        .collect()
}

/// Names with `..`, roots, or drive prefixes never leave the search dirs.
fn is_safe_name(name: &str) -> bool {
    Path::new(name)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

fn load_template(
    dirs: &[PathBuf],
    embedded: &FxHashMap<String, &'static str>,
    name: &str,
) -> Result<Option<String>, Error> {
    if !is_safe_name(name) {
        return Ok(None);
    }

    for dir in dirs {
        let path = dir.join(name);
        match fs::read_to_string(&path) {
            Ok(source) => return Ok(Some(source)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => {
                let msg = format!("could not read template `{}`", path.display());
                return Err(Error::new(ErrorKind::InvalidOperation, msg).with_source(e));
            }
        }
    }

    Ok(embedded.get(name).map(|source| source.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn vars(pairs: &[(&str, Value)]) -> Vars {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_dirs_searched_before_embedded() {
        let site = TempDir::new().unwrap();
        fs::write(site.path().join("a.html"), "site {{ x }}").unwrap();

        let mut embedded = FxHashMap::default();
        embedded.insert("a.html".to_string(), "theme {{ x }}");
        embedded.insert("b.html".to_string(), "theme-b");

        let env = TemplateEnv::new(vec![site.path().to_path_buf()], embedded);
        let v = vars(&[("x", Value::from(1))]);

        assert_eq!(env.render_template("a.html", &v).unwrap(), "site 1");
        assert_eq!(env.render_template("b.html", &v).unwrap(), "theme-b");
    }

    #[test]
    fn test_unknown_template() {
        let env = TemplateEnv::new(Vec::new(), FxHashMap::default());
        let err = env.render_template("missing.html", &Vars::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TemplateNotFound);
    }

    #[test]
    fn test_traversal_names_not_loaded() {
        let root = TempDir::new().unwrap();
        let templates = root.path().join("templates");
        fs::create_dir_all(&templates).unwrap();
        fs::write(root.path().join("secret.txt"), "secret").unwrap();

        let env = TemplateEnv::new(vec![templates], FxHashMap::default());
        assert!(env.get_template("../secret.txt").is_err());
    }

    #[test]
    fn test_inline_and_globals() {
        let mut env = TemplateEnv::new(Vec::new(), FxHashMap::default());
        env.add_global("generator", Value::from("quire"));

        let out = env
            .render_inline("x#html", "{{ generator }}:{{ n * 2 }}", &vars(&[("n", Value::from(21))]))
            .unwrap();
        assert_eq!(out, "quire:42");
    }

    #[test]
    fn test_toml_values() {
        let table: toml::Table = toml::from_str(
            "date = 2024-01-02\nwhen = 2024-01-02T03:04:05Z\ntags = [\"a\", \"b\"]\n[nested]\non = true\n",
        )
        .unwrap();
        let v = vars(&[("m", from_toml_table(&table))]);
        let env = TemplateEnv::new(Vec::new(), FxHashMap::default());

        let out = env
            .render_inline(
                "t",
                "{{ m.date }}|{{ m.when }}|{{ m.tags|join(',') }}|{% if m.nested.on %}on{% endif %}",
                &v,
            )
            .unwrap();
        assert_eq!(out, "2024-01-02|2024-01-02T03:04:05Z|a,b|on");
    }

    #[test]
    fn test_inline_safe_string_not_escaped() {
        let env = TemplateEnv::new(Vec::new(), FxHashMap::default());
        let v = vars(&[("h", Value::from_safe_string("<a></a>".into()))]);
        // `.html` names turn on auto-escaping
        assert_eq!(env.render_inline("t.html", "<div>{{ h }}</div>", &v).unwrap(), "<div><a></a></div>");
    }
}
