//! Template evaluation against a content item's variables.

use std::sync::Arc;

use super::{BuildError, OutputContext};
use crate::content::Content;
use crate::template::Vars;

/// Render inline template `text` (an article body, a metadata field) with
/// `content`'s variables; `extra` overrides them.
///
/// Errors name the template `<content>#<propname>`.
pub fn eval_jinja(
    ctx: &Arc<OutputContext>,
    content: &Arc<Content>,
    propname: &str,
    text: &str,
    extra: Vars,
) -> Result<String, BuildError> {
    let mut vars = content.get_jinja_vars(ctx, content);
    vars.extend(extra);

    let identity = format!("{}#{}", content.repr_filename(), propname);
    let result = ctx.site().env.render_inline(&identity, text, &vars);
    finish(ctx, identity, result)
}

/// Render the named template with `content`'s variables.
pub fn eval_jinja_template(
    ctx: &Arc<OutputContext>,
    content: &Arc<Content>,
    name: &str,
) -> Result<String, BuildError> {
    let vars = content.get_jinja_vars(ctx, content);
    let result = ctx.site().env.render_template(name, &vars);
    finish(ctx, name.to_string(), result)
}

/// An error stashed by attribute access during rendering takes precedence:
/// the template engine only saw an undefined value.
fn finish(
    ctx: &OutputContext,
    identity: String,
    result: Result<String, minijinja::Error>,
) -> Result<String, BuildError> {
    if let Some(err) = ctx.state().take_error() {
        return Err(err);
    }
    result.map_err(|source| BuildError::TemplateResolution { identity, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentPath;
    use crate::context::ContextKind;
    use crate::site::test_site;
    use minijinja::Value;
    use std::fs;
    use tempfile::TempDir;

    fn article_ctx(dir: &TempDir, name: &str) -> Arc<OutputContext> {
        let site = test_site(dir.path());
        let path = ContentPath::parse(name).unwrap();
        Arc::new(OutputContext::new(site, &path, ContextKind::Article).unwrap())
    }

    #[test]
    fn test_extra_vars_override() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("contents")).unwrap();
        fs::write(dir.path().join("contents/a.html"), "+++\ntitle = \"A\"\n+++\n").unwrap();
        let ctx = article_ctx(&dir, "a.html");
        let content = ctx.content().clone();

        let plain = eval_jinja(&ctx, &content, "title", "{{ page.title }}", Vars::new()).unwrap();
        assert_eq!(plain, "A");

        let mut extra = Vars::new();
        extra.insert("page".into(), Value::from("overridden"));
        extra.insert("n".into(), Value::from(3));
        let out = eval_jinja(&ctx, &content, "title", "{{ page }}{{ n }}", extra).unwrap();
        assert_eq!(out, "overridden3");
    }

    #[test]
    fn test_inline_error_identity() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("contents")).unwrap();
        fs::write(dir.path().join("contents/a.html"), "").unwrap();
        let ctx = article_ctx(&dir, "a.html");
        let content = ctx.content().clone();

        let err = eval_jinja(&ctx, &content, "summary", "{% if %}", Vars::new()).unwrap_err();
        let BuildError::TemplateResolution { identity, .. } = err else {
            panic!("expected a template error");
        };
        assert!(identity.ends_with("a.html#summary"), "{identity}");
    }

    #[test]
    fn test_named_template_uses_site_templates() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("contents")).unwrap();
        fs::create_dir_all(dir.path().join("templates")).unwrap();
        fs::write(dir.path().join("contents/a.html"), "").unwrap();
        fs::write(dir.path().join("templates/t.html"), "[{{ page.title }}]").unwrap();
        let ctx = article_ctx(&dir, "a.html");
        let content = ctx.content().clone();

        assert_eq!(eval_jinja_template(&ctx, &content, "t.html").unwrap(), "[a]");
    }
}
