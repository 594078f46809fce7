//! Content items as template objects.
//!
//! Templates see `page` and `content` as [`ContentProxy`] values:
//!
//! - `page.<key>`: metadata lookup scoped to the site
//! - `page.html`: rendered body, already safe
//! - `page.headers`: headings of the rendered body
//! - `page.header_anchors`, `page.fragments`: anchors and id-carrying elements
//! - `page.load("dir/file")` or `page.load(other)`: another content item,
//!   recorded as a dependency of the current context

use minijinja::value::{Object, ObjectRepr};
use minijinja::{Error, ErrorKind, State, Value};
use std::fmt;
use std::sync::Arc;

use super::{BuildError, HtmlInfo, OutputContext};
use crate::content::{Content, ContentPath};
use crate::template::from_toml;

pub struct ContentProxy {
    ctx: Arc<OutputContext>,
    content: Arc<Content>,
}

impl fmt::Debug for ContentProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContentProxy")
            .field(self.content.src.contentpath())
            .finish()
    }
}

impl ContentProxy {
    pub fn new(ctx: Arc<OutputContext>, content: Arc<Content>) -> Self {
        Self { ctx, content }
    }

    /// Template value wrapping `content`.
    pub fn value(ctx: &Arc<OutputContext>, content: &Arc<Content>) -> Value {
        Value::from_object(Self::new(ctx.clone(), content.clone()))
    }

    pub fn content(&self) -> &Arc<Content> {
        &self.content
    }

    /// Metadata value for `key`.
    pub fn get(&self, key: &str) -> Option<toml::Value> {
        self.content.get_metadata(self.ctx.site(), key)
    }

    /// Rendered html; `None` for contents without html (binaries, indexes).
    pub fn html(&self) -> Result<Option<Arc<HtmlInfo>>, BuildError> {
        self.content.build_html(&self.ctx)
    }

    /// Proxy over the canonical content at `path`, recorded as a dependency.
    pub fn load(&self, path: &ContentPath) -> Result<ContentProxy, BuildError> {
        let content = self.ctx.site().files.get_content(path)?;
        self.ctx.add_depend(&content);
        Ok(Self::new(self.ctx.clone(), content))
    }

    /// Evaluate a fallible attribute; failures are stashed on the context
    /// and surface as undefined.
    fn attr(&self, f: impl FnOnce(&Self) -> Result<Option<Value>, BuildError>) -> Option<Value> {
        match f(self) {
            Ok(value) => value,
            Err(err) => {
                self.ctx.state().stash_error(err);
                Some(Value::UNDEFINED)
            }
        }
    }
}

/// `load()` accepts a proxy or a `"dir/file"` string.
fn target_path(target: &Value) -> Result<ContentPath, Error> {
    if let Some(proxy) = target.downcast_object_ref::<ContentProxy>() {
        return Ok(proxy.content.src.contentpath().clone());
    }
    let Some(s) = target.as_str() else {
        return Err(Error::new(
            ErrorKind::InvalidOperation,
            "load() expects a content or a path string",
        ));
    };
    ContentPath::parse(s).map_err(|err| Error::new(ErrorKind::InvalidOperation, err.to_string()))
}

impl Object for ContentProxy {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Plain
    }

    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let key = key.as_str()?;
        match key {
            "html" => self.attr(|proxy| {
                let html = proxy.html()?;
                Ok(Some(html.map_or(Value::UNDEFINED, |info| {
                    Value::from_safe_string(info.html.clone())
                })))
            }),
            "headers" => self.attr(|proxy| {
                let html = proxy.html()?;
                Ok(html.map(|info| Value::from_serialize(&info.headers)))
            }),
            "header_anchors" => self.attr(|proxy| {
                let html = proxy.html()?;
                Ok(html.map(|info| Value::from_serialize(&info.header_anchors)))
            }),
            "fragments" => self.attr(|proxy| {
                let html = proxy.html()?;
                Ok(html.map(|info| Value::from_serialize(&info.fragments)))
            }),
            "contentpath" => Some(Value::from(self.content.src.contentpath().to_string())),
            _ => self.get(key).map(|value| from_toml(&value)),
        }
    }

    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        match (method, args) {
            ("load", [target]) => {
                let path = target_path(target)?;
                self.load(&path).map(Value::from_object).map_err(|err| {
                    let error = Error::new(ErrorKind::InvalidOperation, err.to_string());
                    self.ctx.state().stash_error(err);
                    error
                })
            }
            ("load", _) => Err(Error::new(
                ErrorKind::InvalidOperation,
                "load() takes exactly one argument",
            )),
            _ => Err(Error::new(
                ErrorKind::UnknownMethod,
                format!("content has no method named {method}"),
            )),
        }
    }

    fn render(self: &Arc<Self>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.content.src.contentpath())
    }
}
