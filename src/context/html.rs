//! Rendered article HTML plus the headings found in it.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(h[1-6])\b([^>]*)>(.*?)</h[1-6]\s*>").unwrap());
static ID_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bid\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a\b([^>]*)>(.*?)</a\s*>").unwrap());
static OPEN_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([a-zA-Z][a-zA-Z0-9]*)\b([^>]*)>").unwrap());

/// An element carrying an id: headings, anchors and fragment targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HtmlHeader {
    pub id: String,
    /// Lowercased tag name.
    pub tag: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlInfo {
    pub html: String,
    pub headers: Vec<HtmlHeader>,
    /// `<a id=...>` link targets.
    pub header_anchors: Vec<HtmlHeader>,
    /// Every element with an explicit id, in document order.
    pub fragments: Vec<HtmlHeader>,
}

impl HtmlInfo {
    pub fn new(html: String) -> Self {
        let headers = scan_headers(&html);
        let header_anchors = scan_anchors(&html);
        let fragments = scan_fragments(&html);
        Self {
            html,
            headers,
            header_anchors,
            fragments,
        }
    }
}

fn id_attr(attrs: &str) -> Option<String> {
    ID_ATTR
        .captures(attrs)
        .and_then(|id| id.get(1).or_else(|| id.get(2)))
        .map(|m| m.as_str().to_string())
}

fn inner_text(html: &str) -> String {
    TAG.replace_all(html, "").trim().to_string()
}

/// Headings in document order. Missing ids are derived from the text.
fn scan_headers(html: &str) -> Vec<HtmlHeader> {
    HEADING
        .captures_iter(html)
        .map(|caps| {
            let text = inner_text(&caps[3]);
            let id = id_attr(&caps[2]).unwrap_or_else(|| slugify(&text));
            HtmlHeader {
                id,
                tag: caps[1].to_ascii_lowercase(),
                text,
            }
        })
        .collect()
}

fn scan_anchors(html: &str) -> Vec<HtmlHeader> {
    ANCHOR
        .captures_iter(html)
        .filter_map(|caps| {
            Some(HtmlHeader {
                id: id_attr(&caps[1])?,
                tag: "a".to_string(),
                text: inner_text(&caps[2]),
            })
        })
        .collect()
}

fn scan_fragments(html: &str) -> Vec<HtmlHeader> {
    OPEN_TAG
        .captures_iter(html)
        .filter_map(|caps| {
            Some(HtmlHeader {
                id: id_attr(&caps[2])?,
                tag: caps[1].to_ascii_lowercase(),
                text: String::new(),
            })
        })
        .collect()
}

fn slugify(text: &str) -> String {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
