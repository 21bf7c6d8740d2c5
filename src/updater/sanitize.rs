//! HTML-safe subset filter for remote plugin sections
//!
//! Keeps a fixed set of formatting tags with a fixed set of attributes per
//! tag. Script/style bodies and comments are removed, unknown tags are
//! dropped while their text content is kept, and link/image targets must be
//! http(s) URLs or relative paths.

use crate::core::strings::escape_html;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(script|style|iframe|object)\b[^>]*>.*?</(script|style|iframe|object)\s*>")
        .unwrap()
});
static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<(/?)([a-zA-Z][a-zA-Z0-9]*)\b([^>]*?)(/?)>").unwrap());
static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .unwrap()
});

fn allowed_attributes(tag: &str) -> Option<&'static [&'static str]> {
    let attrs: &'static [&'static str] = match tag {
        "a" => &["href", "title", "target", "rel"],
        "img" => &["src", "alt", "title", "width", "height"],
        "abbr" | "acronym" => &["title"],
        "td" | "th" => &["colspan", "rowspan"],
        "ol" => &["start"],
        "b" | "blockquote" | "br" | "code" | "del" | "div" | "em" | "h1" | "h2" | "h3" | "h4"
        | "h5" | "h6" | "hr" | "i" | "li" | "p" | "pre" | "span" | "strong" | "sub" | "sup"
        | "table" | "tbody" | "thead" | "tr" | "ul" | "dl" | "dt" | "dd" => &[],
        _ => return None,
    };
    Some(attrs)
}

fn is_safe_link(value: &str) -> bool {
    let lowered = value.trim().to_ascii_lowercase();
    match lowered.split_once(':') {
        // A colon before any slash means an explicit scheme
        Some((scheme, _)) if !scheme.contains('/') => {
            matches!(scheme, "http" | "https" | "mailto")
        }
        _ => true,
    }
}

/// Filter remote HTML down to the allowed subset
pub fn sanitize_html(input: &str) -> String {
    let without_comments = COMMENT_RE.replace_all(input, "");
    let without_blocks = BLOCK_RE.replace_all(&without_comments, "");

    TAG_RE
        .replace_all(&without_blocks, |caps: &Captures| rebuild_tag(caps))
        .trim()
        .to_string()
}

fn rebuild_tag(caps: &Captures) -> String {
    let closing = !caps[1].is_empty();
    let tag = caps[2].to_ascii_lowercase();
    let Some(allowed) = allowed_attributes(&tag) else {
        return String::new();
    };

    if closing {
        return format!("</{}>", tag);
    }

    let mut rebuilt = format!("<{}", tag);
    for attr in ATTR_RE.captures_iter(&caps[3]) {
        let name = attr[1].to_ascii_lowercase();
        if !allowed.contains(&name.as_str()) {
            continue;
        }
        let value = attr
            .get(2)
            .or_else(|| attr.get(3))
            .or_else(|| attr.get(4))
            .map(|m| m.as_str())
            .unwrap_or_default();
        if matches!(name.as_str(), "href" | "src") && !is_safe_link(value) {
            continue;
        }
        rebuilt.push_str(&format!(" {}=\"{}\"", name, escape_html(value)));
    }
    if !caps[4].is_empty() {
        rebuilt.push_str(" /");
    }
    rebuilt.push('>');
    rebuilt
}
