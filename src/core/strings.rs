//! Text helpers shared by the fetcher, reconciler and CLI output

use once_cell::sync::Lazy;
use regex::Regex;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static SCRIPT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)\s*>").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Remove every tag, dropping script and style bodies entirely
pub fn strip_tags(input: &str) -> String {
    let without_scripts = SCRIPT_RE.replace_all(input, "");
    TAG_RE.replace_all(&without_scripts, "").into_owned()
}

/// Single-line plain text: no tags, no control characters, whitespace
/// collapsed, trimmed. Applied to every outbound request value.
pub fn sanitize_text_field(input: &str) -> String {
    let stripped = strip_tags(input);
    let printable: String = stripped
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    WHITESPACE_RE
        .replace_all(&printable, " ")
        .trim()
        .to_string()
}

/// Escape text for an HTML text node
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Accept only absolute http(s) URLs and protocol-relative links; anything
/// else (file:, javascript:, data:, garbage) becomes an empty string.
pub fn sanitize_url(input: &str) -> String {
    let trimmed = sanitize_text_field(input);
    if trimmed.is_empty() {
        return String::new();
    }
    match reqwest::Url::parse(&trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => trimmed,
        _ if trimmed.starts_with("//") && !trimmed.contains(' ') => trimmed,
        _ => String::new(),
    }
}
