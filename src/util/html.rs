//! HTML-to-text sanitization for feed content.
//!
//! Feed items carry arbitrary publisher HTML. Everything here produces plain
//! text: active/embedded blocks are removed with their bodies, remaining
//! tags are replaced by spaces, whitespace is collapsed, and a fixed table
//! of named entities plus numeric references is decoded.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::text::{collapse_whitespace, strip_control_chars};

/// Elements dropped together with everything between their open and close tags.
static BLOCK_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ["script", "style", "iframe", "object"]
        .iter()
        .map(|tag| {
            Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>"))
                .expect("static block pattern")
        })
        .collect()
});

/// Unterminated openers of the same elements (no closing tag in the input).
static DANGLING_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:script|style|iframe|object)\b[^>]*>.*$").expect("static dangling pattern")
});

static EMBED_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<embed\b[^>]*>").expect("static embed pattern"));

static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("static tag pattern"));

static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&[a-zA-Z0-9#]+;").expect("static entity pattern"));

static IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img[^>]+src=["']([^"']+)["'][^>]*>"#).expect("static img pattern")
});

/// Entities decoded by [`decode_entities`]. Anything else is left verbatim.
const ENTITIES: &[(&str, &str)] = &[
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    ("&nbsp;", " "),
    ("&hellip;", "..."),
    ("&mdash;", "\u{2014}"),
    ("&ndash;", "\u{2013}"),
    ("&copy;", "\u{a9}"),
    ("&reg;", "\u{ae}"),
    ("&trade;", "\u{2122}"),
];

/// Decode the fixed entity table and numeric character references
/// (`&#8217;`, `&#x2019;`) in a single left-to-right pass.
///
/// The pass is not repeated, so `&amp;lt;` becomes `&lt;` rather than `<`.
pub fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures<'_>| {
            let entity = &caps[0];
            ENTITIES
                .iter()
                .find(|(name, _)| *name == entity)
                .map(|(_, value)| (*value).to_string())
                .or_else(|| numeric_reference(entity).map(String::from))
                .unwrap_or_else(|| entity.to_string())
        })
        .into_owned()
}

fn numeric_reference(entity: &str) -> Option<char> {
    let body = entity.strip_prefix("&#")?.strip_suffix(';')?;
    let code = match body.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => body.parse().ok()?,
    };
    char::from_u32(code).filter(|c| *c != '\0')
}

/// Convert article HTML into plain text.
///
/// Removes `<script>`, `<style>`, `<iframe>`, `<object>` blocks and `<embed>`
/// tags, replaces all other markup with spaces, collapses whitespace and
/// decodes entities. Markup that only appears after entity decoding (for
/// example `&lt;script&gt;`) is stripped by a second pass so the output never
/// contains a tag.
pub fn clean_content(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    let decoded = decode_entities(&strip_markup(html));
    let cleaned = if decoded.contains('<') {
        strip_markup(&decoded)
    } else {
        decoded
    };

    collapse_whitespace(&strip_control_chars(&cleaned))
}

/// Sanitize a short text field (title, author, category).
///
/// Tags are removed without inserting spaces, so inline markup such as
/// `Spring <em>Market</em>` reads naturally.
pub fn sanitize_text(text: &str) -> String {
    let without_tags = ANY_TAG.replace_all(text, "");
    let decoded = decode_entities(without_tags.trim());
    let decoded = if decoded.contains('<') {
        ANY_TAG.replace_all(&decoded, "").into_owned()
    } else {
        decoded
    };
    strip_control_chars(decoded.trim()).into_owned()
}

/// Normalize a link: trimmed, with `https://` assumed when no scheme is given.
///
/// This is a heuristic, not validation; malformed hosts pass through.
pub fn sanitize_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return trimmed.to_string();
    }
    let rest = trimmed.strip_prefix("//").unwrap_or(trimmed);
    format!("https://{rest}")
}

/// First `<img src="...">` URL in raw (unstripped) HTML.
pub fn extract_image_url(html: &str) -> Option<String> {
    IMG_SRC
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| sanitize_url(&decode_entities(m.as_str())))
        .filter(|url| !url.is_empty())
}

fn strip_markup(html: &str) -> String {
    let mut out = html.to_string();
    for pattern in BLOCK_PATTERNS.iter() {
        out = pattern.replace_all(&out, "").into_owned();
    }
    out = DANGLING_BLOCK.replace_all(&out, "").into_owned();
    out = EMBED_TAG.replace_all(&out, "").into_owned();
    ANY_TAG.replace_all(&out, " ").into_owned()
}
