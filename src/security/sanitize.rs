//! HTML and plain-text sanitization for user-supplied content.
//!
//! `sanitize_html` keeps a fixed allowlist of formatting tags and
//! attributes. `sanitize_text` strips all markup and returns text that is
//! safe to drop into HTML as-is. Both are idempotent.

use ammonia::{Builder, UrlRelative};
use once_cell::sync::Lazy;
use std::collections::HashSet;

const ALLOWED_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "br", "hr", "ul", "ol", "li", "b", "i", "strong",
    "em", "u", "s", "strike", "blockquote", "pre", "code", "img", "a", "div", "span", "table",
    "thead", "tbody", "tr", "th", "td",
];

const ALLOWED_ATTRIBUTES: &[&str] = &[
    "href", "src", "alt", "title", "width", "height", "class", "id", "target", "rel",
];

// data: is left out; inline images come from the media library.
const ALLOWED_URL_SCHEMES: &[&str] = &[
    "http", "https", "mailto", "tel", "callto", "sms", "cid", "xmpp",
];

/// Removed together with everything inside them. Any other disallowed tag
/// is unwrapped and its text kept.
const DROPPED_WITH_CONTENT: &[&str] = &["script", "style", "iframe", "noscript", "template"];

fn set(items: &'static [&'static str]) -> HashSet<&'static str> {
    items.iter().copied().collect()
}

static HTML_CLEANER: Lazy<Builder<'static>> = Lazy::new(|| {
    let mut builder = Builder::empty();
    builder
        .tags(set(ALLOWED_TAGS))
        .generic_attributes(set(ALLOWED_ATTRIBUTES))
        .clean_content_tags(set(DROPPED_WITH_CONTENT))
        .url_schemes(set(ALLOWED_URL_SCHEMES))
        .url_relative(UrlRelative::PassThrough)
        // `rel` is an allowed attribute, so ammonia must not manage it.
        .link_rel(None)
        .strip_comments(true);
    builder
});

static TEXT_CLEANER: Lazy<Builder<'static>> = Lazy::new(|| {
    let mut builder = Builder::empty();
    builder
        .clean_content_tags(set(DROPPED_WITH_CONTENT))
        .link_rel(None)
        .strip_comments(true);
    builder
});

/// Clean user HTML down to the allowed tags and attributes.
///
/// Event handlers, inline styles, `data-*` attributes and URLs with
/// unlisted schemes (`javascript:`, `data:`) are removed. Relative URLs are
/// kept.
pub fn sanitize_html(input: &str) -> String {
    HTML_CLEANER.clean(input).to_string()
}

/// Strip all markup and return trimmed, HTML-safe text.
///
/// `<` and `>` are always escaped. `&` is escaped only where it would start
/// a character reference, so `bold & text` stays as typed.
pub fn sanitize_text(input: &str) -> String {
    let cleaned = TEXT_CLEANER.clean(input).to_string();
    let decoded = decode_serialized_text(&cleaned);
    escape_markup(decoded.trim())
}

/// Undo the escaping the HTML serializer applies to text nodes.
fn decode_serialized_text(input: &str) -> String {
    const ENTITIES: &[(&str, char)] = &[
        ("&amp;", '&'),
        ("&lt;", '<'),
        ("&gt;", '>'),
        ("&nbsp;", '\u{a0}'),
    ];

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    'outer: while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        for (entity, ch) in ENTITIES {
            if let Some(tail) = rest.strip_prefix(entity) {
                out.push(*ch);
                rest = tail;
                continue 'outer;
            }
        }
        out.push('&');
        rest = &rest[1..];
    }
    out.push_str(rest);
    out
}

fn escape_markup(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' if chars
                .peek()
                .is_some_and(|next| next.is_ascii_alphanumeric() || *next == '#') =>
            {
                out.push_str("&amp;")
            }
            other => out.push(other),
        }
    }
    out
}
