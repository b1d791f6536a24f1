//! `target="_blank"` handling for rendered anchors.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Tokens every new-window anchor must carry in its `rel` attribute.
const REQUIRED_REL: [&str; 2] = ["noopener", "noreferrer"];

static ANCHOR_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<a(\s[^>]*)?>").unwrap());

static TARGET_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\s+target\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#).unwrap()
});

static REL_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\s+rel\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#).unwrap()
});

/// Build the `rel` value for an anchor, keeping existing tokens first.
pub(crate) fn merge_rel(existing: &str) -> String {
    let mut tokens: Vec<&str> = existing.split_whitespace().collect();
    for required in REQUIRED_REL {
        if !tokens.iter().any(|t| t.eq_ignore_ascii_case(required)) {
            tokens.push(required);
        }
    }
    tokens.join(" ")
}

/// Attributes appended to anchors generated by this crate.
pub(crate) fn target_blank_attrs() -> String {
    format!(r#" target="_blank" rel="{}""#, merge_rel(""))
}

/// Add `target="_blank"` and a safe `rel` to every anchor in `html`.
///
/// An existing `target` is replaced. An existing `rel` keeps its tokens and
/// gains `noopener` and `noreferrer` if they are missing.
///
/// # Examples
///
/// ```
/// use safemark_renderer::add_target_blank;
///
/// let html = add_target_blank(r#"<a href="/x" rel="nofollow">x</a>"#);
/// assert_eq!(
///     html,
///     r#"<a href="/x" target="_blank" rel="nofollow noopener noreferrer">x</a>"#
/// );
/// ```
pub fn add_target_blank(html: &str) -> String {
    ANCHOR_OPEN
        .replace_all(html, |caps: &Captures<'_>| {
            let attrs = caps.get(1).map_or("", |m| m.as_str());
            let existing_rel = REL_ATTR.captures(attrs).and_then(|rel| {
                rel.get(1)
                    .or_else(|| rel.get(2))
                    .or_else(|| rel.get(3))
                    .map(|m| m.as_str().to_owned())
            });
            let attrs = TARGET_ATTR.replace_all(attrs, "");
            let attrs = REL_ATTR.replace_all(&attrs, "");
            let rel = merge_rel(existing_rel.as_deref().unwrap_or_default());
            format!(r#"<a{attrs} target="_blank" rel="{rel}">"#)
        })
        .into_owned()
}
