//! Inline rendering for the fallback engine.
//!
//! Text goes through an ordered list of substitutions: code spans, images,
//! links, autolinks, bare URLs, strikethrough, bold, italic. Markup produced
//! by a stage is moved into a [`Stash`] and replaced by an opaque token, so
//! later stages never see generated tags or attribute values.

use std::fmt::Write;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::anchor::target_blank_attrs;
use crate::options::RenderOptions;
use crate::safety::{escape_attr, escape_html, escape_text, unescape_html, validate_href};

const TOKEN_OPEN: char = '\u{E000}';
const TOKEN_CLOSE: char = '\u{E001}';

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\x{E000}(\d+)\x{E001}").unwrap());

static CODE_SPAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());

static BACKSLASH_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\([!-/:-@\[-`{-~])").unwrap());

/// `![alt](url "title")` on escaped text. The URL may contain one level of
/// balanced parentheses.
static IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"!\[([^\]\x{E000}\x{E001}]*)\]\(\s*((?:[^\s()]|\([^\s()]*\))*)(?:\s+(?:&quot;(.*?)&quot;|&#x27;(.*?)&#x27;))?\s*\)",
    )
    .unwrap()
});

static LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\[([^\]]+)\]\(\s*((?:[^\s()]|\([^\s()]*\))*)(?:\s+(?:&quot;(.*?)&quot;|&#x27;(.*?)&#x27;))?\s*\)",
    )
    .unwrap()
});

static AUTOLINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&lt;([A-Za-z][A-Za-z0-9+.\-]{1,31}:[^\s\x{E000}\x{E001}]*?)&gt;").unwrap()
});

static EMAIL_AUTOLINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&lt;([A-Za-z0-9.!#$%+\-_]+@[A-Za-z0-9\-]+(?:\.[A-Za-z0-9\-]+)+)&gt;").unwrap()
});

static BARE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://(?:[^\s&\x{E000}\x{E001}]|&amp;)+").unwrap()
});

static STRIKETHROUGH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"~~([^~\s](?:[^~]*[^~\s])?)~~").unwrap());

static BOLD_STARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\*\*([^*\s](?:.*?[^*\s])?)\*\*").unwrap());

static BOLD_UNDERSCORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)__([^_\s](?:.*?[^_\s])?)__").unwrap());

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Generated markup hidden from later substitution stages.
#[derive(Default)]
struct Stash {
    items: Vec<String>,
}

impl Stash {
    /// Store `html` and return the token that stands in for it.
    fn put(&mut self, html: String) -> String {
        let token = format!("{TOKEN_OPEN}{}{TOKEN_CLOSE}", self.items.len());
        self.items.push(html);
        token
    }

    /// Replace every token in `text` with its stored markup.
    ///
    /// A stored item only refers to items stored before it, so this
    /// terminates.
    fn restore(&self, text: &str) -> String {
        if !text.contains(TOKEN_OPEN) {
            return text.to_owned();
        }
        TOKEN
            .replace_all(text, |caps: &Captures<'_>| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| self.items.get(index))
                    .map(|item| self.restore(item))
                    .unwrap_or_default()
            })
            .into_owned()
    }

    /// Recover a raw attribute value from an escaped capture.
    fn raw_value(&self, escaped: &str) -> String {
        unescape_html(&self.restore(escaped))
    }

    /// Recover plain text for an `alt` attribute.
    fn plain_text(&self, escaped: &str) -> String {
        let html = self.restore(escaped);
        unescape_html(&TAG.replace_all(&html, ""))
    }
}

/// Render inline Markdown to HTML.
///
/// Used for headings, list items, table cells and paragraphs. Never used for
/// code blocks.
///
/// # Examples
///
/// ```
/// use safemark_renderer::RenderOptions;
/// use safemark_renderer::fallback::render_inline;
///
/// let options = RenderOptions::default();
/// assert_eq!(
///     render_inline("**bold** and `<code>`", &options),
///     "<strong>bold</strong> and <code>&lt;code&gt;</code>"
/// );
/// ```
pub fn render_inline(text: &str, options: &RenderOptions) -> String {
    let source = text.replace([TOKEN_OPEN, TOKEN_CLOSE], "\u{FFFD}");
    let mut stash = Stash::default();

    let text = code_spans(&source, &mut stash);
    let text = backslash_escapes(&text, &mut stash);
    let text = escape_text(&text);
    let text = images(&text, &mut stash, options);
    let text = links(&text, &mut stash, options);
    let text = autolinks(&text, &mut stash, options);
    let text = if options.linkify {
        bare_urls(&text, &mut stash, options)
    } else {
        text
    };
    let text = emphasis(&text);

    stash.restore(&text)
}

/// Code spans are taken from the raw text so their content is escaped
/// exactly once and shown verbatim.
fn code_spans(text: &str, stash: &mut Stash) -> String {
    CODE_SPAN
        .replace_all(text, |caps: &Captures<'_>| {
            let content = &caps[1];
            let content = match content.strip_prefix(' ').and_then(|c| c.strip_suffix(' ')) {
                Some(inner) if !inner.trim().is_empty() => inner,
                _ => content,
            };
            stash.put(format!("<code>{}</code>", escape_html(content)))
        })
        .into_owned()
}

fn backslash_escapes(text: &str, stash: &mut Stash) -> String {
    BACKSLASH_ESCAPE
        .replace_all(text, |caps: &Captures<'_>| stash.put(escape_html(&caps[1])))
        .into_owned()
}

/// Title capture of an image or link, whichever quote style matched.
fn title<'t>(caps: &Captures<'t>) -> Option<&'t str> {
    caps.get(3).or_else(|| caps.get(4)).map(|m| m.as_str())
}

fn images(text: &str, stash: &mut Stash, options: &RenderOptions) -> String {
    IMAGE
        .replace_all(text, |caps: &Captures<'_>| {
            let src = validate_href(&stash.raw_value(&caps[2]), options.allow_unsafe_links);
            if !src.is_allowed() {
                return String::new();
            }
            let mut img = format!(r#"<img src="{}""#, escape_attr(&src.or_empty()));
            if let Some(title) = title(caps) {
                write!(img, r#" title="{}""#, escape_attr(&stash.raw_value(title))).unwrap();
            }
            write!(img, r#" alt="{}">"#, escape_attr(&stash.plain_text(&caps[1]))).unwrap();
            stash.put(img)
        })
        .into_owned()
}

fn links(text: &str, stash: &mut Stash, options: &RenderOptions) -> String {
    LINK.replace_all(text, |caps: &Captures<'_>| {
        let href =
            validate_href(&stash.raw_value(&caps[2]), options.allow_unsafe_links).or_fragment();
        let title = title(caps).map(|t| stash.raw_value(t));
        let label = emphasis(&caps[1]);
        let anchor = format!(
            "{}{label}</a>",
            anchor_open(&href, title.as_deref(), options)
        );
        stash.put(anchor)
    })
    .into_owned()
}

fn autolinks(text: &str, stash: &mut Stash, options: &RenderOptions) -> String {
    let text = AUTOLINK
        .replace_all(text, |caps: &Captures<'_>| {
            let url = unescape_html(&caps[1]);
            autolink(&url, &url, stash, options).unwrap_or_else(|| caps[0].to_owned())
        })
        .into_owned();
    EMAIL_AUTOLINK
        .replace_all(&text, |caps: &Captures<'_>| {
            let address = unescape_html(&caps[1]);
            let href = format!("mailto:{address}");
            autolink(&href, &address, stash, options).unwrap_or_else(|| caps[0].to_owned())
        })
        .into_owned()
}

/// Stash an anchor for `href`, or `None` when the URL is rejected.
fn autolink(
    href: &str,
    label: &str,
    stash: &mut Stash,
    options: &RenderOptions,
) -> Option<String> {
    let safe = validate_href(href, options.allow_unsafe_links);
    if !safe.is_allowed() {
        return None;
    }
    let anchor = format!(
        "{}{}</a>",
        anchor_open(&safe.or_empty(), None, options),
        escape_html(label)
    );
    Some(stash.put(anchor))
}

fn bare_urls(text: &str, stash: &mut Stash, options: &RenderOptions) -> String {
    BARE_URL
        .replace_all(text, |caps: &Captures<'_>| {
            let matched = &caps[0];
            let end = url_end(matched);
            let (url, trailing) = matched.split_at(end);
            let raw = unescape_html(url);
            match autolink(&raw, &raw, stash, options) {
                Some(token) => format!("{token}{trailing}"),
                None => matched.to_owned(),
            }
        })
        .into_owned()
}

/// Length of a bare URL without trailing punctuation.
///
/// A closing parenthesis is kept when it balances one inside the URL.
pub(crate) fn url_end(url: &str) -> usize {
    let mut end = url.len();
    while let Some(last) = url[..end].chars().last() {
        let strip = match last {
            '.' | ',' | ';' | ':' | '!' | '?' | '*' | '_' | '~' => true,
            ')' => {
                let candidate = &url[..end];
                candidate.matches('(').count() < candidate.matches(')').count()
            }
            _ => false,
        };
        if !strip {
            break;
        }
        end -= last.len_utf8();
    }
    end
}

fn anchor_open(href: &str, title: Option<&str>, options: &RenderOptions) -> String {
    let mut tag = format!(r#"<a href="{}""#, escape_attr(href));
    if let Some(title) = title {
        write!(tag, r#" title="{}""#, escape_attr(title)).unwrap();
    }
    if options.link_target_blank {
        tag.push_str(&target_blank_attrs());
    }
    tag.push('>');
    tag
}

/// Strikethrough, bold and italic, in that order.
fn emphasis(text: &str) -> String {
    let text = STRIKETHROUGH.replace_all(text, "<del>$1</del>");
    let text = BOLD_STARS.replace_all(&text, "<strong>$1</strong>");
    let text = BOLD_UNDERSCORES.replace_all(&text, "<strong>$1</strong>");
    let text = italic(&text, '*');
    italic(&text, '_')
}

/// Single-delimiter emphasis.
///
/// Not a full delimiter-run algorithm: an opener must follow the start of
/// the text or a character that is not `*` or `_`, and must not touch another
/// delimiter. Underscores also do not open or close inside words. A span
/// never crosses a `<strong>` or `<del>` boundary, so the tags stay nested.
fn italic(text: &str, delim: char) -> String {
    if !text.contains(delim) {
        return text.to_owned();
    }
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 9);
    // Openers outside `live` are known to have no closer.
    let mut live = 0..chars.len();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == delim && live.contains(&i) && can_open(&chars, i, delim) {
            match find_close(&chars, i, delim) {
                Close::At(close) => {
                    out.push_str("<em>");
                    out.extend(&chars[i + 1..close]);
                    out.push_str("</em>");
                    i = close + 1;
                    continue;
                }
                Close::Missing { until, dead_from } => {
                    live.start = until;
                    if let Some(dead_from) = dead_from {
                        live.end = live.end.min(dead_from);
                    }
                }
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

/// Result of scanning for the closer of an italic opener.
enum Close {
    At(usize),
    /// No closer. Every opener before `until` fails the same way, and so
    /// does every opener at or past `dead_from`.
    Missing {
        until: usize,
        dead_from: Option<usize>,
    },
}

fn is_delim(c: char) -> bool {
    c == '*' || c == '_'
}

fn can_open(chars: &[char], i: usize, delim: char) -> bool {
    let prev_ok = match i.checked_sub(1).map(|p| chars[p]) {
        None => true,
        Some(prev) => !is_delim(prev) && !(delim == '_' && prev.is_alphanumeric()),
    };
    let next_ok = chars
        .get(i + 1)
        .is_some_and(|&next| !next.is_whitespace() && !is_delim(next));
    prev_ok && next_ok
}

fn is_close(chars: &[char], j: usize, delim: char) -> bool {
    let prev = chars[j - 1];
    let next = chars.get(j + 1).copied();
    chars[j] == delim
        && !prev.is_whitespace()
        && !is_delim(prev)
        && next != Some(delim)
        && !(delim == '_' && next.is_some_and(char::is_alphanumeric))
}

/// Find the closer for the opener at `open`.
///
/// Text is escaped before this stage, so every `<` starts a tag produced by
/// an earlier emphasis stage. Closers inside a nested tag are skipped and an
/// unmatched closing tag ends the search.
fn find_close(chars: &[char], open: usize, delim: char) -> Close {
    let mut depth = 0usize;
    let mut first_tag = None;
    let mut last_tag = None;

    for j in open + 1..chars.len() {
        match chars[j] {
            '<' => {
                if chars.get(j + 1) == Some(&'/') {
                    if depth == 0 {
                        return Close::Missing {
                            until: first_tag.unwrap_or(j),
                            dead_from: None,
                        };
                    }
                    depth -= 1;
                } else {
                    depth += 1;
                }
                if first_tag.is_none() {
                    first_tag = Some(j);
                }
                last_tag = Some(j);
            }
            c if c == delim && depth == 0 && j > open + 1 && is_close(chars, j, delim) => {
                return Close::At(j);
            }
            _ => {}
        }
    }

    Close::Missing {
        until: first_tag.unwrap_or(chars.len()),
        dead_from: (depth == 0).then(|| last_tag.map_or(open, |tag| tag + 1)),
    }
}
