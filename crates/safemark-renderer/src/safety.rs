//! Link safety policy and HTML escaping.
//!
//! Shared by the fallback engine and the delegating renderer. Every URL that
//! ends up in an `href` or `src` attribute goes through [`validate_href`], and
//! every attribute value is serialized with [`escape_attr`].

/// URL schemes that are never emitted unless unsafe links are allowed.
///
/// `data:` is rejected for images too, which also rules out inline data URIs.
const BLOCKED_SCHEMES: [&str; 3] = ["javascript:", "vbscript:", "data:"];

/// Result of validating a candidate URL against the link safety policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SafeHref {
    /// The URL may be emitted as-is.
    Allowed(String),
    /// The URL was empty or used a blocked scheme.
    Rejected,
}

impl SafeHref {
    /// Check whether the URL passed validation.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed(_))
    }

    /// The validated URL, or an empty string when rejected.
    ///
    /// Used for images, where an empty source means the image is dropped.
    pub fn or_empty(self) -> String {
        match self {
            Self::Allowed(url) => url,
            Self::Rejected => String::new(),
        }
    }

    /// The validated URL, or `#` when rejected.
    ///
    /// Used for links, where the label still has to render.
    pub fn or_fragment(self) -> String {
        match self {
            Self::Allowed(url) => url,
            Self::Rejected => "#".to_owned(),
        }
    }
}

/// Validate a candidate URL.
///
/// Whitespace is trimmed and an empty candidate is rejected. With
/// `allow_unsafe` the candidate passes through unchanged. Otherwise it is
/// rejected when it starts with `javascript:`, `vbscript:` or `data:` in any
/// letter case. All other schemes and relative URLs are allowed verbatim.
///
/// # Examples
///
/// ```
/// use safemark_renderer::{SafeHref, validate_href};
///
/// assert_eq!(validate_href("JavaScript:alert(1)", false), SafeHref::Rejected);
/// assert_eq!(
///     validate_href(" https://example.com ", false),
///     SafeHref::Allowed("https://example.com".to_owned())
/// );
/// ```
pub fn validate_href(candidate: &str, allow_unsafe: bool) -> SafeHref {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return SafeHref::Rejected;
    }
    if allow_unsafe || !has_blocked_scheme(trimmed) {
        SafeHref::Allowed(trimmed.to_owned())
    } else {
        SafeHref::Rejected
    }
}

/// Check the scheme the way a browser would read it.
///
/// Browsers drop ASCII tabs and newlines inside URLs, so `java\tscript:` is
/// still `javascript:`.
fn has_blocked_scheme(url: &str) -> bool {
    let normalized: String = url
        .chars()
        .filter(|c| !c.is_ascii_control() && !c.is_whitespace())
        .take(16)
        .collect::<String>()
        .to_ascii_lowercase();
    BLOCKED_SCHEMES
        .iter()
        .any(|scheme| normalized.starts_with(scheme))
}

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape an attribute value.
///
/// Same as [`escape_html`], plus backticks, which some template engines
/// treat as string delimiters when the HTML is embedded downstream.
#[must_use]
pub fn escape_attr(s: &str) -> String {
    escape_html(s).replace('`', "&#96;")
}

/// Escape inline text, keeping character references that are already there.
///
/// `&amp;` stays `&amp;` instead of turning into `&amp;amp;`, so applying
/// this twice gives the same result as applying it once.
#[must_use]
pub(crate) fn escape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(c) = rest.chars().next() {
        match c {
            '&' => {
                let len = entity_len(rest);
                if len > 0 {
                    result.push_str(&rest[..len]);
                    rest = &rest[len..];
                    continue;
                }
                result.push_str("&amp;");
            }
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
        rest = &rest[c.len_utf8()..];
    }
    result
}

/// Length of a character reference at the start of `s`, or 0.
///
/// Accepts `&name;`, `&#123;` and `&#x1F;` forms.
fn entity_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    debug_assert_eq!(bytes.first(), Some(&b'&'));

    let (start, max, accept): (usize, usize, fn(u8) -> bool) = match bytes.get(1) {
        Some(b'#') => match bytes.get(2) {
            Some(b'x' | b'X') => (3, 6, |b| b.is_ascii_hexdigit()),
            _ => (2, 7, |b| b.is_ascii_digit()),
        },
        Some(b) if b.is_ascii_alphabetic() => (1, 32, |b| b.is_ascii_alphanumeric()),
        _ => return 0,
    };

    let body = bytes[start..]
        .iter()
        .take(max + 1)
        .take_while(|&&b| accept(b))
        .count();
    if body == 0 || body > max {
        return 0;
    }
    match bytes.get(start + body) {
        Some(b';') => start + body + 1,
        _ => 0,
    }
}

/// Reverse [`escape_html`].
///
/// Only the five references produced by the escaper are decoded, which is
/// enough to recover a URL from already-escaped inline text.
#[must_use]
pub(crate) fn unescape_html(s: &str) -> String {
    if !s.contains('&') {
        return s.to_owned();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_blocked_schemes_any_case() {
        for candidate in [
            "javascript:alert(1)",
            "JAVASCRIPT:alert(1)",
            "JaVaScRiPt:void(0)",
            "vbscript:msgbox",
            "VBScript:msgbox",
            "data:text/html;base64,PHNjcmlwdD4=",
            "DATA:image/png;base64,AAAA",
            "  javascript:alert(1)  ",
        ] {
            assert_eq!(validate_href(candidate, false), SafeHref::Rejected, "{candidate}");
        }
    }

    #[test]
    fn test_blocked_scheme_with_embedded_whitespace() {
        assert_eq!(validate_href("java\tscript:alert(1)", false), SafeHref::Rejected);
        assert_eq!(validate_href("java\nscript:alert(1)", false), SafeHref::Rejected);
        assert_eq!(validate_href("\u{1}javascript:alert(1)", false), SafeHref::Rejected);
    }

    #[test]
    fn test_allow_unsafe_passes_through() {
        assert_eq!(
            validate_href("javascript:x", true),
            SafeHref::Allowed("javascript:x".to_owned())
        );
    }

    #[test]
    fn test_allowed_schemes() {
        for candidate in [
            "https://example.com",
            "http://example.com/a?b=c",
            "mailto:me@example.com",
            "tel:+123",
            "#section",
            "./relative/path",
            "/absolute",
            "page.html",
        ] {
            assert_eq!(
                validate_href(candidate, false),
                SafeHref::Allowed(candidate.to_owned())
            );
        }
    }

    #[test]
    fn test_empty_candidate() {
        assert_eq!(validate_href("", false), SafeHref::Rejected);
        assert_eq!(validate_href("   ", true), SafeHref::Rejected);
        assert_eq!(validate_href("  ", false).or_empty(), "");
    }

    #[test]
    fn test_safe_href_fallbacks() {
        assert_eq!(SafeHref::Rejected.or_fragment(), "#");
        assert_eq!(SafeHref::Rejected.or_empty(), "");
        assert_eq!(SafeHref::Allowed("a".to_owned()).or_fragment(), "a");
        assert!(!SafeHref::Rejected.is_allowed());
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html(r#""quoted""#), "&quot;quoted&quot;");
        assert_eq!(escape_html("it's"), "it&#x27;s");
    }

    #[test]
    fn test_escape_attr_backtick() {
        assert_eq!(escape_attr("`${x}`"), "&#96;${x}&#96;");
        assert_eq!(escape_attr(r#"" onmouseover=""#), "&quot; onmouseover=&quot;");
    }

    #[test]
    fn test_escape_text_keeps_references() {
        assert_eq!(escape_text("a &amp; b"), "a &amp; b");
        assert_eq!(escape_text("&copy; &#169; &#xA9;"), "&copy; &#169; &#xA9;");
        assert_eq!(escape_text("AT&T"), "AT&amp;T");
        assert_eq!(escape_text("&#;"), "&amp;#;");
        assert_eq!(escape_text("&#12345678;"), "&amp;#12345678;");
    }

    #[test]
    fn test_escape_text_idempotent() {
        let input = r#"<b>"Fish" & 'Chips'</b> &amp; more"#;
        let once = escape_text(input);
        assert_eq!(escape_text(&once), once);
        assert!(!once.contains("&amp;amp;"));
    }

    #[test]
    fn test_unescape_round_trip() {
        let raw = r#"https://x.test/?a=1&b="2"<3>'"#;
        assert_eq!(unescape_html(&escape_html(raw)), raw);
    }
}
