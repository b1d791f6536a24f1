//! Code fence detection.
//!
//! Code fences use backticks or tildes (three or more). The closing fence
//! must use the same character and be at least as long as the opening fence.

/// An opening code fence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Fence<'a> {
    /// Character used for the fence (backtick or tilde).
    pub(crate) fence_char: char,
    /// Length of the opening fence (minimum length for closing).
    pub(crate) fence_len: usize,
    /// Info string after the fence, trimmed.
    pub(crate) info: &'a str,
}

impl Fence<'_> {
    /// Language tag: the first word of the info string.
    pub(crate) fn language(&self) -> Option<&str> {
        self.info.split_whitespace().next()
    }

    /// Check if `line` closes this fence.
    ///
    /// The closing fence must:
    /// - Use the same character as opening
    /// - Be at least as long as opening
    /// - Contain only fence characters (optionally followed by whitespace)
    pub(crate) fn is_closed_by(&self, line: &str) -> bool {
        let Some(trimmed) = strip_fence_indent(line) else {
            return false;
        };
        let count = trimmed.chars().take_while(|&c| c == self.fence_char).count();
        if count < self.fence_len {
            return false;
        }
        trimmed[count..].chars().all(char::is_whitespace)
    }
}

/// Detect if a line opens a code fence.
///
/// Up to three spaces of indentation are allowed. A backtick fence cannot
/// have backticks in its info string.
pub(crate) fn detect_fence(line: &str) -> Option<Fence<'_>> {
    let trimmed = strip_fence_indent(line)?;
    let first = trimmed.chars().next()?;
    if first != '`' && first != '~' {
        return None;
    }

    let count = trimmed.chars().take_while(|&c| c == first).count();
    if count < 3 {
        return None;
    }

    let info = trimmed[count..].trim();
    if first == '`' && info.contains('`') {
        return None;
    }

    Some(Fence {
        fence_char: first,
        fence_len: count,
        info,
    })
}

/// Strip up to three leading spaces; four or more is indented code.
fn strip_fence_indent(line: &str) -> Option<&str> {
    let indent = line.bytes().take_while(|&b| b == b' ').count();
    if indent > 3 || line[indent..].starts_with('\t') {
        return None;
    }
    Some(&line[indent..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backtick_fence() {
        let fence = detect_fence("```rust").unwrap();
        assert_eq!(fence.fence_char, '`');
        assert_eq!(fence.fence_len, 3);
        assert_eq!(fence.language(), Some("rust"));

        assert!(!fence.is_closed_by("fn main() {}"));
        assert!(fence.is_closed_by("```"));
    }

    #[test]
    fn test_tilde_fence() {
        let fence = detect_fence("~~~python").unwrap();
        assert_eq!(fence.fence_char, '~');
        assert!(fence.is_closed_by("~~~"));
        assert!(!fence.is_closed_by("```"));
    }

    #[test]
    fn test_longer_closing_fence() {
        let fence = detect_fence("```").unwrap();
        assert!(fence.is_closed_by("````"));
    }

    #[test]
    fn test_shorter_fence_not_closing() {
        let fence = detect_fence("````").unwrap();
        assert!(!fence.is_closed_by("```"));
        assert!(fence.is_closed_by("````"));
    }

    #[test]
    fn test_info_string_words() {
        let fence = detect_fence("```  js title=app.js ").unwrap();
        assert_eq!(fence.info, "js title=app.js");
        assert_eq!(fence.language(), Some("js"));

        let fence = detect_fence("```").unwrap();
        assert_eq!(fence.language(), None);
    }

    #[test]
    fn test_indented_fence() {
        assert!(detect_fence("   ```rust").is_some());
        assert!(detect_fence("    ```rust").is_none());
        assert!(detect_fence("\t```rust").is_none());
    }

    #[test]
    fn test_fence_with_trailing_whitespace() {
        let fence = detect_fence("```  ").unwrap();
        assert!(fence.is_closed_by("```  "));
        assert!(!fence.is_closed_by("``` x"));
    }

    #[test]
    fn test_two_backticks_not_fence() {
        assert!(detect_fence("``inline code``").is_none());
    }

    #[test]
    fn test_backtick_info_with_backtick() {
        assert!(detect_fence("``` a`b").is_none());
        assert!(detect_fence("~~~ a`b").is_some());
    }
}
