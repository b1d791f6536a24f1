//! Shared utility functions for markdown rendering.

use std::borrow::Cow;

/// Normalize line endings to `\n`.
///
/// `\r\n` and lone `\r` both become `\n`. Input without carriage returns is
/// borrowed unchanged.
///
/// # Examples
///
/// ```
/// use safemark_renderer::normalize_source;
///
/// assert_eq!(normalize_source("a\r\nb\rc"), "a\nb\nc");
/// ```
pub fn normalize_source(source: &str) -> Cow<'_, str> {
    if source.contains('\r') {
        Cow::Owned(source.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(source)
    }
}
