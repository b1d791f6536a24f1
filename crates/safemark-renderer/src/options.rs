//! Rendering options shared by both engines.

/// Options controlling Markdown conversion.
///
/// `allow_html`, `typographer` and `breaks` only affect the delegating
/// renderer. The fallback engine always escapes raw HTML.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "snake_case"))]
#[allow(clippy::struct_excessive_bools)]
pub struct RenderOptions {
    /// Pass raw HTML through unescaped.
    pub allow_html: bool,
    /// Skip URL scheme validation entirely.
    pub allow_unsafe_links: bool,
    /// Auto-link bare URLs.
    pub linkify: bool,
    /// Smart quotes and dashes.
    pub typographer: bool,
    /// Render single line feeds as line breaks.
    pub breaks: bool,
    /// Open links in a new window with `rel="noopener noreferrer"`.
    pub link_target_blank: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            allow_html: false,
            allow_unsafe_links: false,
            linkify: true,
            typographer: false,
            breaks: false,
            link_target_blank: true,
        }
    }
}

impl RenderOptions {
    /// Create options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_allow_html(mut self, enabled: bool) -> Self {
        self.allow_html = enabled;
        self
    }

    /// Disable link scheme validation.
    ///
    /// The caller takes full responsibility for the URLs in the source.
    #[must_use]
    pub fn with_allow_unsafe_links(mut self, enabled: bool) -> Self {
        self.allow_unsafe_links = enabled;
        self
    }

    #[must_use]
    pub fn with_linkify(mut self, enabled: bool) -> Self {
        self.linkify = enabled;
        self
    }

    #[must_use]
    pub fn with_typographer(mut self, enabled: bool) -> Self {
        self.typographer = enabled;
        self
    }

    #[must_use]
    pub fn with_breaks(mut self, enabled: bool) -> Self {
        self.breaks = enabled;
        self
    }

    #[must_use]
    pub fn with_link_target_blank(mut self, enabled: bool) -> Self {
        self.link_target_blank = enabled;
        self
    }
}
