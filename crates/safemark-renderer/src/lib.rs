//! Markdown to sanitized HTML.
//!
//! This crate converts untrusted Markdown into HTML that can be inserted
//! into a page directly. Two engines are available:
//!
//! - A delegated [`MarkdownEngine`] ([`PulldownEngine`] with the default
//!   `pulldown` feature) configured per call from [`RenderOptions`]
//! - The built-in [`fallback`] engine: block segmentation followed by inline
//!   substitution, used when no delegated engine is present
//!
//! Both paths share the link safety policy: `javascript:`, `vbscript:` and
//! `data:` destinations are rejected unless
//! [`RenderOptions::allow_unsafe_links`] is set, and anchors get
//! `target="_blank" rel="noopener noreferrer"` unless
//! [`RenderOptions::link_target_blank`] is cleared.
//!
//! # Example
//!
//! ```
//! use safemark_renderer::{RenderOptions, convert_fallback};
//!
//! let options = RenderOptions::default().with_link_target_blank(false);
//! let html = convert_fallback("[click](javascript:alert(1))", &options);
//! assert_eq!(html, r##"<p><a href="#">click</a></p>"##);
//! ```

mod anchor;
pub mod delegate;
mod error;
pub mod fallback;
mod options;
mod safety;
mod util;

pub use anchor::add_target_blank;
pub use delegate::{EngineConfig, Extension, Installer, MarkdownEngine, configure};
#[cfg(feature = "pulldown")]
pub use delegate::PulldownEngine;
pub use error::PluginError;
pub use options::RenderOptions;
pub use safety::{SafeHref, escape_attr, escape_html, validate_href};
pub use util::normalize_source;

use std::fmt;

/// Name reported by [`Converter::engine_name`] for the built-in engine.
pub const FALLBACK_ENGINE: &str = "fallback";

/// Converts Markdown with a delegated engine, or the fallback engine when
/// none is configured.
///
/// A converter holds no per-document state and can be shared across threads.
pub struct Converter {
    engine: Option<Box<dyn MarkdownEngine>>,
}

impl Converter {
    /// Converter using the best available engine.
    #[must_use]
    pub fn new() -> Self {
        #[cfg(feature = "pulldown")]
        {
            Self::with_engine(Box::new(PulldownEngine))
        }
        #[cfg(not(feature = "pulldown"))]
        {
            Self::fallback_only()
        }
    }

    /// Converter that always uses the built-in engine.
    #[must_use]
    pub fn fallback_only() -> Self {
        Self { engine: None }
    }

    /// Converter delegating to `engine`.
    #[must_use]
    pub fn with_engine(engine: Box<dyn MarkdownEngine>) -> Self {
        Self {
            engine: Some(engine),
        }
    }

    /// Name of the engine [`convert`](Self::convert) will use.
    pub fn engine_name(&self) -> &'static str {
        self.engine.as_ref().map_or(FALLBACK_ENGINE, |engine| engine.name())
    }

    /// Convert `source` to sanitized HTML.
    ///
    /// Never fails: malformed Markdown degrades to literal text.
    pub fn convert(&self, source: &str, options: &RenderOptions) -> String {
        let source = normalize_source(source);

        let Some(engine) = &self.engine else {
            tracing::debug!(engine = FALLBACK_ENGINE, bytes = source.len(), "Converting markdown");
            return fallback::render(&source, options);
        };

        let config = configure(engine.as_ref(), options);
        tracing::debug!(
            engine = engine.name(),
            bytes = source.len(),
            extensions = config.extensions().len(),
            "Converting markdown"
        );
        let html = engine.render(&source, &config);

        if options.link_target_blank {
            add_target_blank(&html)
        } else {
            html
        }
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("engine", &self.engine_name())
            .finish()
    }
}

/// Convert Markdown with the default [`Converter`].
pub fn convert(source: &str, options: &RenderOptions) -> String {
    Converter::new().convert(source, options)
}

/// Convert Markdown with the built-in engine only.
pub fn convert_fallback(source: &str, options: &RenderOptions) -> String {
    fallback::render(source, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fallback_only_engine_name() {
        assert_eq!(Converter::fallback_only().engine_name(), FALLBACK_ENGINE);
    }

    #[cfg(feature = "pulldown")]
    #[test]
    fn test_default_engine_is_pulldown() {
        assert_eq!(Converter::new().engine_name(), "pulldown-cmark");
        assert_eq!(
            format!("{:?}", Converter::default()),
            r#"Converter { engine: "pulldown-cmark" }"#
        );
    }

    #[cfg(feature = "pulldown")]
    #[test]
    fn test_delegated_links_get_target_blank() {
        assert_eq!(
            convert("[a](https://x.test)", &RenderOptions::default()),
            "<p><a href=\"https://x.test\" target=\"_blank\" rel=\"noopener noreferrer\">a</a></p>\n"
        );
    }

    #[test]
    fn test_converter_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Converter>();
    }

    #[test]
    fn test_fallback_converter_matches_convert_fallback() {
        let source = "# T\r\n\r\n- [ ] a\r\n- [x] b";
        let options = RenderOptions::default();
        assert_eq!(
            Converter::fallback_only().convert(source, &options),
            convert_fallback(source, &options)
        );
    }
}
