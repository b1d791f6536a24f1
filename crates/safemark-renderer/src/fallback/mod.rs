//! Built-in two-phase Markdown engine.
//!
//! The source is split into lines and segmented into [`Block`]s, then each
//! block is rendered to HTML. Inline text goes through [`render_inline`].
//! The engine has no dependencies beyond `regex` and never fails.

mod block;
mod fence;
mod inline;
mod render;

pub use block::{Alignment, Block, ListItem, segment};
pub use inline::render_inline;
pub use render::{render_block, render_blocks, render_document};

#[cfg(feature = "pulldown")]
pub(crate) use inline::url_end;

use crate::options::RenderOptions;
use crate::util::normalize_source;

/// Render a whole Markdown document with the built-in engine.
///
/// # Examples
///
/// ```
/// use safemark_renderer::RenderOptions;
/// use safemark_renderer::fallback;
///
/// let html = fallback::render("# Hi\n\n<b>x</b>", &RenderOptions::default());
/// assert_eq!(html, "<h1>Hi</h1>\n<p>&lt;b&gt;x&lt;/b&gt;</p>");
/// ```
pub fn render(source: &str, options: &RenderOptions) -> String {
    let source = normalize_source(source);
    let lines: Vec<&str> = source.split('\n').collect();
    render_document(&lines, options)
}
