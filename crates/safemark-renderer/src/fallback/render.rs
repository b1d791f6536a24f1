//! HTML output for segmented blocks.

use std::fmt::Write;

use super::block::{Alignment, Block, ListItem, segment};
use super::inline::render_inline;
use crate::options::RenderOptions;
use crate::safety::{escape_attr, escape_html};

/// Segment `lines` and render every block, joined by newlines.
pub fn render_document<S: AsRef<str>>(lines: &[S], options: &RenderOptions) -> String {
    render_blocks(&segment(lines, 0), options)
}

/// Render a sequence of blocks, joined by newlines.
pub fn render_blocks(blocks: &[Block], options: &RenderOptions) -> String {
    blocks
        .iter()
        .map(|block| render_block(block, options))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a single block to HTML.
///
/// Blockquote content is segmented and rendered again, so nested quotes
/// recurse once per level.
pub fn render_block(block: &Block, options: &RenderOptions) -> String {
    let mut out = String::new();
    match block {
        Block::Heading { level, text } => {
            write!(out, "<h{level}>{}</h{level}>", render_inline(text, options)).unwrap();
        }
        Block::ThematicBreak => out.push_str("<hr />"),
        Block::CodeBlock { language, content } => {
            code_block(language.as_deref(), content, &mut out);
        }
        Block::Blockquote { lines } => {
            out.push_str("<blockquote>\n");
            let inner = render_document(lines, options);
            if !inner.is_empty() {
                out.push_str(&inner);
                out.push('\n');
            }
            out.push_str("</blockquote>");
        }
        Block::List {
            ordered,
            start,
            items,
        } => list(*ordered, *start, items, options, &mut out),
        Block::Table {
            headers,
            alignments,
            rows,
        } => table(headers, alignments, rows, options, &mut out),
        Block::Paragraph { lines } => {
            let text = lines
                .iter()
                .map(|line| line.trim())
                .collect::<Vec<_>>()
                .join("\n");
            write!(out, "<p>{}</p>", render_inline(&text, options)).unwrap();
        }
    }
    out
}

fn code_block(language: Option<&str>, content: &str, out: &mut String) {
    if let Some(lang) = language {
        write!(
            out,
            r#"<pre><code class="language-{}">{}</code></pre>"#,
            escape_attr(lang),
            escape_html(content)
        )
        .unwrap();
    } else {
        write!(out, "<pre><code>{}</code></pre>", escape_html(content)).unwrap();
    }
}

fn list(ordered: bool, start: u64, items: &[ListItem], options: &RenderOptions, out: &mut String) {
    match (ordered, start) {
        (true, 1) => out.push_str("<ol>\n"),
        (true, n) => writeln!(out, r#"<ol start="{n}">"#).unwrap(),
        (false, _) => out.push_str("<ul>\n"),
    }
    for item in items {
        out.push_str("<li>");
        match item.task {
            Some(true) => out.push_str(r#"<input type="checkbox" checked disabled />"#),
            Some(false) => out.push_str(r#"<input type="checkbox" disabled />"#),
            None => {}
        }
        if item.task.is_some() && !item.text.is_empty() {
            out.push(' ');
        }
        out.push_str(&render_inline(&item.text, options));
        out.push_str("</li>\n");
    }
    out.push_str(if ordered { "</ol>" } else { "</ul>" });
}

fn table(
    headers: &[String],
    alignments: &[Alignment],
    rows: &[Vec<String>],
    options: &RenderOptions,
    out: &mut String,
) {
    out.push_str("<table><thead><tr>");
    for (i, header) in headers.iter().enumerate() {
        cell("th", header, alignments.get(i).copied(), options, out);
    }
    out.push_str("</tr></thead>");
    if !rows.is_empty() {
        out.push_str("<tbody>");
        for row in rows {
            out.push_str("<tr>");
            for (i, value) in row.iter().enumerate() {
                cell("td", value, alignments.get(i).copied(), options, out);
            }
            out.push_str("</tr>");
        }
        out.push_str("</tbody>");
    }
    out.push_str("</table>");
}

fn cell(
    tag: &str,
    text: &str,
    alignment: Option<Alignment>,
    options: &RenderOptions,
    out: &mut String,
) {
    let style = alignment.unwrap_or_default().style_attr();
    write!(out, "<{tag}{style}>{}</{tag}>", render_inline(text, options)).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(source: &str) -> String {
        let lines: Vec<&str> = source.split('\n').collect();
        render_document(&lines, &RenderOptions::default())
    }

    #[test]
    fn test_heading_and_paragraph() {
        assert_eq!(
            render("# Title\n\nSome *text*\nnext line"),
            "<h1>Title</h1>\n<p>Some <em>text</em>\nnext line</p>"
        );
    }

    #[test]
    fn test_thematic_break() {
        assert_eq!(render("***"), "<hr />");
    }

    #[test]
    fn test_code_block_escaped_verbatim() {
        assert_eq!(
            render("```html\n<b>**x**</b>\n```"),
            "<pre><code class=\"language-html\">&lt;b&gt;**x**&lt;/b&gt;\n</code></pre>"
        );
        assert_eq!(
            render("    let x = 1;"),
            "<pre><code>let x = 1;\n</code></pre>"
        );
    }

    #[test]
    fn test_code_language_attribute_escaped() {
        assert_eq!(
            render("```\"x\n```"),
            "<pre><code class=\"language-&quot;x\"></code></pre>"
        );
    }

    #[test]
    fn test_blockquote_nested() {
        assert_eq!(
            render("> outer\n> > inner"),
            "<blockquote>\n<p>outer</p>\n<blockquote>\n<p>inner</p>\n</blockquote>\n</blockquote>"
        );
    }

    #[test]
    fn test_empty_blockquote() {
        assert_eq!(render(">"), "<blockquote>\n</blockquote>");
    }

    #[test]
    fn test_unordered_list() {
        assert_eq!(
            render("- one\n- **two**"),
            "<ul>\n<li>one</li>\n<li><strong>two</strong></li>\n</ul>"
        );
    }

    #[test]
    fn test_ordered_list_start() {
        assert_eq!(render("1. a\n2. b"), "<ol>\n<li>a</li>\n<li>b</li>\n</ol>");
        assert_eq!(
            render("3) c"),
            "<ol start=\"3\">\n<li>c</li>\n</ol>"
        );
    }

    #[test]
    fn test_task_list() {
        assert_eq!(
            render("- [ ] todo\n- [x] done"),
            "<ul>\n<li><input type=\"checkbox\" disabled /> todo</li>\n\
             <li><input type=\"checkbox\" checked disabled /> done</li>\n</ul>"
        );
    }

    #[test]
    fn test_table_with_alignment() {
        assert_eq!(
            render("| a | b |\n|:---|---:|\n| 1 | 2 |"),
            "<table><thead><tr><th style=\"text-align:left\">a</th>\
             <th style=\"text-align:right\">b</th></tr></thead>\
             <tbody><tr><td style=\"text-align:left\">1</td>\
             <td style=\"text-align:right\">2</td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_table_without_rows() {
        assert_eq!(
            render("a | b\n--- | ---"),
            "<table><thead><tr><th>a</th><th>b</th></tr></thead></table>"
        );
    }

    #[test]
    fn test_blocks_joined_by_newline() {
        assert_eq!(render("a\n\n---\n\nb"), "<p>a</p>\n<hr />\n<p>b</p>");
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(render(""), "");
        assert_eq!(render("\n\n  \n"), "");
    }
}
