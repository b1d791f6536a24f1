//! Block segmentation.
//!
//! Lines are classified greedily in a fixed priority order: fenced code,
//! indented code, setext heading, ATX heading, thematic break, blockquote,
//! pipe table, list, paragraph. The first rule that matches at the cursor
//! wins and consumes one or more lines; the cursor never moves backwards.

use super::fence::{Fence, detect_fence};

/// A block-level element of a Markdown document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    /// ATX or setext heading.
    Heading {
        /// Heading level (1-6).
        level: u8,
        /// Raw heading text, not yet inline-rendered.
        text: String,
    },
    /// Horizontal rule.
    ThematicBreak,
    /// Fenced or indented code.
    CodeBlock {
        /// Language tag from the fence info string.
        language: Option<String>,
        /// Verbatim content, one trailing newline per line.
        content: String,
    },
    /// Blockquote with its `>` prefix stripped one level.
    Blockquote {
        /// Inner lines, segmented again when rendered.
        lines: Vec<String>,
    },
    /// Flat list; nesting is not supported.
    List {
        ordered: bool,
        /// First item number of an ordered list.
        start: u64,
        items: Vec<ListItem>,
    },
    /// Pipe table.
    Table {
        headers: Vec<String>,
        alignments: Vec<Alignment>,
        /// Data rows, each exactly as wide as `headers`.
        rows: Vec<Vec<String>>,
    },
    /// Run of text lines.
    Paragraph { lines: Vec<String> },
}

/// A single list item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListItem {
    /// Item text without the list marker or task checkbox.
    pub text: String,
    /// `Some(checked)` for task items.
    pub task: Option<bool>,
}

/// Column alignment declared in a table separator row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Alignment {
    #[default]
    None,
    Left,
    Right,
    Center,
}

impl Alignment {
    /// Inline style attribute for cells in this column.
    pub(crate) fn style_attr(self) -> &'static str {
        match self {
            Alignment::Left => r#" style="text-align:left""#,
            Alignment::Center => r#" style="text-align:center""#,
            Alignment::Right => r#" style="text-align:right""#,
            Alignment::None => "",
        }
    }
}

/// Segment `lines` into blocks, starting at line `start`.
///
/// Blank lines between blocks are skipped. Malformed constructs never fail:
/// they end up as a shorter block or as a paragraph.
///
/// # Examples
///
/// ```
/// use safemark_renderer::fallback::{Block, segment};
///
/// let blocks = segment(&["# Title", "", "Body text"], 0);
/// assert_eq!(
///     blocks[0],
///     Block::Heading { level: 1, text: "Title".to_owned() }
/// );
/// assert!(matches!(blocks[1], Block::Paragraph { .. }));
/// ```
pub fn segment<S: AsRef<str>>(lines: &[S], start: usize) -> Vec<Block> {
    let lines: Vec<&str> = lines.iter().map(AsRef::as_ref).collect();
    let mut blocks = Vec::new();
    let mut cursor = start;

    while cursor < lines.len() {
        if is_blank(lines[cursor]) {
            cursor += 1;
            continue;
        }
        let (block, next) = classify(&lines, cursor);
        debug_assert!(next > cursor, "segmenter cursor must advance");
        blocks.push(block);
        cursor = next;
    }

    blocks
}

/// Classify the block starting at non-blank line `i`.
///
/// Returns the block and the index of the first line after it.
fn classify(lines: &[&str], i: usize) -> (Block, usize) {
    let line = lines[i];

    if let Some(fence) = detect_fence(line) {
        return fenced_code(lines, i, &fence);
    }
    if is_indented_code(line) {
        return indented_code(lines, i);
    }
    if let Some(level) = setext_underline(lines, i) {
        let heading = Block::Heading {
            level,
            text: line.trim().to_owned(),
        };
        return (heading, i + 2);
    }
    if let Some((level, text)) = atx_heading(line) {
        return (Block::Heading { level, text }, i + 1);
    }
    if is_thematic_break(line) {
        return (Block::ThematicBreak, i + 1);
    }
    if is_blockquote(line) {
        return blockquote(lines, i);
    }
    if let Some(table) = table(lines, i) {
        return table;
    }
    if let Some(marker) = list_marker(line) {
        return list(lines, i, &marker);
    }
    paragraph(lines, i)
}

/// Check whether line `j` would open any non-paragraph block.
fn starts_block(lines: &[&str], j: usize) -> bool {
    let line = lines[j];
    detect_fence(line).is_some()
        || is_indented_code(line)
        || setext_underline(lines, j).is_some()
        || atx_heading(line).is_some()
        || is_thematic_break(line)
        || is_blockquote(line)
        || is_table_start(lines, j)
        || list_marker(line).is_some()
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn leading_spaces(line: &str) -> usize {
    line.bytes().take_while(|&b| b == b' ').count()
}

// --- code ---

fn fenced_code(lines: &[&str], i: usize, fence: &Fence<'_>) -> (Block, usize) {
    let indent = leading_spaces(lines[i]);
    let mut content = String::new();
    let mut j = i + 1;

    while j < lines.len() && !fence.is_closed_by(lines[j]) {
        let line = lines[j];
        let strip = leading_spaces(line).min(indent);
        content.push_str(&line[strip..]);
        content.push('\n');
        j += 1;
    }

    // An unterminated fence runs to the end of input.
    let next = if j < lines.len() { j + 1 } else { j };
    let block = Block::CodeBlock {
        language: fence.language().map(str::to_owned),
        content,
    };
    (block, next)
}

fn is_indented_code(line: &str) -> bool {
    !is_blank(line) && (line.starts_with("    ") || line.starts_with('\t'))
}

fn strip_code_indent(line: &str) -> &str {
    line.strip_prefix('\t')
        .or_else(|| line.strip_prefix("    "))
        .unwrap_or(line.trim_start())
}

fn indented_code(lines: &[&str], i: usize) -> (Block, usize) {
    let mut content = String::new();
    let mut pending_blank = 0;
    let mut j = i;

    while j < lines.len() {
        let line = lines[j];
        if is_blank(line) {
            pending_blank += 1;
            j += 1;
            continue;
        }
        if !is_indented_code(line) {
            break;
        }
        // Blank lines only belong to the block when indented code follows.
        for _ in 0..pending_blank {
            content.push('\n');
        }
        pending_blank = 0;
        content.push_str(strip_code_indent(line));
        content.push('\n');
        j += 1;
    }

    let block = Block::CodeBlock {
        language: None,
        content,
    };
    (block, j - pending_blank)
}

// --- headings and breaks ---

/// Level of a setext heading whose text is line `i`.
///
/// Any non-blank text line qualifies, including one that would otherwise
/// open an ATX heading, a quote or a list item.
fn setext_underline(lines: &[&str], i: usize) -> Option<u8> {
    if is_blank(lines[i]) {
        return None;
    }
    setext_level(lines.get(i + 1)?)
}

fn setext_level(line: &str) -> Option<u8> {
    if leading_spaces(line) > 3 {
        return None;
    }
    let trimmed = line.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.chars().all(|c| c == '=') {
        Some(1)
    } else if trimmed.chars().all(|c| c == '-') {
        Some(2)
    } else {
        None
    }
}

fn atx_heading(line: &str) -> Option<(u8, String)> {
    let indent = leading_spaces(line);
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let hashes = rest.bytes().take_while(|&b| b == b'#').count();
    let level = u8::try_from(hashes).ok().filter(|l| (1..=6).contains(l))?;

    let after = &rest[hashes..];
    if !after.is_empty() && !after.starts_with([' ', '\t']) {
        return None;
    }

    let text = after.trim();
    let without_closing = text.trim_end_matches('#');
    let text = if without_closing.is_empty() {
        ""
    } else if without_closing.ends_with([' ', '\t']) {
        without_closing.trim_end()
    } else {
        text
    };
    Some((level, text.to_owned()))
}

fn is_thematic_break(line: &str) -> bool {
    if leading_spaces(line) > 3 {
        return false;
    }
    let mut marks = line.chars().filter(|c| !c.is_whitespace());
    let Some(first) = marks.next() else {
        return false;
    };
    if !matches!(first, '*' | '-' | '_') {
        return false;
    }
    let mut count = 1;
    for c in marks {
        if c != first {
            return false;
        }
        count += 1;
    }
    count >= 3
}

// --- blockquotes ---

fn is_blockquote(line: &str) -> bool {
    line.trim_start().starts_with('>')
}

/// Strip one level of `>` and at most one following space.
fn strip_quote_marker(line: &str) -> &str {
    let rest = line.trim_start();
    let rest = rest.strip_prefix('>').unwrap_or(rest);
    rest.strip_prefix([' ', '\t']).unwrap_or(rest)
}

fn blockquote(lines: &[&str], i: usize) -> (Block, usize) {
    let mut inner = Vec::new();
    let mut j = i;
    while j < lines.len() && is_blockquote(lines[j]) {
        inner.push(strip_quote_marker(lines[j]).to_owned());
        j += 1;
    }
    (Block::Blockquote { lines: inner }, j)
}

// --- tables ---

fn is_table_start(lines: &[&str], i: usize) -> bool {
    lines[i].contains('|')
        && lines
            .get(i + 1)
            .is_some_and(|sep| parse_separator(sep).is_some())
}

fn table(lines: &[&str], i: usize) -> Option<(Block, usize)> {
    if !lines[i].contains('|') {
        return None;
    }
    let alignments = parse_separator(lines.get(i + 1)?)?;
    let headers = split_row(lines[i]);
    let width = headers.len();

    let mut rows = Vec::new();
    let mut j = i + 2;
    while j < lines.len() && !is_blank(lines[j]) && lines[j].contains('|') {
        let mut row = split_row(lines[j]);
        row.resize(width, String::new());
        rows.push(row);
        j += 1;
    }

    let mut alignments = alignments;
    alignments.resize(width, Alignment::None);

    let block = Block::Table {
        headers,
        alignments,
        rows,
    };
    Some((block, j))
}

/// Parse a separator row like `| :--- | ---: |`.
///
/// Every cell must match `:?-{3,}:?`.
fn parse_separator(line: &str) -> Option<Vec<Alignment>> {
    if !line.contains('|') {
        return None;
    }
    let cells = split_row(line);
    if cells.is_empty() {
        return None;
    }

    cells
        .iter()
        .map(|cell| {
            let left = cell.starts_with(':');
            let right = cell.ends_with(':') && cell.len() > 1;
            let dashes = cell.trim_start_matches(':').trim_end_matches(':');
            if dashes.len() < 3 || !dashes.chars().all(|c| c == '-') {
                return None;
            }
            Some(match (left, right) {
                (true, true) => Alignment::Center,
                (true, false) => Alignment::Left,
                (false, true) => Alignment::Right,
                (false, false) => Alignment::None,
            })
        })
        .collect()
}

/// Split a table row into trimmed cells.
///
/// Leading and trailing pipes are optional; `\|` is a literal pipe.
fn split_row(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let trimmed = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let trimmed = match trimmed.strip_suffix('|') {
        Some(rest) if !rest.ends_with('\\') => rest,
        _ => trimmed,
    };

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = trimmed.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'|') => {
                current.push('|');
                chars.next();
            }
            '|' => cells.push(std::mem::take(&mut current).trim().to_owned()),
            _ => current.push(c),
        }
    }
    cells.push(current.trim().to_owned());
    cells
}

// --- lists ---

/// A parsed list item marker.
#[derive(Debug)]
struct ListMarker<'a> {
    ordered: bool,
    indent: usize,
    number: u64,
    content: &'a str,
}

fn list_marker(line: &str) -> Option<ListMarker<'_>> {
    let indent = leading_spaces(line);
    let rest = &line[indent..];

    let (ordered, number, after) = match rest.chars().next()? {
        '-' | '+' | '*' => (false, 1, &rest[1..]),
        c if c.is_ascii_digit() => {
            let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
            if digits > 9 {
                return None;
            }
            let after = rest[digits..].strip_prefix(['.', ')'])?;
            (true, rest[..digits].parse().ok()?, after)
        }
        _ => return None,
    };

    if !after.starts_with([' ', '\t']) {
        return None;
    }
    Some(ListMarker {
        ordered,
        indent,
        number,
        content: after.trim(),
    })
}

fn list(lines: &[&str], i: usize, first: &ListMarker<'_>) -> (Block, usize) {
    let mut items = vec![list_item(first.content)];
    let mut j = i + 1;

    while j < lines.len() && !is_thematic_break(lines[j]) {
        match list_marker(lines[j]) {
            Some(marker) if marker.ordered == first.ordered && marker.indent == first.indent => {
                items.push(list_item(marker.content));
                j += 1;
            }
            _ => break,
        }
    }

    let block = Block::List {
        ordered: first.ordered,
        start: first.number,
        items,
    };
    (block, j)
}

fn list_item(content: &str) -> ListItem {
    let task = match content.get(..3) {
        Some("[ ]") => Some(false),
        Some("[x]" | "[X]") => Some(true),
        _ => None,
    };
    match task {
        Some(checked) if content[3..].is_empty() || content[3..].starts_with([' ', '\t']) => {
            ListItem {
                text: content[3..].trim_start().to_owned(),
                task: Some(checked),
            }
        }
        _ => ListItem {
            text: content.to_owned(),
            task: None,
        },
    }
}

// --- paragraphs ---

fn paragraph(lines: &[&str], i: usize) -> (Block, usize) {
    let mut collected = vec![lines[i].trim().to_owned()];
    let mut j = i + 1;
    while j < lines.len() && !is_blank(lines[j]) && !starts_block(lines, j) {
        collected.push(lines[j].trim().to_owned());
        j += 1;
    }
    (Block::Paragraph { lines: collected }, j)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn seg(source: &str) -> Vec<Block> {
        let lines: Vec<&str> = source.split('\n').collect();
        segment(&lines, 0)
    }

    fn paragraph_of(lines: &[&str]) -> Block {
        Block::Paragraph {
            lines: lines.iter().map(|l| (*l).to_owned()).collect(),
        }
    }

    #[test]
    fn test_fence_wins_over_heading() {
        let blocks = seg("```\n# not a heading\n```");
        assert_eq!(
            blocks,
            vec![Block::CodeBlock {
                language: None,
                content: "# not a heading\n".to_owned(),
            }]
        );
    }

    #[test]
    fn test_fence_language_and_indent() {
        let blocks = seg("  ```rust\n  fn main() {}\n    x\n  ```");
        assert_eq!(
            blocks,
            vec![Block::CodeBlock {
                language: Some("rust".to_owned()),
                content: "fn main() {}\n  x\n".to_owned(),
            }]
        );
    }

    #[test]
    fn test_unterminated_fence_consumes_rest() {
        let blocks = seg("~~~\nline\n\n# still code");
        assert_eq!(
            blocks,
            vec![Block::CodeBlock {
                language: None,
                content: "line\n\n# still code\n".to_owned(),
            }]
        );
    }

    #[test]
    fn test_indented_code_keeps_inner_blank_lines() {
        let blocks = seg("    a\n\n    b\n\n\ntext");
        assert_eq!(
            blocks,
            vec![
                Block::CodeBlock {
                    language: None,
                    content: "a\n\nb\n".to_owned(),
                },
                paragraph_of(&["text"]),
            ]
        );
    }

    #[test]
    fn test_indented_code_with_tab() {
        let blocks = seg("\tlet x = 1;");
        assert_eq!(
            blocks,
            vec![Block::CodeBlock {
                language: None,
                content: "let x = 1;\n".to_owned(),
            }]
        );
    }

    #[test]
    fn test_setext_headings() {
        assert_eq!(
            seg("Title\n====="),
            vec![Block::Heading {
                level: 1,
                text: "Title".to_owned()
            }]
        );
        assert_eq!(
            seg("Sub\n---"),
            vec![Block::Heading {
                level: 2,
                text: "Sub".to_owned()
            }]
        );
    }

    #[test]
    fn test_setext_wins_over_later_rules() {
        assert_eq!(
            seg("# Title\n==="),
            vec![Block::Heading {
                level: 1,
                text: "# Title".to_owned()
            }]
        );
        assert_eq!(
            seg("- item\n---"),
            vec![Block::Heading {
                level: 2,
                text: "- item".to_owned()
            }]
        );
        assert_eq!(
            seg("> quote\n---\nafter"),
            vec![
                Block::Heading {
                    level: 2,
                    text: "> quote".to_owned()
                },
                paragraph_of(&["after"]),
            ]
        );
    }

    #[test]
    fn test_atx_headings() {
        assert_eq!(
            seg("### Third ###"),
            vec![Block::Heading {
                level: 3,
                text: "Third".to_owned()
            }]
        );
        assert_eq!(
            seg("# C#"),
            vec![Block::Heading {
                level: 1,
                text: "C#".to_owned()
            }]
        );
        assert_eq!(seg("#hashtag"), vec![paragraph_of(&["#hashtag"])]);
        assert_eq!(seg("####### seven"), vec![paragraph_of(&["####### seven"])]);
    }

    #[test]
    fn test_empty_atx_heading() {
        assert_eq!(
            seg("##"),
            vec![Block::Heading {
                level: 2,
                text: String::new()
            }]
        );
    }

    #[test]
    fn test_thematic_breaks() {
        for line in ["***", "- - -", "___", " * * * *"] {
            assert_eq!(seg(line), vec![Block::ThematicBreak], "{line}");
        }
        assert_eq!(seg("**"), vec![paragraph_of(&["**"])]);
        assert_eq!(seg("-*-"), vec![paragraph_of(&["-*-"])]);
    }

    #[test]
    fn test_blockquote_strips_one_level() {
        let blocks = seg("> level1\n> > level2\ntext");
        assert_eq!(
            blocks,
            vec![
                Block::Blockquote {
                    lines: vec!["level1".to_owned(), "> level2".to_owned()],
                },
                paragraph_of(&["text"]),
            ]
        );
    }

    #[test]
    fn test_table() {
        let blocks = seg("a | b\n---|---\n1 | 2\n\nafter");
        assert_eq!(
            blocks,
            vec![
                Block::Table {
                    headers: vec!["a".to_owned(), "b".to_owned()],
                    alignments: vec![Alignment::None, Alignment::None],
                    rows: vec![vec!["1".to_owned(), "2".to_owned()]],
                },
                paragraph_of(&["after"]),
            ]
        );
    }

    #[test]
    fn test_table_alignment_and_padding() {
        let blocks = seg("| l | c | r |\n|:---|:---:|---:|\n| 1 |\n| 1 | 2 | 3 | 4 |");
        assert_eq!(
            blocks,
            vec![Block::Table {
                headers: vec!["l".to_owned(), "c".to_owned(), "r".to_owned()],
                alignments: vec![Alignment::Left, Alignment::Center, Alignment::Right],
                rows: vec![
                    vec!["1".to_owned(), String::new(), String::new()],
                    vec!["1".to_owned(), "2".to_owned(), "3".to_owned()],
                ],
            }]
        );
    }

    #[test]
    fn test_table_escaped_pipe() {
        let blocks = seg(r"a | b\|c
--- | ---");
        assert_eq!(
            blocks,
            vec![Block::Table {
                headers: vec!["a".to_owned(), "b|c".to_owned()],
                alignments: vec![Alignment::None, Alignment::None],
                rows: vec![],
            }]
        );
    }

    #[test]
    fn test_invalid_separator_falls_back_to_paragraph() {
        let blocks = seg("a | b\n--|--\n1 | 2");
        assert_eq!(blocks, vec![paragraph_of(&["a | b", "--|--", "1 | 2"])]);
    }

    #[test]
    fn test_header_without_separator_is_paragraph() {
        assert_eq!(seg("a | b"), vec![paragraph_of(&["a | b"])]);
    }

    #[test]
    fn test_task_list() {
        let blocks = seg("- [x] done\n- [ ] todo\n- [X]\n- [y] no");
        assert_eq!(
            blocks,
            vec![Block::List {
                ordered: false,
                start: 1,
                items: vec![
                    ListItem {
                        text: "done".to_owned(),
                        task: Some(true)
                    },
                    ListItem {
                        text: "todo".to_owned(),
                        task: Some(false)
                    },
                    ListItem {
                        text: String::new(),
                        task: Some(true)
                    },
                    ListItem {
                        text: "[y] no".to_owned(),
                        task: None
                    },
                ],
            }]
        );
    }

    #[test]
    fn test_ordered_list_start() {
        let blocks = seg("3. three\n4) four");
        assert_eq!(
            blocks,
            vec![Block::List {
                ordered: true,
                start: 3,
                items: vec![
                    ListItem {
                        text: "three".to_owned(),
                        task: None
                    },
                    ListItem {
                        text: "four".to_owned(),
                        task: None
                    },
                ],
            }]
        );
    }

    #[test]
    fn test_list_ends_on_indent_change() {
        let blocks = seg("- a\n  - b\n- c");
        assert_eq!(blocks.len(), 3);
        assert!(matches!(&blocks[0], Block::List { items, .. } if items.len() == 1));
        assert!(matches!(&blocks[1], Block::List { items, .. } if items[0].text == "b"));
        assert!(matches!(&blocks[2], Block::List { items, .. } if items[0].text == "c"));
    }

    #[test]
    fn test_list_ends_on_family_change() {
        let blocks = seg("- a\n1. b");
        assert_eq!(blocks.len(), 2);
        assert!(matches!(&blocks[0], Block::List { ordered: false, .. }));
        assert!(matches!(&blocks[1], Block::List { ordered: true, .. }));
    }

    #[test]
    fn test_blank_line_ends_list() {
        let blocks = seg("- a\n\n- b");
        assert_eq!(blocks.len(), 2);
        assert!(matches!(&blocks[0], Block::List { ordered: false, items, .. } if items.len() == 1 && items[0].text == "a"));
        assert!(matches!(&blocks[1], Block::List { ordered: false, items, .. } if items.len() == 1 && items[0].text == "b"));

        let blocks = seg("1. a\n\n2. b");
        assert_eq!(blocks.len(), 2);
        assert!(matches!(&blocks[0], Block::List { ordered: true, start: 1, .. }));
        assert!(
            matches!(&blocks[1], Block::List { ordered: true, start: 2, items } if items[0].text == "b")
        );
    }

    #[test]
    fn test_list_requires_space_after_marker() {
        assert_eq!(seg("-a"), vec![paragraph_of(&["-a"])]);
        assert_eq!(seg("1.a"), vec![paragraph_of(&["1.a"])]);
    }

    #[test]
    fn test_paragraph_interrupted_by_block() {
        let blocks = seg("one\ntwo\n# Head\nthree\n> quote");
        assert_eq!(
            blocks,
            vec![
                paragraph_of(&["one", "two"]),
                Block::Heading {
                    level: 1,
                    text: "Head".to_owned()
                },
                paragraph_of(&["three"]),
                Block::Blockquote {
                    lines: vec!["quote".to_owned()]
                },
            ]
        );
    }

    #[test]
    fn test_start_index() {
        let lines = ["# skipped", "kept"];
        assert_eq!(segment(&lines, 1), vec![paragraph_of(&["kept"])]);
        assert_eq!(segment(&lines, 5), vec![]);
    }

    #[test]
    fn test_blank_input() {
        assert_eq!(seg(""), vec![]);
        assert_eq!(seg("\n  \n\t\n"), vec![]);
    }
}
