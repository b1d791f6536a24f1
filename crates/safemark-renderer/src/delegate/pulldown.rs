//! pulldown-cmark engine.

use std::sync::LazyLock;

use pulldown_cmark::{CowStr, Event, LinkType, Options, Parser, Tag, TagEnd, TextMergeStream, html};
use regex::Regex;

use super::{EngineConfig, Extension, Installer, MarkdownEngine, enable_extension};
use crate::fallback::url_end;
use crate::safety::validate_href;

static BARE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"'`]+"#).unwrap());

/// CommonMark engine backed by `pulldown-cmark`.
///
/// Highlight, abbreviations and containers are not provided.
#[derive(Debug, Clone, Copy, Default)]
pub struct PulldownEngine;

impl PulldownEngine {
    fn parser_options(config: &EngineConfig) -> Options {
        let mut options = Options::empty();
        if config.tables {
            options.insert(Options::ENABLE_TABLES);
        }
        if config.strikethrough {
            options.insert(Options::ENABLE_STRIKETHROUGH);
        }
        if config.typographer {
            options.insert(Options::ENABLE_SMART_PUNCTUATION);
        }
        for extension in config.extensions() {
            match extension {
                Extension::Footnotes => options.insert(Options::ENABLE_FOOTNOTES),
                Extension::TaskLists => options.insert(Options::ENABLE_TASKLISTS),
                Extension::DefinitionLists => options.insert(Options::ENABLE_DEFINITION_LIST),
                Extension::SubSuperscript => {
                    options.insert(Options::ENABLE_SUPERSCRIPT | Options::ENABLE_SUBSCRIPT);
                }
                Extension::Attributes => options.insert(Options::ENABLE_HEADING_ATTRIBUTES),
                Extension::Highlight | Extension::Abbreviations | Extension::Containers => {}
            }
        }
        options
    }
}

impl MarkdownEngine for PulldownEngine {
    fn name(&self) -> &'static str {
        "pulldown-cmark"
    }

    fn capability(&self, extension: Extension) -> Option<Installer> {
        match extension {
            Extension::Footnotes
            | Extension::TaskLists
            | Extension::DefinitionLists
            | Extension::SubSuperscript
            | Extension::Attributes => Some(enable_extension as Installer),
            Extension::Highlight | Extension::Abbreviations | Extension::Containers => None,
        }
    }

    fn render(&self, source: &str, config: &EngineConfig) -> String {
        let parser = Parser::new_ext(source, Self::parser_options(config));
        let mut rewriter = EventRewriter::new(config);
        let events = TextMergeStream::new(parser).flat_map(|event| rewriter.rewrite(event));

        let mut output = String::with_capacity(source.len() * 3 / 2);
        html::push_html(&mut output, events);
        output
    }
}

/// Applies the link policy and the output options to the event stream.
struct EventRewriter<'c> {
    config: &'c EngineConfig,
    link_depth: usize,
    image_depth: usize,
    in_code_block: bool,
}

impl<'c> EventRewriter<'c> {
    fn new(config: &'c EngineConfig) -> Self {
        Self {
            config,
            link_depth: 0,
            image_depth: 0,
            in_code_block: false,
        }
    }

    fn rewrite<'a>(&mut self, event: Event<'a>) -> Vec<Event<'a>> {
        match event {
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            }) => {
                self.link_depth += 1;
                vec![Event::Start(Tag::Link {
                    link_type,
                    dest_url: self.link_destination(dest_url),
                    title,
                    id,
                })]
            }
            Event::End(TagEnd::Link) => {
                self.link_depth = self.link_depth.saturating_sub(1);
                vec![Event::End(TagEnd::Link)]
            }
            Event::Start(Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            }) => {
                self.image_depth += 1;
                vec![Event::Start(Tag::Image {
                    link_type,
                    dest_url: self.image_source(dest_url),
                    title,
                    id,
                })]
            }
            Event::End(TagEnd::Image) => {
                self.image_depth = self.image_depth.saturating_sub(1);
                vec![Event::End(TagEnd::Image)]
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                self.in_code_block = true;
                vec![Event::Start(Tag::CodeBlock(kind))]
            }
            Event::End(TagEnd::CodeBlock) => {
                self.in_code_block = false;
                vec![Event::End(TagEnd::CodeBlock)]
            }
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                // Arbitrary key=value pairs could become event handlers.
                let attrs = if self.config.html { attrs } else { Vec::new() };
                vec![Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                })]
            }
            Event::Html(raw) | Event::InlineHtml(raw) if !self.config.html => {
                vec![Event::Text(raw)]
            }
            Event::SoftBreak if self.config.breaks => vec![Event::HardBreak],
            Event::Text(text) if self.should_linkify() => linkify(text, self.config),
            other => vec![other],
        }
    }

    fn should_linkify(&self) -> bool {
        self.config.linkify && self.link_depth == 0 && self.image_depth == 0 && !self.in_code_block
    }

    fn link_destination<'a>(&self, dest_url: CowStr<'a>) -> CowStr<'a> {
        if self.config.allow_unsafe_links {
            return dest_url;
        }
        let safe = validate_href(&dest_url, false);
        if safe.is_allowed() {
            dest_url
        } else {
            tracing::debug!(href = %dest_url, "Rejected link destination");
            CowStr::Borrowed("#")
        }
    }

    fn image_source<'a>(&self, dest_url: CowStr<'a>) -> CowStr<'a> {
        if self.config.allow_unsafe_links || validate_href(&dest_url, false).is_allowed() {
            dest_url
        } else {
            tracing::debug!(src = %dest_url, "Rejected image source");
            CowStr::Borrowed("")
        }
    }
}

/// Split a text event around bare `http(s)` URLs, wrapping each in a link.
fn linkify<'a>(text: CowStr<'a>, config: &EngineConfig) -> Vec<Event<'a>> {
    if !text.contains("://") {
        return vec![Event::Text(text)];
    }

    let mut events = Vec::new();
    let mut last = 0;
    for found in BARE_URL.find_iter(&text) {
        let url = &found.as_str()[..url_end(found.as_str())];
        if url.len() <= "https://".len()
            || !validate_href(url, config.allow_unsafe_links).is_allowed()
        {
            continue;
        }
        if found.start() > last {
            events.push(Event::Text(CowStr::from(text[last..found.start()].to_owned())));
        }
        events.push(Event::Start(Tag::Link {
            link_type: LinkType::Autolink,
            dest_url: CowStr::from(url.to_owned()),
            title: CowStr::Borrowed(""),
            id: CowStr::Borrowed(""),
        }));
        events.push(Event::Text(CowStr::from(url.to_owned())));
        events.push(Event::End(TagEnd::Link));
        last = found.start() + url.len();
    }

    if last == 0 {
        return vec![Event::Text(text)];
    }
    if last < text.len() {
        events.push(Event::Text(CowStr::from(text[last..].to_owned())));
    }
    events
}
