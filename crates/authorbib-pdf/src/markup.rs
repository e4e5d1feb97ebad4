//! Citation markup parser
//!
//! Zotero returns each citation as a CSL XHTML fragment such as
//! `<div class="csl-entry">Doe, John. 2020. <i>Title</i>.</div>`. This module
//! turns that fragment into [`Inline`] nodes. HTML named entities such as
//! `&nbsp;` are decoded. Fragments that are not well-formed XML are reduced
//! to their tag-stripped text.

use quick_xml::escape::{resolve_html5_entity, unescape_with};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use authorbib_ast::{FormatType, Inline, Link};

use crate::error::Result;

const NO_BREAK_SPACE: char = '\u{a0}';

/// Longest entity name considered when decoding loose text
const MAX_ENTITY_LEN: usize = 32;

/// Parser for CSL citation fragments
pub struct MarkupParser;

/// An element still waiting for its end tag
enum Frame {
    /// Element without visual meaning (`div`, `p`, plain `span`)
    Container { block: bool },
    Format(FormatType),
    Link(String),
}

impl MarkupParser {
    /// Parse a citation, degrading to plain text on malformed markup
    pub fn parse(citation: &str) -> Vec<Inline> {
        match Self::parse_xml(citation) {
            Ok(inlines) => inlines,
            Err(e) => {
                debug!(error = %e, "citation is not well-formed, using plain text");
                let text = collapse_whitespace(&decode_entities(&strip_tags(citation)));
                let text = text.trim();
                if text.is_empty() {
                    Vec::new()
                } else {
                    vec![Inline::text(text)]
                }
            }
        }
    }

    /// Strict parse; fails on malformed XML, bare `&` or unknown entities
    pub fn parse_xml(citation: &str) -> Result<Vec<Inline>> {
        let mut reader = Reader::from_str(citation);
        reader.config_mut().trim_text(false);

        // Bottom of the stack collects top-level content
        let mut stack: Vec<(Frame, Vec<Inline>)> =
            vec![(Frame::Container { block: false }, Vec::new())];

        loop {
            match reader.read_event()? {
                Event::Start(ref e) => stack.push((frame_for(e), Vec::new())),
                Event::Empty(ref e) => {
                    if e.local_name().as_ref() == b"br" {
                        push_inline(&mut stack, Inline::text(" "));
                    }
                }
                Event::End(_) => {
                    if stack.len() > 1 {
                        close_frame(&mut stack);
                    }
                }
                Event::Text(ref e) => {
                    let text = e.unescape_with(resolve_html5_entity)?;
                    push_inline(&mut stack, Inline::text(text));
                }
                Event::CData(ref e) => {
                    let text = String::from_utf8_lossy(e).into_owned();
                    push_inline(&mut stack, Inline::Text(text));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        // Unclosed elements at the end of input
        while stack.len() > 1 {
            close_frame(&mut stack);
        }
        let inlines = stack.pop().map(|(_, inlines)| inlines).unwrap_or_default();
        Ok(normalize(inlines))
    }
}

fn frame_for(e: &BytesStart<'_>) -> Frame {
    match e.local_name().as_ref() {
        b"i" | b"em" => Frame::Format(FormatType::Italic),
        b"b" | b"strong" => Frame::Format(FormatType::Bold),
        b"sup" => Frame::Format(FormatType::Superscript),
        b"sub" => Frame::Format(FormatType::Subscript),
        b"a" => match attribute(e, b"href") {
            Some(href) if !href.trim().is_empty() => Frame::Link(href.trim().to_string()),
            _ => Frame::Container { block: false },
        },
        b"span" => match attribute(e, b"style").as_deref().and_then(style_format) {
            Some(format) => Frame::Format(format),
            None => Frame::Container { block: false },
        },
        b"div" | b"p" => Frame::Container { block: true },
        _ => Frame::Container { block: false },
    }
}

fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| {
            a.unescape_value_with(resolve_html5_entity)
                .ok()
                .map(|v| v.to_string())
        })
}

/// Formatting expressed through an inline `style` attribute
fn style_format(style: &str) -> Option<FormatType> {
    let style: String = style
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    if style.contains("font-style:italic") || style.contains("font-style:oblique") {
        Some(FormatType::Italic)
    } else if style.contains("font-weight:bold") {
        Some(FormatType::Bold)
    } else if style.contains("font-variant:small-caps") {
        Some(FormatType::SmallCaps)
    } else if style.contains("vertical-align:super") {
        Some(FormatType::Superscript)
    } else if style.contains("vertical-align:sub") {
        Some(FormatType::Subscript)
    } else {
        None
    }
}

fn push_inline(stack: &mut [(Frame, Vec<Inline>)], inline: Inline) {
    if let Some((_, children)) = stack.last_mut() {
        children.push(inline);
    }
}

fn close_frame(stack: &mut Vec<(Frame, Vec<Inline>)>) {
    let Some((frame, children)) = stack.pop() else {
        return;
    };
    match frame {
        Frame::Container { block } => {
            for child in children {
                push_inline(stack, child);
            }
            // Keeps "[1]" and the entry text of numeric styles apart
            if block {
                push_inline(stack, Inline::text(" "));
            }
        }
        Frame::Format(format) => push_inline(stack, Inline::Format(format, children)),
        Frame::Link(url) => push_inline(stack, Inline::Link(Link { url, text: children })),
    }
}

/// Collapse whitespace, merge adjacent text and trim the outer edges
fn normalize(inlines: Vec<Inline>) -> Vec<Inline> {
    let mut out = normalize_run(inlines);

    if let Some(Inline::Text(first)) = out.first_mut() {
        *first = first.trim_start().to_string();
    }
    if let Some(Inline::Text(last)) = out.last_mut() {
        *last = last.trim_end().to_string();
    }
    out.retain(|i| !matches!(i, Inline::Text(t) if t.is_empty()));
    out
}

fn normalize_run(inlines: Vec<Inline>) -> Vec<Inline> {
    let mut out: Vec<Inline> = Vec::with_capacity(inlines.len());
    for inline in inlines {
        let inline = match inline {
            Inline::Text(text) => Inline::Text(collapse_whitespace(&text)),
            Inline::Format(format, children) => Inline::Format(format, normalize_run(children)),
            Inline::Link(link) => Inline::Link(Link {
                url: link.url,
                text: normalize_run(link.text),
            }),
        };

        match (out.last_mut(), inline) {
            (Some(Inline::Text(prev)), Inline::Text(text)) => {
                if prev.ends_with(' ') && text.starts_with(' ') {
                    prev.push_str(&text[1..]);
                } else {
                    prev.push_str(&text);
                }
            }
            (_, inline) => out.push(inline),
        }
    }
    out
}

/// Collapse runs of whitespace into one space; no-break spaces are kept
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() && c != NO_BREAK_SPACE {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Remove anything between `<` and `>`
fn strip_tags(markup: &str) -> String {
    let mut text = String::with_capacity(markup.len());
    let mut in_tag = false;
    for c in markup.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text
}

/// Decode every recognizable `&name;` / `&#n;` reference, leaving bare `&` as is
fn decode_entities(text: &str) -> String {
    if let Ok(decoded) = unescape_with(text, resolve_html5_entity) {
        return decoded.into_owned();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let reference = rest[1..]
            .char_indices()
            .take(MAX_ENTITY_LEN + 1)
            .find(|&(_, c)| c == ';' || c == '&' || c.is_whitespace())
            .filter(|&(_, c)| c == ';')
            .map(|(end, _)| &rest[..end + 2]);

        let decoded = reference.and_then(|r| {
            unescape_with(r, resolve_html5_entity)
                .ok()
                .map(|d| (r.len(), d.into_owned()))
        });
        match decoded {
            Some((len, entity)) => {
                out.push_str(&entity);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
