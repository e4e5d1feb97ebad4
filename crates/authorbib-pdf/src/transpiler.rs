//! Bibliography to Typst markup transpiler
//!
//! Converts a [`BibliographyDocument`] into a single Typst source file:
//! page setup with the footer, the headings, then one hanging-indent
//! paragraph per entry.

use authorbib_ast::{BibliographyDocument, DocumentMeta, FormatType, Inline};

/// Indent of continuation lines in an entry
const HANGING_INDENT: &str = "1.5em";

/// Transpiler for converting a bibliography to Typst markup
pub struct Transpiler;

impl Transpiler {
    /// Transpile a document to Typst markup
    pub fn transpile(doc: &BibliographyDocument) -> String {
        let entries: Vec<String> = doc
            .entries
            .iter()
            .map(|entry| Self::transpile_inlines(&entry.inlines))
            .filter(|text| !text.trim().is_empty())
            .collect();

        let mut output = String::new();
        output.push_str(&Self::transpile_preamble(&doc.metadata, entries.len()));

        if let Some(ref title) = doc.metadata.title {
            output.push_str(&format!("= {}\n\n", escape_markup(title)));
        }
        if let Some(ref subtitle) = doc.metadata.subtitle {
            output.push_str(&format!("== {}\n\n", escape_markup(subtitle)));
        }

        for text in &entries {
            output.push_str(&escape_line_start(text));
            output.push_str("\n\n");
        }

        output
    }

    /// Document, page and paragraph setup
    fn transpile_preamble(meta: &DocumentMeta, count: usize) -> String {
        let mut output = String::new();

        if let Some(title) = meta.title.as_ref().or(meta.subtitle.as_ref()) {
            output.push_str(&format!(
                "#set document(title: \"{}\")\n",
                escape_string(title)
            ));
        }

        if let Some((lang, region)) = meta.locale.as_deref().and_then(split_locale) {
            match region {
                Some(region) => output.push_str(&format!(
                    "#set text(lang: \"{}\", region: \"{}\")\n",
                    lang, region
                )),
                None => output.push_str(&format!("#set text(lang: \"{}\")\n", lang)),
            }
        }

        output.push_str(&format!(
            "#set page(paper: \"a4\", margin: 2.5cm, footer: align(center, text(size: 8pt)[{}]))\n",
            escape_markup(&Self::footer_text(meta, count))
        ));
        output.push_str(&format!(
            "#set par(justify: false, hanging-indent: {})\n\n",
            HANGING_INDENT
        ));

        output
    }

    /// "Generated on ... | n items | style style"
    pub fn footer_text(meta: &DocumentMeta, count: usize) -> String {
        let mut parts = Vec::new();
        if let Some(ref generated_at) = meta.generated_at {
            parts.push(format!("Generated on {}", generated_at));
        }
        parts.push(format!(
            "{} {}",
            count,
            if count == 1 { "item" } else { "items" }
        ));
        if let Some(ref style) = meta.citation_style {
            parts.push(format!("{} style", style));
        }
        parts.join(" | ")
    }

    /// Transpile inline elements
    fn transpile_inlines(inlines: &[Inline]) -> String {
        let mut output = String::new();

        for inline in inlines {
            output.push_str(&Self::transpile_inline(inline));
        }

        output
    }

    /// Transpile a single inline element
    fn transpile_inline(inline: &Inline) -> String {
        match inline {
            Inline::Text(text) => escape_markup(text),

            Inline::Format(format_type, content) => {
                let inner = Self::transpile_inlines(content);
                if inner.trim().is_empty() {
                    return inner;
                }
                match format_type {
                    FormatType::Bold => format!("#strong[{}]", inner),
                    FormatType::Italic => format!("#emph[{}]", inner),
                    FormatType::SmallCaps => format!("#smallcaps[{}]", inner),
                    FormatType::Superscript => format!("#super[{}]", inner),
                    FormatType::Subscript => format!("#sub[{}]", inner),
                }
            }

            Inline::Link(link) => {
                let text = Self::transpile_inlines(&link.text);
                if text.is_empty() {
                    format!("#link(\"{}\")", escape_string(&link.url))
                } else {
                    format!("#link(\"{}\")[{}]", escape_string(&link.url), text)
                }
            }
        }
    }
}

/// Split "de-DE" into ("de", Some("DE")); rejects anything Typst would not accept
fn split_locale(locale: &str) -> Option<(String, Option<String>)> {
    let mut parts = locale.trim().split(['-', '_']);
    let lang = parts.next()?.to_lowercase();
    if !(2..=3).contains(&lang.len()) || !lang.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let region = parts
        .next()
        .filter(|r| r.len() == 2 && r.chars().all(|c| c.is_ascii_alphabetic()))
        .map(|r| r.to_uppercase());
    Some((lang, region))
}

/// Escape special characters in strings for Typst
fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Escape text for Typst markup mode
fn escape_markup(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' | '*' | '_' | '#' | '$' | '@' | '<' | '>' | '[' | ']' | '`' | '~' | '/' => {
                out.push('\\');
                out.push(c);
            }
            '\n' | '\r' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}

/// Keep the start of an entry from being read as a heading, list or enum marker
fn escape_line_start(line: &str) -> String {
    if line.starts_with(['=', '-', '+']) {
        return format!("\\{}", line);
    }
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 && line[digits..].starts_with('.') {
        return format!("{}\\{}", &line[..digits], &line[digits..]);
    }
    line.to_string()
}
