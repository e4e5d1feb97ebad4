//! authorbib-pdf - PDF bibliographies via Typst
//!
//! This crate turns an author's matched citations into a PDF, using Typst
//! as the typesetting backend.
//!
//! # Architecture
//!
//! The PDF generation pipeline consists of three stages:
//!
//! 1. **MarkupParser** - Parses CSL citation HTML into `authorbib_ast::Inline`
//! 2. **Transpiler** - Converts a `BibliographyDocument` to Typst markup
//! 3. **Compiler** - Compiles Typst markup to PDF bytes
//!
//! [`TypstRenderer`] wires the three together behind
//! [`authorbib_core::BibliographyRenderer`].
//!
//! # Example
//!
//! ```ignore
//! use authorbib_ast::{BibliographyDocument, Entry};
//! use authorbib_pdf::{render_pdf, MarkupParser};
//!
//! let mut doc = BibliographyDocument::with_titles("Library", "Bibliography of John Doe");
//! doc.push(Entry::new(MarkupParser::parse("Doe, John. <i>A Book</i>.")));
//! let pdf_bytes = render_pdf(&doc)?;
//! ```

mod compiler;
mod error;
mod markup;
mod transpiler;

use std::path::PathBuf;

use authorbib_ast::{BibliographyDocument, DocumentMeta, Entry};
use authorbib_core::{BibliographyRenderer, Config, RenderError, RenderRequest};

pub use compiler::Compiler;
pub use error::{PdfError, Result};
pub use markup::MarkupParser;
pub use transpiler::Transpiler;

/// Timestamp format of the footer
pub const FOOTER_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Convenience function to render a document to PDF
pub fn render_pdf(doc: &BibliographyDocument) -> Result<Vec<u8>> {
    let typst_markup = Transpiler::transpile(doc);
    Compiler::compile(&typst_markup)
}

/// Renders author bibliographies with Typst
#[derive(Debug, Clone, Default)]
pub struct TypstRenderer {
    /// Heading above every bibliography
    title: Option<String>,
    citation_style: String,
    locale: String,
    font_paths: Vec<PathBuf>,
}

impl TypstRenderer {
    pub fn new(citation_style: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            title: None,
            citation_style: citation_style.into(),
            locale: locale.into(),
            font_paths: Vec::new(),
        }
    }

    /// Renderer for a validated run configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            title: config.title.clone(),
            citation_style: config.citation_style.clone(),
            locale: config.locale.clone(),
            font_paths: config.font_paths.clone(),
        }
    }

    /// Set the heading printed above every bibliography
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Add font files available to Typst
    pub fn with_font_paths(mut self, font_paths: Vec<PathBuf>) -> Self {
        self.font_paths = font_paths;
        self
    }

    /// Build the document for one author, entries in matched order
    pub fn document(&self, request: &RenderRequest<'_>) -> BibliographyDocument {
        let metadata = DocumentMeta {
            title: self.title.clone(),
            subtitle: Some(format!(
                "Bibliography of {}",
                request.author.display_name()
            )),
            locale: Some(self.locale.clone()).filter(|l| !l.is_empty()),
            citation_style: Some(self.citation_style.clone()).filter(|s| !s.is_empty()),
            generated_at: Some(request.generated_at.format(FOOTER_TIME_FORMAT).to_string()),
        };

        let entries = request
            .bibliography
            .citations()
            .into_iter()
            .map(|citation| Entry::new(MarkupParser::parse(citation)))
            .collect();

        BibliographyDocument { metadata, entries }
    }
}

impl BibliographyRenderer for TypstRenderer {
    fn render(&self, request: &RenderRequest<'_>) -> std::result::Result<Vec<u8>, RenderError> {
        let doc = self.document(request);
        let markup = Transpiler::transpile(&doc);
        tracing::debug!(
            author = %request.author.slug,
            entries = doc.len(),
            "compiling bibliography"
        );
        let pdf = Compiler::compile_with_fonts(&markup, &self.font_paths)?;
        Ok(pdf)
    }
}
