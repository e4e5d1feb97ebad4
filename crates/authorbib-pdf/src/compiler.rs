//! Typst to PDF compiler
//!
//! Compiles Typst markup to PDF bytes using typst-as-lib.

use std::path::{Path, PathBuf};

use typst_as_lib::typst_kit_options::TypstKitFontOptions;
use typst_as_lib::TypstEngine;

use crate::error::{PdfError, Result};

/// Compiler for converting Typst markup to PDF
pub struct Compiler;

impl Compiler {
    /// Compile Typst markup to PDF bytes
    pub fn compile(markup: &str) -> Result<Vec<u8>> {
        Self::compile_with_fonts(markup, &[])
    }

    /// Compile with additional font files
    ///
    /// Typst's embedded fonts and the system fonts are always searched; the
    /// files in `font_paths` are added on top.
    ///
    /// # Arguments
    /// * `markup` - Typst markup string
    /// * `font_paths` - Paths to `.ttf`/`.otf` files to make available
    pub fn compile_with_fonts(markup: &str, font_paths: &[PathBuf]) -> Result<Vec<u8>> {
        let fonts = load_fonts(font_paths)?;

        let mut builder = TypstEngine::builder()
            .main_file(markup.to_string())
            .search_fonts_with(
                TypstKitFontOptions::default()
                    .include_system_fonts(true)
                    .include_embedded_fonts(true),
            );
        if !fonts.is_empty() {
            builder = builder.fonts(fonts);
        }
        let engine = builder.build();

        // Warned<Result<Document, Error>>
        let compiled = engine.compile();
        for warning in &compiled.warnings {
            tracing::warn!(warning = %warning.message, "typst warning");
        }
        let document = compiled
            .output
            .map_err(|e| PdfError::Compilation(format!("{:?}", e)))?;

        let options = typst_pdf::PdfOptions::default();
        let pdf_bytes = typst_pdf::pdf(&document, &options)
            .map_err(|e| PdfError::Compilation(format!("PDF generation failed: {:?}", e)))?;

        Ok(pdf_bytes.into())
    }
}

fn load_fonts(font_paths: &[PathBuf]) -> Result<Vec<Vec<u8>>> {
    font_paths.iter().map(|p| read_font(p)).collect()
}

fn read_font(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| PdfError::Font(format!("Failed to read font {}: {}", path.display(), e)))
}
