//! Error types for PDF generation

use authorbib_core::RenderError;
use thiserror::Error;

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Errors that can occur during PDF generation
#[derive(Error, Debug)]
pub enum PdfError {
    /// Typst compilation error
    #[error("Typst compilation failed: {0}")]
    Compilation(String),

    /// Font loading error
    #[error("Font error: {0}")]
    Font(String),

    /// Citation markup is not well-formed
    #[error("Citation markup error: {0}")]
    Markup(#[from] quick_xml::Error),
}

impl From<PdfError> for RenderError {
    fn from(err: PdfError) -> Self {
        RenderError(err.to_string())
    }
}
