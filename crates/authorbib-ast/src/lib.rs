//! authorbib-ast - Structured markup for bibliographies
//!
//! This crate provides the intermediate document model that sits between
//! pre-formatted citation strings and the PDF backend. A citation is parsed
//! into [`Inline`] nodes, grouped into [`Entry`] values, and collected in a
//! [`BibliographyDocument`] that a backend turns into its own markup.

pub mod document;
pub mod inline;

pub use document::{BibliographyDocument, DocumentMeta, Entry};
pub use inline::{FormatType, Inline, Link};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
