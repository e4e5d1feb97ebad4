//! authorbib-core - Per-author bibliographies from a shared library
//!
//! Core library for authorbib: decides which library items belong to which
//! author and where each author's PDF is written.
//!
//! # Pipeline
//!
//! ```text
//! ItemSource ──fetch once──▶ items ──Matcher (per author)──▶ AuthorBibliography
//!                                                              │
//!                       BibliographyRenderer ◀─────────────────┘
//!                                │ PDF bytes
//!                                ▼
//!                PathResolver ──▶ writer (permalink + history)
//! ```
//!
//! The HTTP source and the PDF backend live in their own crates and plug in
//! through the [`ItemSource`] and [`BibliographyRenderer`] traits.
//!
//! # Example
//!
//! ```
//! use authorbib_core::{match_items, AuthorConfig, BibliographicItem, Creator};
//!
//! let author = AuthorConfig::new("john-doe", ["John Doe"]);
//! let items = vec![BibliographicItem {
//!     key: "ITEM1".to_string(),
//!     title: None,
//!     item_type: Some("book".to_string()),
//!     citation_text: "Doe, John. 2020. A Book.".to_string(),
//!     creators: vec![Creator::author("john doe")],
//! }];
//!
//! let bib = match_items(&items, &author);
//! assert_eq!(bib.citations(), vec!["Doe, John. 2020. A Book."]);
//! ```

pub mod config;
pub mod error;
pub mod matcher;
pub mod model;
pub mod paths;
pub mod pipeline;
pub mod registry;
pub mod writer;

// Re-export main types and functions
pub use config::{Config, DeploymentOverrides, Settings};
pub use error::{AuthorError, ConfigError, RenderError, SourceError, WriteError};
pub use matcher::{match_all, match_items, normalize_name, MatchSummary, Matcher};
pub use model::{AuthorBibliography, BibliographicItem, Creator, Role};
pub use paths::{FilenameTemplate, OutputLayout, OutputTarget, PathResolver};
pub use pipeline::{
    AuthorOutcome, BibliographyRenderer, FetchQuery, HistoryStatus, ItemSource, Pipeline,
    RenderRequest, RunReport,
};
pub use registry::{AuthorConfig, AuthorRegistry};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
