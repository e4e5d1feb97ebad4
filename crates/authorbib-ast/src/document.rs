//! Bibliography document root and metadata

use serde::{Deserialize, Serialize};

use crate::inline::Inline;

/// A complete bibliography for one author
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BibliographyDocument {
    /// Document metadata (titles, footer data)
    pub metadata: DocumentMeta,
    /// Entries in display order
    pub entries: Vec<Entry>,
}

/// Document metadata
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentMeta {
    /// Main heading (e.g. the project or library name)
    pub title: Option<String>,
    /// Secondary heading, usually "Bibliography of <author>"
    pub subtitle: Option<String>,
    /// Language tag for hyphenation and quotes (e.g. "de-DE")
    pub locale: Option<String>,
    /// Citation style the entries were formatted with
    pub citation_style: Option<String>,
    /// Generation time, already formatted for display
    pub generated_at: Option<String>,
}

/// One formatted citation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Entry {
    /// Citation content
    pub inlines: Vec<Inline>,
}

impl BibliographyDocument {
    /// Create a new empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document with a title and subtitle
    pub fn with_titles(title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        Self {
            metadata: DocumentMeta {
                title: Some(title.into()),
                subtitle: Some(subtitle.into()),
                ..Default::default()
            },
            entries: Vec::new(),
        }
    }

    /// Add an entry to the document
    pub fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    /// Check if the document has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Entry {
    /// Create an entry from inline content
    pub fn new(inlines: Vec<Inline>) -> Self {
        Self { inlines }
    }

    /// Visible text of the entry
    pub fn plain_text(&self) -> String {
        self.inlines.iter().map(Inline::plain_text).collect()
    }
}
