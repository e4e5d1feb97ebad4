//! Bibliographic data model
//!
//! Items are fetched once per run and only ever read afterwards. An
//! [`AuthorBibliography`] borrows the items it matched, so the fetched set
//! is shared read-only across all authors of a run.

use serde::{Deserialize, Serialize};

/// Contribution role of a creator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Author,
    Editor,
    Other,
}

impl Role {
    /// Map a Zotero `creatorType` to a role
    pub fn from_creator_type(creator_type: &str) -> Self {
        match creator_type {
            "author" => Role::Author,
            "editor" => Role::Editor,
            _ => Role::Other,
        }
    }
}

/// A named contributor to an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub name: String,
    pub role: Role,
}

impl Creator {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }

    /// Shorthand for an author-role creator
    pub fn author(name: impl Into<String>) -> Self {
        Self::new(name, Role::Author)
    }
}

/// One item of the source library with its pre-formatted citation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BibliographicItem {
    /// Source key (Zotero item key)
    pub key: String,
    /// Item title, for diagnostics
    #[serde(default)]
    pub title: Option<String>,
    /// Zotero `itemType` such as `book` or `journalArticle`
    #[serde(default)]
    pub item_type: Option<String>,
    /// Citation formatted in the run's citation style
    pub citation_text: String,
    /// Creators in source order
    pub creators: Vec<Creator>,
}

impl BibliographicItem {
    /// Creators with the author role
    pub fn authors(&self) -> impl Iterator<Item = &Creator> {
        self.creators.iter().filter(|c| c.role == Role::Author)
    }
}

/// The items matched to one author, in source order
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorBibliography<'a> {
    pub author_slug: &'a str,
    pub matched_items: Vec<&'a BibliographicItem>,
}

impl<'a> AuthorBibliography<'a> {
    /// Citation strings in display order
    pub fn citations(&self) -> Vec<&'a str> {
        self.matched_items
            .iter()
            .map(|item| item.citation_text.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.matched_items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matched_items.is_empty()
    }
}
