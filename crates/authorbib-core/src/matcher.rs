//! Author matching
//!
//! An item belongs to an author's bibliography iff at least one creator
//! with the author role has a normalized name equal to one of the author's
//! normalized identifiers. Normalization is trimming plus Unicode
//! lowercasing; there is no partial or fuzzy matching, so every spelling in
//! use must be listed as an identifier.
//!
//! Matching runs independently per author. An item with several matching
//! authors appears in each of their bibliographies.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::model::{AuthorBibliography, BibliographicItem, Creator};
use crate::registry::{AuthorConfig, AuthorRegistry};

/// Normalize a name for comparison
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Matches items against one author's identifiers
#[derive(Debug, Clone)]
pub struct Matcher<'a> {
    author: &'a AuthorConfig,
    identifiers: HashSet<String>,
}

impl<'a> Matcher<'a> {
    pub fn new(author: &'a AuthorConfig) -> Self {
        let identifiers = author
            .identifiers
            .iter()
            .map(|i| normalize_name(i))
            .collect();
        Self {
            author,
            identifiers,
        }
    }

    pub fn author(&self) -> &'a AuthorConfig {
        self.author
    }

    /// The first author-role creator of `item` that identifies this author
    pub fn matching_creator<'i>(&self, item: &'i BibliographicItem) -> Option<&'i Creator> {
        item.authors()
            .find(|creator| self.identifiers.contains(&normalize_name(&creator.name)))
    }

    pub fn matches(&self, item: &BibliographicItem) -> bool {
        self.matching_creator(item).is_some()
    }

    /// Filter `items` down to this author's bibliography, keeping source order
    pub fn bibliography<'i>(&self, items: &'i [BibliographicItem]) -> AuthorBibliography<'i>
    where
        'a: 'i,
    {
        let matched_items = items
            .iter()
            .filter(|item| match self.matching_creator(item) {
                Some(creator) => {
                    debug!(
                        author = %self.author.slug,
                        item = %item.key,
                        creator = %creator.name,
                        "matched item"
                    );
                    true
                }
                None => false,
            })
            .collect();

        AuthorBibliography {
            author_slug: &self.author.slug,
            matched_items,
        }
    }
}

/// Match `items` against a single author
pub fn match_items<'i>(
    items: &'i [BibliographicItem],
    author: &'i AuthorConfig,
) -> AuthorBibliography<'i> {
    Matcher::new(author).bibliography(items)
}

/// Match `items` against every author, in registry order
pub fn match_all<'i>(
    items: &'i [BibliographicItem],
    registry: &'i AuthorRegistry,
) -> Vec<AuthorBibliography<'i>> {
    registry
        .iter()
        .map(|author| match_items(items, author))
        .collect()
}

/// Breakdown key for items without an `itemType`
pub const UNKNOWN_ITEM_TYPE: &str = "unknown";

/// Aggregate numbers over a set of bibliographies
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    pub total_items: usize,
    pub total_authors: usize,
    pub authors_with_items: usize,
    pub total_matched_items: usize,
    /// Items that matched no configured author
    pub unmatched_items: usize,
    /// Matched item count per author slug
    pub per_author: BTreeMap<String, usize>,
    /// Matched items per author slug, counted by item type
    pub item_types: BTreeMap<String, BTreeMap<String, usize>>,
}

impl MatchSummary {
    pub fn new(items: &[BibliographicItem], bibliographies: &[AuthorBibliography<'_>]) -> Self {
        let mut matched_keys = HashSet::new();
        let mut per_author = BTreeMap::new();
        let mut item_types = BTreeMap::new();

        for bib in bibliographies {
            per_author.insert(bib.author_slug.to_string(), bib.len());
            let mut types = BTreeMap::new();
            for item in &bib.matched_items {
                matched_keys.insert(item.key.as_str());
                let item_type = item.item_type.as_deref().unwrap_or(UNKNOWN_ITEM_TYPE);
                *types.entry(item_type.to_string()).or_insert(0) += 1;
            }
            item_types.insert(bib.author_slug.to_string(), types);
        }

        Self {
            total_items: items.len(),
            total_authors: bibliographies.len(),
            authors_with_items: bibliographies.iter().filter(|b| !b.is_empty()).count(),
            total_matched_items: bibliographies.iter().map(AuthorBibliography::len).sum(),
            unmatched_items: items.len().saturating_sub(matched_keys.len()),
            per_author,
            item_types,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;

    fn item(key: &str, creators: Vec<Creator>) -> BibliographicItem {
        BibliographicItem {
            key: key.to_string(),
            title: None,
            item_type: None,
            citation_text: format!("citation {}", key),
            creators,
        }
    }

    fn typed(key: &str, item_type: &str, creators: Vec<Creator>) -> BibliographicItem {
        BibliographicItem {
            item_type: Some(item_type.to_string()),
            ..item(key, creators)
        }
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Anna Müller "), "anna müller");
        assert_eq!(normalize_name("ANNA MÜLLER"), "anna müller");
    }

    #[test]
    fn test_case_insensitive_exact_match() {
        let author = AuthorConfig::new("anna", ["Anna Müller"]);
        let matcher = Matcher::new(&author);

        assert!(matcher.matches(&item("1", vec![Creator::author("anna müller")])));
        assert!(matcher.matches(&item("2", vec![Creator::author(" ANNA MÜLLER ")])));
    }

    #[test]
    fn test_no_partial_match() {
        let author = AuthorConfig::new("anna", ["Müller"]);
        let matcher = Matcher::new(&author);

        assert!(!matcher.matches(&item("1", vec![Creator::author("Anna Müller")])));
        assert!(!matcher.matches(&item("2", vec![Creator::author("Müllerová")])));
    }

    #[test]
    fn test_only_author_role_counts() {
        let author = AuthorConfig::new("jane", ["Jane Roe"]);
        let matcher = Matcher::new(&author);

        assert!(!matcher.matches(&item("1", vec![Creator::new("Jane Roe", Role::Editor)])));
        assert!(!matcher.matches(&item("2", vec![Creator::new("Jane Roe", Role::Other)])));
        assert!(!matcher.matches(&item("3", Vec::new())));
    }

    #[test]
    fn test_matching_creator_reports_first_hit() {
        let author = AuthorConfig::new("anna", ["Anna Müller", "A. Mueller"]);
        let matcher = Matcher::new(&author);
        let it = item(
            "1",
            vec![
                Creator::author("Someone Else"),
                Creator::author("A. Mueller"),
                Creator::author("Anna Müller"),
            ],
        );
        assert_eq!(matcher.matching_creator(&it).unwrap().name, "A. Mueller");
    }

    #[test]
    fn test_bibliography_keeps_source_order() {
        let author = AuthorConfig::new("john", ["John Doe"]);
        let items = vec![
            item("c", vec![Creator::author("John Doe")]),
            item("a", vec![Creator::author("Jane Roe")]),
            item("b", vec![Creator::author("John Doe")]),
        ];
        let bib = match_items(&items, &author);
        let keys: Vec<_> = bib.matched_items.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["c", "b"]);
        assert_eq!(bib.citations(), vec!["citation c", "citation b"]);
    }

    #[test]
    fn test_summary_counts() {
        let registry = AuthorRegistry::new(vec![
            AuthorConfig::new("anna", ["Anna Müller"]),
            AuthorConfig::new("john", ["John Doe"]),
            AuthorConfig::new("nobody", ["No Body"]),
        ])
        .unwrap();
        let items = vec![
            item("1", vec![Creator::author("Anna Müller")]),
            item("2", vec![Creator::author("Anna Müller"), Creator::author("John Doe")]),
            item("3", vec![Creator::new("Jane Roe", Role::Editor)]),
        ];

        let bibs = match_all(&items, &registry);
        let summary = MatchSummary::new(&items, &bibs);

        assert_eq!(summary.total_items, 3);
        assert_eq!(summary.total_authors, 3);
        assert_eq!(summary.authors_with_items, 2);
        assert_eq!(summary.total_matched_items, 3);
        assert_eq!(summary.unmatched_items, 1);
        assert_eq!(summary.per_author["anna"], 2);
        assert_eq!(summary.per_author["nobody"], 0);
    }

    #[test]
    fn test_summary_item_types() {
        let registry = AuthorRegistry::new(vec![
            AuthorConfig::new("anna", ["Anna Müller"]),
            AuthorConfig::new("nobody", ["No Body"]),
        ])
        .unwrap();
        let items = vec![
            typed("1", "book", vec![Creator::author("Anna Müller")]),
            typed("2", "journalArticle", vec![Creator::author("Anna Müller")]),
            typed("3", "book", vec![Creator::author("Anna Müller")]),
            item("4", vec![Creator::author("Anna Müller")]),
            typed("5", "report", vec![Creator::author("Jane Roe")]),
        ];

        let bibs = match_all(&items, &registry);
        let summary = MatchSummary::new(&items, &bibs);

        let anna = &summary.item_types["anna"];
        assert_eq!(anna["book"], 2);
        assert_eq!(anna["journalArticle"], 1);
        assert_eq!(anna[UNKNOWN_ITEM_TYPE], 1);
        assert!(!anna.contains_key("report"));
        assert_eq!(anna.values().sum::<usize>(), summary.per_author["anna"]);
        assert!(summary.item_types["nobody"].is_empty());

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["item_types"]["anna"]["book"], 2);
    }
}
