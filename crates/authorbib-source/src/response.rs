//! Zotero API response model
//!
//! Only the fields needed to match and print an item are read. The request
//! uses `include=data,bib`, so every entry carries the raw item `data` and a
//! CSL-formatted `bib` fragment.

use serde::Deserialize;

use authorbib_core::{BibliographicItem, Creator, Role};

use crate::error::Result;

/// Item types that are children of real items, not bibliography entries
const CHILD_ITEM_TYPES: &[&str] = &["attachment", "note"];

/// Authors listed in a fallback citation before "et al."
const FALLBACK_AUTHOR_LIMIT: usize = 3;

#[derive(Debug, Deserialize)]
struct ApiItem {
    key: String,
    #[serde(default)]
    bib: Option<String>,
    data: ItemData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemData {
    #[serde(default)]
    item_type: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    creators: Vec<ApiCreator>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCreator {
    #[serde(default)]
    creator_type: String,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    /// Single-field name mode (institutions)
    #[serde(default)]
    name: Option<String>,
}

impl ApiCreator {
    /// "First Last", or the single-field name
    fn full_name(&self) -> String {
        if let Some(name) = self.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        let first = self.first_name.as_deref().unwrap_or("").trim();
        let last = self.last_name.as_deref().unwrap_or("").trim();
        format!("{} {}", first, last).trim().to_string()
    }

    /// "Last, First" for fallback citations
    fn sort_name(&self) -> Option<String> {
        let last = self.last_name.as_deref().map(str::trim).unwrap_or("");
        if last.is_empty() {
            return self
                .name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string);
        }
        let first = self.first_name.as_deref().map(str::trim).unwrap_or("");
        if first.is_empty() {
            Some(last.to_string())
        } else {
            Some(format!("{}, {}", last, first))
        }
    }
}

impl ItemData {
    /// Minimal "Authors. Title." citation when Zotero returned no `bib`
    fn fallback_citation(&self) -> String {
        let names: Vec<String> = self
            .creators
            .iter()
            .filter(|c| c.creator_type == "author")
            .filter_map(ApiCreator::sort_name)
            .collect();

        let authors = if names.is_empty() {
            "Unknown author".to_string()
        } else {
            let mut joined = names
                .iter()
                .take(FALLBACK_AUTHOR_LIMIT)
                .cloned()
                .collect::<Vec<_>>()
                .join("; ");
            if names.len() > FALLBACK_AUTHOR_LIMIT {
                joined.push_str(" et al.");
            }
            joined
        };

        let title = self
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or("Untitled");

        format!("{}. {}.", authors.trim_end_matches('.'), title.trim_end_matches('.'))
    }
}

impl ApiItem {
    fn is_child(&self) -> bool {
        CHILD_ITEM_TYPES.contains(&self.data.item_type.as_str())
    }

    fn into_item(self) -> BibliographicItem {
        let citation_text = match self.bib.as_deref().map(str::trim) {
            Some(bib) if !bib.is_empty() => bib.to_string(),
            _ => {
                tracing::debug!(item = %self.key, "no formatted citation, using fallback");
                self.data.fallback_citation()
            }
        };

        let creators = self
            .data
            .creators
            .iter()
            .map(|c| Creator::new(c.full_name(), Role::from_creator_type(&c.creator_type)))
            .collect();

        BibliographicItem {
            key: self.key,
            title: self.data.title,
            item_type: Some(self.data.item_type).filter(|t| !t.is_empty()),
            citation_text,
            creators,
        }
    }
}

/// Parse a `format=json&include=data,bib` response body
///
/// Child items (attachments, notes) are dropped; all other items keep the
/// order of the response.
pub fn parse_items(body: &str) -> Result<Vec<BibliographicItem>> {
    let raw: Vec<ApiItem> = serde_json::from_str(body)?;
    Ok(raw
        .into_iter()
        .filter(|item| !item.is_child())
        .map(ApiItem::into_item)
        .collect())
}
