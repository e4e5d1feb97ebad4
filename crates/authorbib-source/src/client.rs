//! Zotero Web API client
//!
//! Issues a single `GET` for the configured group collection with
//! `include=data,bib`, so Zotero formats the citations server-side in the
//! requested CSL style.

use reqwest::blocking::{Client, Response};
use reqwest::header::HeaderMap;

use authorbib_core::config::SourceConfig;
use authorbib_core::{BibliographicItem, FetchQuery, ItemSource, SourceError};

use crate::error::{Result, ZoteroError};
use crate::response::parse_items;

/// Zotero API version sent with every request
pub const API_VERSION: &str = "3";

/// Remaining-request count below which a warning is logged
const RATE_LIMIT_WARN_THRESHOLD: u64 = 10;

/// Client for one Zotero group library
#[derive(Debug, Clone)]
pub struct ZoteroClient {
    /// Base URL of the API, without trailing slash
    base_url: String,
    group_id: String,
    api_key: Option<String>,
    client: Client,
}

impl ZoteroClient {
    /// Create a client from the source section of the configuration
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("authorbib/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            group_id: config.group_id.clone(),
            api_key: config.api_key.clone(),
            client,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Items endpoint for a collection, or for the whole group library
    pub fn items_url(&self, collection_key: Option<&str>) -> String {
        match collection_key {
            Some(key) => format!(
                "{}/groups/{}/collections/{}/items",
                self.base_url, self.group_id, key
            ),
            None => format!("{}/groups/{}/items", self.base_url, self.group_id),
        }
    }

    /// Fetch and parse all items matching the query
    pub fn fetch(&self, query: &FetchQuery<'_>) -> Result<Vec<BibliographicItem>> {
        let url = self.items_url(query.collection_key);
        tracing::info!(url = %url, style = query.citation_style, "fetching library items");

        let limit = query.limit.to_string();
        let mut request = self
            .client
            .get(&url)
            .header("Zotero-API-Version", API_VERSION)
            .query(&[
                ("format", "json"),
                ("include", "data,bib"),
                ("style", query.citation_style),
                ("locale", query.locale),
                ("limit", limit.as_str()),
            ]);
        if let Some(key) = &self.api_key {
            request = request.header("Zotero-API-Key", key);
        }

        let response = request.send()?;
        let response = check_status(response)?;

        warn_on_rate_limit(response.headers());
        let total = header_u64(response.headers(), "Total-Results");

        let body = response.text()?;
        let items = parse_items(&body)?;

        if let Some(total) = total {
            if total > u64::from(query.limit) {
                tracing::warn!(
                    total,
                    limit = query.limit,
                    "collection has more items than the request limit; output is truncated"
                );
            }
        }
        tracing::info!(count = items.len(), "fetched library items");
        Ok(items)
    }
}

impl ItemSource for ZoteroClient {
    fn fetch_all(
        &self,
        query: &FetchQuery<'_>,
    ) -> std::result::Result<Vec<BibliographicItem>, SourceError> {
        Ok(self.fetch(query)?)
    }
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());
    Err(ZoteroError::ServerError {
        status: status.as_u16(),
        message,
    })
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

fn warn_on_rate_limit(headers: &HeaderMap) {
    if let Some(remaining) = header_u64(headers, "X-Rate-Limit-Remaining") {
        if remaining < RATE_LIMIT_WARN_THRESHOLD {
            tracing::warn!(remaining, "Zotero rate limit nearly exhausted");
        }
    }
    if let Some(backoff) = header_u64(headers, "Backoff") {
        tracing::warn!(seconds = backoff, "Zotero asked clients to back off");
    }
}
