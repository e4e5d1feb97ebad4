//! authorbib-source - Zotero Web API item source
//!
//! Fetches the items of a Zotero group collection, with citations already
//! formatted by Zotero in the configured CSL style, and maps them onto
//! [`authorbib_core::BibliographicItem`].
//!
//! # Example
//!
//! ```no_run
//! use authorbib_core::{FetchQuery, ItemSource, Settings};
//! use authorbib_source::ZoteroClient;
//!
//! let config = Settings::load("authorbib.toml".as_ref())?.into_config(&Default::default())?;
//! let client = ZoteroClient::new(&config.source)?;
//! let items = client.fetch_all(&FetchQuery::from_config(&config))?;
//! println!("{} items", items.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod client;
pub mod error;
pub mod response;

pub use client::{ZoteroClient, API_VERSION};
pub use error::{Result, ZoteroError};
pub use response::parse_items;
