//! Configuration
//!
//! Settings are read from a TOML file (`authorbib.toml` by default):
//!
//! ```toml
//! [general]
//! citation_style = "chicago-author-date"
//! locale = "de-DE"
//!
//! [zotero]
//! group_id = "123456"
//! collection_key = "ABCD1234"
//!
//! [deployment]
//! uploads_path = "/var/www/wp-content/uploads"
//! site_id = "3"
//! bib_root = "bibliographies"
//! permalink_dir = "permalink"
//! history_dir = "history"
//!
//! [[authors]]
//! slug = "anna-mueller"
//! identifiers = ["Anna Müller", "A. Mueller"]
//! ```
//!
//! Deployment values and the API key may also come from the environment
//! (see [`DeploymentOverrides`]). [`Settings::into_config`] merges both and
//! validates the result into a [`Config`], which is then passed by
//! reference to every stage of a run.

mod settings;


pub use settings::{
    Config, DeploymentOverrides, DeploymentSettings, GeneralSettings, OutputSettings, Settings,
    SourceConfig, ZoteroSettings, DEFAULT_API_URL, DEFAULT_CONFIG_FILE, DEFAULT_LOCALE,
};
