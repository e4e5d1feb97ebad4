//! Configuration structures and validation

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::paths::{
    FilenameTemplate, OutputLayout, DEFAULT_FILENAME_TEMPLATE, DEFAULT_HISTORY_FILENAME_TEMPLATE,
};
use crate::registry::{AuthorConfig, AuthorRegistry};

/// Default config file name
pub const DEFAULT_CONFIG_FILE: &str = "authorbib.toml";

/// Default Zotero Web API base URL
pub const DEFAULT_API_URL: &str = "https://api.zotero.org";

/// Default citation locale
pub const DEFAULT_LOCALE: &str = "en-US";

/// Top-level settings as written in the config file
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub zotero: ZoteroSettings,
    pub output: OutputSettings,
    pub deployment: DeploymentSettings,
    pub authors: Vec<AuthorConfig>,
}

/// `[general]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// CSL style id used for every citation of the run
    pub citation_style: String,
    /// Citation locale
    pub locale: String,
    /// Heading printed above every bibliography
    pub title: Option<String>,
    /// Additional log file (appended)
    pub log_file: Option<PathBuf>,
    /// Extra font files for the PDF renderer
    pub font_paths: Vec<PathBuf>,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            citation_style: String::new(),
            locale: DEFAULT_LOCALE.to_string(),
            title: None,
            log_file: None,
            font_paths: Vec::new(),
        }
    }
}

/// `[zotero]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoteroSettings {
    pub group_id: String,
    pub collection_key: Option<String>,
    pub api_url: String,
    /// Number of items requested in the single fetch
    pub limit: u32,
    pub timeout_secs: u64,
}

impl Default for ZoteroSettings {
    fn default() -> Self {
        Self {
            group_id: String::new(),
            collection_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            limit: 100,
            timeout_secs: 30,
        }
    }
}

/// `[output]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub filename_template: String,
    pub history_filename_template: String,
    pub history: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            filename_template: DEFAULT_FILENAME_TEMPLATE.to_string(),
            history_filename_template: DEFAULT_HISTORY_FILENAME_TEMPLATE.to_string(),
            history: true,
        }
    }
}

/// `[deployment]`; every value may be supplied by [`DeploymentOverrides`] instead
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DeploymentSettings {
    pub uploads_path: Option<PathBuf>,
    pub site_id: Option<String>,
    pub bib_root: Option<String>,
    pub permalink_dir: Option<String>,
    pub history_dir: Option<String>,
}

/// Values from the environment or command line; they win over the file
#[derive(Debug, Clone, Default)]
pub struct DeploymentOverrides {
    pub uploads_path: Option<PathBuf>,
    pub site_id: Option<String>,
    pub bib_root: Option<String>,
    pub permalink_dir: Option<String>,
    pub history_dir: Option<String>,
    pub api_key: Option<String>,
    /// Force history generation off for this run
    pub no_history: bool,
}

/// Validated configuration for one run
#[derive(Debug, Clone)]
pub struct Config {
    pub citation_style: String,
    pub locale: String,
    pub title: Option<String>,
    pub font_paths: Vec<PathBuf>,
    pub source: SourceConfig,
    pub layout: OutputLayout,
    pub registry: AuthorRegistry,
}

/// Connection settings for the bibliographic source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub api_url: String,
    pub group_id: String,
    pub collection_key: Option<String>,
    pub api_key: Option<String>,
    pub limit: u32,
    pub timeout: Duration,
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Read and parse a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Merge overrides and validate into a run configuration
    pub fn into_config(self, overrides: &DeploymentOverrides) -> Result<Config, ConfigError> {
        let citation_style = required("general.citation_style", Some(self.general.citation_style))?;
        let locale = required("general.locale", Some(self.general.locale))?;
        let source = self.zotero.into_source(overrides.api_key.clone())?;
        let layout = self
            .deployment
            .into_layout(&self.output, overrides)?;
        let registry = AuthorRegistry::new(self.authors)?;

        Ok(Config {
            citation_style,
            locale,
            title: self
                .general
                .title
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            font_paths: self.general.font_paths,
            source,
            layout,
            registry,
        })
    }
}

impl ZoteroSettings {
    fn into_source(self, api_key: Option<String>) -> Result<SourceConfig, ConfigError> {
        let group_id = required("zotero.group_id", Some(self.group_id))?;
        let api_url = required("zotero.api_url", Some(self.api_url))?;

        if !(1..=100).contains(&self.limit) {
            return Err(ConfigError::Invalid {
                name: "zotero.limit",
                reason: format!("{} is outside 1..=100", self.limit),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "zotero.timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(SourceConfig {
            api_url: api_url.trim_end_matches('/').to_string(),
            group_id,
            collection_key: optional(self.collection_key),
            api_key: optional(api_key),
            limit: self.limit,
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }
}

impl DeploymentSettings {
    fn into_layout(
        self,
        output: &OutputSettings,
        overrides: &DeploymentOverrides,
    ) -> Result<OutputLayout, ConfigError> {
        let uploads_path = overrides
            .uploads_path
            .clone()
            .or(self.uploads_path)
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(ConfigError::Missing("deployment.uploads_path"))?;

        let filename = FilenameTemplate::parse(&output.filename_template)?;
        if filename.has_timestamp() {
            return Err(ConfigError::InvalidTemplate {
                template: filename.to_string(),
                reason: "permalink template must not contain {timestamp}".to_string(),
            });
        }
        let history_filename = FilenameTemplate::parse(&output.history_filename_template)?;
        if !history_filename.has_timestamp() {
            return Err(ConfigError::InvalidTemplate {
                template: history_filename.to_string(),
                reason: "history template needs a {timestamp} placeholder".to_string(),
            });
        }

        Ok(OutputLayout {
            uploads_path,
            site_id: path_component(
                "deployment.site_id",
                overrides.site_id.clone().or(self.site_id),
            )?,
            bib_root: path_component(
                "deployment.bib_root",
                overrides.bib_root.clone().or(self.bib_root),
            )?,
            permalink_dir: path_component(
                "deployment.permalink_dir",
                overrides.permalink_dir.clone().or(self.permalink_dir),
            )?,
            history_dir: path_component(
                "deployment.history_dir",
                overrides.history_dir.clone().or(self.history_dir),
            )?,
            filename,
            history_filename,
            history: output.history && !overrides.no_history,
        })
    }
}

fn required(name: &'static str, value: Option<String>) -> Result<String, ConfigError> {
    optional(value).ok_or(ConfigError::Missing(name))
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A single directory name inside the output tree
fn path_component(name: &'static str, value: Option<String>) -> Result<String, ConfigError> {
    let value = required(name, value)?;
    if value.contains(['/', '\\']) || value == "." || value == ".." {
        return Err(ConfigError::Invalid {
            name,
            reason: format!("{:?} must be a single directory name", value),
        });
    }
    Ok(value)
}
