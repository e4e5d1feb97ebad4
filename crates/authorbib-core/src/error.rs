//! Error types for the bibliography pipeline
//!
//! Errors fall into two classes. [`ConfigError`] and [`SourceError`] are
//! fatal for the whole run. [`RenderError`] and [`WriteError`] are scoped to
//! one author and are collected into that author's outcome.

use std::path::PathBuf;

use thiserror::Error;

/// Configuration could not be loaded or is invalid
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML or has the wrong shape
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A required setting is absent or blank
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    /// A setting is present but unusable
    #[error("Invalid setting {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    /// A filename template cannot be used
    #[error("Invalid filename template {template:?}: {reason}")]
    InvalidTemplate { template: String, reason: String },

    /// An author entry is malformed
    #[error("Invalid author config {slug:?}: {reason}")]
    InvalidAuthorConfig { slug: String, reason: String },
}

/// The bibliographic source could not deliver items
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network, authentication or HTTP status failure
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    /// The response did not have the expected item shape
    #[error("Unexpected source response: {0}")]
    Format(String),
}

/// A bibliography could not be rendered to PDF
#[derive(Debug, Error)]
#[error("Rendering failed: {0}")]
pub struct RenderError(pub String);

/// A rendered bibliography could not be written
#[derive(Debug, Error)]
pub enum WriteError {
    /// Output directory could not be created
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing or renaming the file failed
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Target path has no parent directory
    #[error("Output path has no parent directory: {0}")]
    NoParent(PathBuf),

    /// A history file with the same name already exists
    #[error("History file already exists: {0}")]
    HistoryCollision(PathBuf),
}

/// Failure while producing one author's bibliography
#[derive(Debug, Error)]
pub enum AuthorError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

impl AuthorError {
    /// Short stage label for reports
    pub fn stage(&self) -> &'static str {
        match self {
            AuthorError::Render(_) => "render",
            AuthorError::Write(_) => "write",
        }
    }
}
