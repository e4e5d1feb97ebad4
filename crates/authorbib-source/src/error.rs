//! Error types for the Zotero source

use authorbib_core::SourceError;
use thiserror::Error;

/// Errors that can occur while fetching from Zotero
#[derive(Error, Debug)]
pub enum ZoteroError {
    /// HTTP request error (connect, timeout, TLS, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Body is not the expected JSON item list
    #[error("Invalid response body: {0}")]
    InvalidResponse(#[from] serde_json::Error),
}

/// Result type for Zotero operations
pub type Result<T> = std::result::Result<T, ZoteroError>;

impl From<ZoteroError> for SourceError {
    fn from(err: ZoteroError) -> Self {
        match err {
            ZoteroError::Http(e) if e.is_decode() => SourceError::Format(e.to_string()),
            ZoteroError::InvalidResponse(_) => SourceError::Format(err.to_string()),
            ZoteroError::Http(_) | ZoteroError::ServerError { .. } => {
                SourceError::Unavailable(err.to_string())
            }
        }
    }
}
