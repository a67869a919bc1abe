//! Core error types for docify-core.
//!
//! Remote document failures are recovered inside [`DocumentSession`] and only
//! surface as a message in `last_error`. Configuration and HTTP client
//! setup failures propagate through [`CoreError`].
//!
//! [`DocumentSession`]: crate::document::DocumentSession

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for docify-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Remote document store errors
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// HTTP client construction errors
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Failure of a FetchDocument or SaveDocument call.
///
/// `Display` yields the bare message so it can be shown to the user as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// The store answered with `success: false`.
    #[error("{0}")]
    Remote(String),

    /// The request did not complete or the answer could not be understood.
    #[error("{0}")]
    Transport(String),
}

impl DocumentError {
    pub fn message(&self) -> &str {
        match self {
            DocumentError::Remote(msg) | DocumentError::Transport(msg) => msg,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, DocumentError::Remote(_))
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// No user identity configured or supplied
    #[error("No user id: pass --user or run `docify config set user_id <id>`")]
    MissingUser,
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
