pub mod config;
pub mod doc;
pub mod edit;
pub mod timer;

use std::sync::Arc;

use docify_core::{Config, ConfigError, CoreError, HttpDocumentStore};

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Build the HTTP store from config.
pub fn http_store(config: &Config) -> Result<Arc<HttpDocumentStore>, CoreError> {
    Ok(Arc::new(HttpDocumentStore::new(
        &config.api_base_url,
        config.request_timeout(),
    )?))
}

/// `--user` wins over the configured identity.
pub fn resolve_user(flag: Option<String>, config: &Config) -> Result<String, ConfigError> {
    flag.or_else(|| config.user_id.clone())
        .filter(|id| !id.is_empty())
        .ok_or(ConfigError::MissingUser)
}

/// Single-threaded runtime: every reaction runs on one thread.
pub fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}
