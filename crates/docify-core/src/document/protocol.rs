//! Wire types for the document service.

use serde::{Deserialize, Serialize};

use crate::error::DocumentError;

pub const FETCH_PATH: &str = "getDoc";
pub const SAVE_PATH: &str = "uploadDoc";

pub const FETCH_TRANSPORT_MESSAGE: &str = "An error occurred while fetching the document.";
pub const SAVE_TRANSPORT_MESSAGE: &str = "An error occurred while saving the document.";
const DEFAULT_REMOTE_MESSAGE: &str = "request failed";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchRequest<'a> {
    pub user_id: &'a str,
    pub doc_id: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest<'a> {
    pub user_id: &'a str,
    pub doc_id: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocBody {
    #[serde(default)]
    pub content: String,
}

/// Envelope shared by both endpoints. A missing `success` counts as success;
/// only an explicit `false` is a failure.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub doc: Option<DocBody>,
}

fn default_success() -> bool {
    true
}

impl Envelope {
    fn remote_error(&self) -> Option<DocumentError> {
        if self.success {
            return None;
        }
        let message = self
            .message
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_REMOTE_MESSAGE.to_string());
        Some(DocumentError::Remote(message))
    }

    /// Interpret a FetchDocument answer.
    pub fn into_content(self) -> Result<String, DocumentError> {
        if let Some(err) = self.remote_error() {
            return Err(err);
        }
        self.doc
            .map(|doc| doc.content)
            .ok_or_else(|| DocumentError::Transport(FETCH_TRANSPORT_MESSAGE.to_string()))
    }

    /// Interpret a SaveDocument answer.
    pub fn into_ack(self) -> Result<(), DocumentError> {
        match self.remote_error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
