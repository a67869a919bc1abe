//! Remote document store seam and its HTTP implementation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use url::Url;

use super::protocol::{
    Envelope, FetchRequest, SaveRequest, FETCH_PATH, FETCH_TRANSPORT_MESSAGE, SAVE_PATH,
    SAVE_TRANSPORT_MESSAGE,
};
use crate::error::{ConfigError, CoreError, DocumentError};

/// Every document backend implements this trait.
/// Both calls are single attempts; retrying is up to the caller.
pub trait DocumentStore: Send + Sync + 'static {
    /// FetchDocument(userId, documentId) -> content.
    fn fetch(
        &self,
        user_id: &str,
        document_id: &str,
    ) -> impl Future<Output = Result<String, DocumentError>> + Send;

    /// SaveDocument(userId, documentId, content).
    fn save(
        &self,
        user_id: &str,
        document_id: &str,
        content: &str,
    ) -> impl Future<Output = Result<(), DocumentError>> + Send;
}

/// Talks to the document service over JSON POSTs.
///
/// HTTP status codes are not inspected; the `success` flag in the body
/// decides the outcome.
#[derive(Debug, Clone)]
pub struct HttpDocumentStore {
    client: Client,
    base_url: Url,
}

impl HttpDocumentStore {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CoreError> {
        let base_url = normalize_base(base_url)?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn post<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        transport_message: &str,
    ) -> Result<Envelope, DocumentError> {
        let transport = || DocumentError::Transport(transport_message.to_string());
        let url = self.base_url.join(path).map_err(|e| {
            tracing::warn!(error = %e, path, "invalid document endpoint");
            transport()
        })?;

        let resp = self.client.post(url).json(body).send().await.map_err(|e| {
            tracing::warn!(error = %e, path, "document request failed");
            transport()
        })?;

        let status = resp.status();
        resp.json::<Envelope>().await.map_err(|e| {
            tracing::warn!(error = %e, %status, path, "unreadable document response");
            transport()
        })
    }
}

impl DocumentStore for HttpDocumentStore {
    async fn fetch(&self, user_id: &str, document_id: &str) -> Result<String, DocumentError> {
        let body = FetchRequest {
            user_id,
            doc_id: document_id,
        };
        self.post(FETCH_PATH, &body, FETCH_TRANSPORT_MESSAGE)
            .await?
            .into_content()
    }

    async fn save(
        &self,
        user_id: &str,
        document_id: &str,
        content: &str,
    ) -> Result<(), DocumentError> {
        let body = SaveRequest {
            user_id,
            doc_id: document_id,
            content,
        };
        self.post(SAVE_PATH, &body, SAVE_TRANSPORT_MESSAGE)
            .await?
            .into_ack()
    }
}

/// `Url::join` replaces the last path segment unless the base ends in `/`.
fn normalize_base(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
        key: "api_base_url".into(),
        message: e.to_string(),
    })?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Process-local store keyed by (user, document).
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    docs: Mutex<HashMap<(String, String), String>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, user_id: &str, document_id: &str, content: &str) -> Self {
        if let Ok(mut docs) = self.docs.lock() {
            docs.insert((user_id.into(), document_id.into()), content.into());
        }
        self
    }

    pub fn get(&self, user_id: &str, document_id: &str) -> Option<String> {
        let docs = self.docs.lock().ok()?;
        docs.get(&(user_id.to_string(), document_id.to_string())).cloned()
    }
}

impl DocumentStore for MemoryDocumentStore {
    async fn fetch(&self, user_id: &str, document_id: &str) -> Result<String, DocumentError> {
        self.get(user_id, document_id)
            .ok_or_else(|| DocumentError::Remote("Document not found".into()))
    }

    async fn save(
        &self,
        user_id: &str,
        document_id: &str,
        content: &str,
    ) -> Result<(), DocumentError> {
        let mut docs = self
            .docs
            .lock()
            .map_err(|_| DocumentError::Transport(SAVE_TRANSPORT_MESSAGE.into()))?;
        docs.insert((user_id.into(), document_id.into()), content.into());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn store_for(server: &mockito::ServerGuard) -> HttpDocumentStore {
        HttpDocumentStore::new(&server.url(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let store =
            HttpDocumentStore::new("http://example.com/api", Duration::from_secs(1)).unwrap();
        assert_eq!(store.base_url().as_str(), "http://example.com/api/");
        assert_eq!(
            store.base_url().join(FETCH_PATH).unwrap().as_str(),
            "http://example.com/api/getDoc"
        );
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let err = HttpDocumentStore::new("not a url", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, CoreError::Config(ConfigError::InvalidValue { .. })));
    }

    #[tokio::test]
    async fn fetch_posts_ids_and_returns_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/getDoc")
            .match_body(Matcher::Json(json!({"userId": "u1", "docId": "d1"})))
            .with_header("content-type", "application/json")
            .with_body(r#"{"success":true,"doc":{"content":"Hello"}}"#)
            .create_async()
            .await;

        let content = store_for(&server).fetch("u1", "d1").await.unwrap();
        assert_eq!(content, "Hello");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_failure_flag_wins_over_http_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/getDoc")
            .with_status(200)
            .with_body(r#"{"success":false,"message":"not found"}"#)
            .create_async()
            .await;

        let err = store_for(&server).fetch("u1", "d1").await.unwrap_err();
        assert_eq!(err, DocumentError::Remote("not found".into()));
    }

    #[tokio::test]
    async fn save_accepts_success_body_on_error_status() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/uploadDoc")
            .match_body(Matcher::Json(
                json!({"userId": "u1", "docId": "d1", "content": "Updated text"}),
            ))
            .with_status(500)
            .with_body(r#"{"success":true}"#)
            .create_async()
            .await;

        store_for(&server)
            .save("u1", "d1", "Updated text")
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_json_body_is_transport_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/uploadDoc")
            .with_status(502)
            .with_body("<html>Bad Gateway</html>")
            .create_async()
            .await;

        let err = store_for(&server).save("u1", "d1", "x").await.unwrap_err();
        assert_eq!(err, DocumentError::Transport(SAVE_TRANSPORT_MESSAGE.into()));
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_failure() {
        // Port 9 (discard) is not expected to accept HTTP connections.
        let store = HttpDocumentStore::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = store.fetch("u1", "d1").await.unwrap_err();
        assert_eq!(err, DocumentError::Transport(FETCH_TRANSPORT_MESSAGE.into()));
    }

    #[tokio::test]
    async fn memory_store_round_trips() {
        let store = MemoryDocumentStore::new().with_document("u1", "d1", "Hello");
        assert_eq!(store.fetch("u1", "d1").await.unwrap(), "Hello");
        assert!(store.fetch("u1", "other").await.unwrap_err().is_remote());

        store.save("u1", "d1", "Bye").await.unwrap();
        assert_eq!(store.get("u1", "d1").as_deref(), Some("Bye"));
    }
}
