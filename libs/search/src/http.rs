//! HTTP backend for Elasticsearch-compatible engines

use crate::error::{Error, Result};
use crate::gateway::{Connection, Connector, Refresh};
use crate::models::IndexConfig;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value as JsonValue;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Opens one HTTP client per operation. Nothing is shared between leases.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    timeout: Duration,
}

impl HttpConnector {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Connector whose requests fail with a timeout error after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for HttpConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for HttpConnector {
    async fn connect(&self, config: &IndexConfig) -> Result<Box<dyn Connection>> {
        let client = Client::builder().timeout(self.timeout).build()?;
        Ok(Box::new(HttpConnection {
            client: Some(client),
            base_url: target_url(config),
            document_base: document_base_url(config),
        }))
    }
}

/// `{url}/{index}[/{type}]`
pub fn target_url(config: &IndexConfig) -> String {
    let mut url = format!(
        "{}/{}",
        config.url.trim_end_matches('/'),
        urlencoding::encode(&config.index)
    );
    if !config.doc_type.is_empty() {
        url.push('/');
        url.push_str(&urlencoding::encode(&config.doc_type));
    }
    url
}

/// `{url}/{index}/{type}`, or `{url}/{index}/_doc` for a typeless index
pub fn document_base_url(config: &IndexConfig) -> String {
    if config.doc_type.is_empty() {
        format!("{}/_doc", target_url(config))
    } else {
        target_url(config)
    }
}

struct HttpConnection {
    client: Option<Client>,
    base_url: String,
    document_base: String,
}

impl HttpConnection {
    fn client(&self) -> Result<&Client> {
        self.client
            .as_ref()
            .ok_or_else(|| Error::BackendConnection("Connection already closed".to_string()))
    }

    fn document_url(&self, id: &str) -> String {
        format!("{}/{}", self.document_base, urlencoding::encode(id))
    }
}

#[async_trait]
impl Connection for HttpConnection {
    async fn search(&self, body: &JsonValue) -> Result<JsonValue> {
        let url = format!("{}/_search", self.base_url);
        tracing::debug!(url = %url, "Dispatching search request");

        let response = self.client()?.post(&url).json(body).send().await?;
        if !response.status().is_success() {
            return Err(failure(response, None).await);
        }

        Ok(response.json().await?)
    }

    async fn index(&self, id: &str, document: &JsonValue, refresh: Refresh) -> Result<()> {
        let url = self.document_url(id);
        tracing::debug!(url = %url, ?refresh, "Dispatching index request");

        let mut request = self.client()?.put(&url).json(document);
        if refresh == Refresh::Immediate {
            request = request.query(&[("refresh", "true")]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(failure(response, Some(id)).await);
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let url = self.document_url(id);
        tracing::debug!(url = %url, "Dispatching delete request");

        let response = self.client()?.delete(&url).send().await?;
        if !response.status().is_success() {
            return Err(failure(response, Some(id)).await);
        }
        Ok(())
    }

    fn close(&mut self) {
        self.client.take();
    }
}

/// Classify an unsuccessful response. `document_id` is set for mutations.
async fn failure(response: Response, document_id: Option<&str>) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let reason = backend_reason(&body).unwrap_or_else(|| format!("status {}", status));

    match (status, document_id) {
        (StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT, _) => {
            Error::BackendTimeout(reason)
        }
        (StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE, _) => {
            Error::BackendConnection(reason)
        }
        (StatusCode::NOT_FOUND | StatusCode::CONFLICT, Some(id)) => Error::MutationConflict {
            id: id.to_string(),
            reason,
        },
        _ => Error::BackendQuery(reason),
    }
}

/// Pull a readable reason out of a backend error body.
///
/// Understands `{"error": {"type", "reason"}}`, `{"error": "..."}` and the
/// `{"result": "not_found"}` body of a delete that hit nothing.
fn backend_reason(body: &str) -> Option<String> {
    let value: JsonValue = serde_json::from_str(body).ok()?;

    match value.get("error") {
        Some(JsonValue::Object(error)) => {
            let kind = error.get("type").and_then(JsonValue::as_str);
            let reason = error.get("reason").and_then(JsonValue::as_str);
            match (kind, reason) {
                (Some(kind), Some(reason)) => Some(format!("{}: {}", kind, reason)),
                (Some(text), None) | (None, Some(text)) => Some(text.to_string()),
                (None, None) => None,
            }
        }
        Some(JsonValue::String(error)) => Some(error.clone()),
        _ => match value.get("result").and_then(JsonValue::as_str) {
            Some("not_found") => Some("document not found".to_string()),
            _ => None,
        },
    }
}
