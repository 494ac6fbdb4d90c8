//! Firestore REST client
//!
//! Read-only access to single documents through the Firestore v1 REST API.
//! Typed Firestore values are decoded into plain JSON so callers never see
//! the wire representation.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

use super::{Document, DocumentStore};
use crate::error::StoreError;

/// Configuration for the Firestore client
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// Base URL, without the `/v1` suffix
    pub base_url: String,

    /// GCP project id
    pub project_id: String,

    /// Database id
    pub database: String,

    /// OAuth access token sent as a bearer token, if any
    pub access_token: Option<String>,

    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            base_url: "https://firestore.googleapis.com".to_string(),
            project_id: project_id.into(),
            database: "(default)".to_string(),
            access_token: None,
            timeout_ms: 5000,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    fields: Map<String, Value>,
}

/// HTTP client for Firestore documents
pub struct FirestoreClient {
    client: Client,
    config: FirestoreConfig,
}

impl std::fmt::Debug for FirestoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreClient")
            .field("base_url", &self.config.base_url)
            .field("project_id", &self.config.project_id)
            .field("database", &self.config.database)
            .finish()
    }
}

impl FirestoreClient {
    pub fn new(config: FirestoreConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StoreError::Connection(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn document_url(&self, collection: &str, document_id: &str) -> String {
        format!(
            "{}/v1/projects/{}/databases/{}/documents/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.project_id,
            self.config.database,
            collection,
            document_id
        )
    }

    pub fn project_id(&self) -> &str {
        &self.config.project_id
    }
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn get(
        &self,
        collection: &str,
        document_id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let url = self.document_url(collection, document_id);

        let mut request = self.client.get(&url);
        if let Some(token) = &self.config.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!(collection, document_id, "Document not found");
            return Ok(None);
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let raw: RawDocument = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        decode_fields(&raw.fields).map(Some)
    }
}

/// Decode a Firestore `fields` map into plain JSON
pub fn decode_fields(fields: &Map<String, Value>) -> Result<Document, StoreError> {
    fields
        .iter()
        .map(|(name, value)| decode_value(value).map(|v| (name.clone(), v)))
        .collect()
}

/// Decode one typed Firestore value
pub fn decode_value(value: &Value) -> Result<Value, StoreError> {
    let object = value
        .as_object()
        .ok_or_else(|| StoreError::Decode(format!("Expected typed value, got {}", value)))?;

    let (kind, inner) = object
        .iter()
        .next()
        .ok_or_else(|| StoreError::Decode("Empty typed value".to_string()))?;

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" | "doubleValue" => Ok(inner.clone()),
        // int64 values travel as decimal strings
        "integerValue" => match inner {
            Value::String(s) => s
                .parse::<i64>()
                .map(Value::from)
                .map_err(|e| StoreError::Decode(format!("Invalid integerValue '{}': {}", s, e))),
            other => Ok(other.clone()),
        },
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => Ok(inner.clone()),
        "geoPointValue" => Ok(inner.clone()),
        "mapValue" => {
            let empty = Map::new();
            let fields = inner
                .get("fields")
                .and_then(Value::as_object)
                .unwrap_or(&empty);
            decode_fields(fields).map(Value::Object)
        }
        "arrayValue" => {
            let values = inner
                .get("values")
                .and_then(Value::as_array)
                .map(|vs| vs.iter().map(decode_value).collect::<Result<Vec<_>, _>>())
                .transpose()?
                .unwrap_or_default();
            Ok(Value::Array(values))
        }
        other => Err(StoreError::Decode(format!("Unknown value type '{}'", other))),
    }
}
