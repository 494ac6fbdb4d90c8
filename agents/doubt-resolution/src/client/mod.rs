//! Clients for external collaborators
//!
//! The resolver only sees the traits in this module. Production wiring uses
//! the Firestore and Gemini REST clients; tests and local runs use the
//! in-memory store and fixed credentials.

pub mod firestore;
pub mod gemini;
pub mod memory;

pub use firestore::{FirestoreClient, FirestoreConfig};
pub use gemini::{GeminiClient, GeminiConfig};
pub use memory::InMemoryStore;

use async_trait::async_trait;
use std::fmt;

use crate::error::{GenerationError, StoreError};

/// A decoded document: top-level field name to JSON value
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Read access to a document database
#[async_trait]
pub trait DocumentStore: Send + Sync + fmt::Debug {
    /// Fetch one document; `Ok(None)` when it does not exist
    async fn get(&self, collection: &str, document_id: &str)
        -> Result<Option<Document>, StoreError>;
}

/// Single-shot text generation
#[async_trait]
pub trait GenerativeClient: Send + Sync + fmt::Debug {
    async fn generate(
        &self,
        api_key: &str,
        model_id: &str,
        prompt: &str,
    ) -> Result<String, GenerationError>;
}

/// Source of the generative API credential, consulted on every call
pub trait CredentialSource: Send + Sync + fmt::Debug {
    /// Name of the credential, used in the missing-credential message
    fn name(&self) -> &str;

    /// Current value; `None` when unset or empty
    fn api_key(&self) -> Option<String>;
}

/// Reads the credential from the process environment at call time
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new("GOOGLE_API_KEY")
    }
}

impl CredentialSource for EnvCredentials {
    fn name(&self) -> &str {
        &self.var
    }

    fn api_key(&self) -> Option<String> {
        std::env::var(&self.var).ok().filter(|v| !v.trim().is_empty())
    }
}

/// Fixed credential, for tests and the CLI
#[derive(Clone)]
pub struct StaticCredentials {
    name: String,
    key: Option<String>,
}

impl StaticCredentials {
    pub fn new(name: impl Into<String>, key: Option<String>) -> Self {
        Self {
            name: name.into(),
            key,
        }
    }

    /// A source with no credential configured
    pub fn missing(name: impl Into<String>) -> Self {
        Self::new(name, None)
    }
}

impl fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("name", &self.name)
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl CredentialSource for StaticCredentials {
    fn name(&self) -> &str {
        &self.name
    }

    fn api_key(&self) -> Option<String> {
        self.key.clone().filter(|v| !v.trim().is_empty())
    }
}
