//! In-memory document store
//!
//! Used when no Firestore project is configured, and as the store in tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use super::{Document, DocumentStore};
use crate::error::StoreError;

#[derive(Debug, Default)]
pub struct InMemoryStore {
    documents: RwLock<HashMap<(String, String), Document>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a document
    pub fn set(&self, collection: &str, document_id: &str, document: Document) {
        let mut docs = self
            .documents
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        docs.insert((collection.to_string(), document_id.to_string()), document);
    }

    /// Merge fields into a document, creating it if needed
    pub fn merge(&self, collection: &str, document_id: &str, fields: Document) {
        let mut docs = self
            .documents
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        docs.entry((collection.to_string(), document_id.to_string()))
            .or_default()
            .extend(fields);
    }

    pub fn remove(&self, collection: &str, document_id: &str) -> Option<Document> {
        let mut docs = self
            .documents
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        docs.remove(&(collection.to_string(), document_id.to_string()))
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get(
        &self,
        collection: &str,
        document_id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let docs = self
            .documents
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(docs
            .get(&(collection.to_string(), document_id.to_string()))
            .cloned())
    }
}
