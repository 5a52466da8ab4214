// In-memory document store for tests
//
// Deterministic fake implementing DocumentStore: documents keep
// insertion order, list honors limit/offset, and failures can be
// scripted per document id to exercise retry and error-isolation paths.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::anyhow;
use appwrite::Document;
use async_trait::async_trait;
use serde_json::{Map, Value};

use super::store::{DocumentPage, DocumentStore, StoreError};

/// Scripted failure for a document's updates.
#[derive(Debug, Clone)]
pub enum UpdateFailure {
    /// Every update fails with a non-transient error.
    Always,
    /// The first `n` updates fail with a rate-limit error, then succeed.
    RateLimitTimes(u32),
}

#[derive(Default)]
struct Inner {
    // collection -> documents in insertion order
    collections: HashMap<String, Vec<Document>>,
    update_failures: HashMap<String, UpdateFailure>,
    failing_list_collections: Vec<String>,
    failing_create_collections: Vec<String>,
    list_calls: u64,
    update_calls: Vec<(String, String)>,
}

/// In-memory [`DocumentStore`] fake.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document whose attributes come from a JSON object.
    pub fn insert(&self, collection: &str, id: &str, data: Value) {
        let data = match data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let doc = Document {
            id: id.to_string(),
            collection_id: Some(collection.to_string()),
            created_at: None,
            updated_at: None,
            data,
        };
        self.inner
            .lock()
            .unwrap()
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(doc);
    }

    /// Script update failures for a document id.
    pub fn fail_updates(&self, id: &str, failure: UpdateFailure) {
        self.inner
            .lock()
            .unwrap()
            .update_failures
            .insert(id.to_string(), failure);
    }

    /// Make every `list` call against `collection` fail.
    pub fn fail_lists(&self, collection: &str) {
        self.inner
            .lock()
            .unwrap()
            .failing_list_collections
            .push(collection.to_string());
    }

    /// Make every `create` call against `collection` fail.
    pub fn fail_creates(&self, collection: &str) {
        self.inner
            .lock()
            .unwrap()
            .failing_create_collections
            .push(collection.to_string());
    }

    pub fn list_calls(&self) -> u64 {
        self.inner.lock().unwrap().list_calls
    }

    /// `(collection, id)` pairs of attempted updates, in order.
    pub fn update_calls(&self) -> Vec<(String, String)> {
        self.inner.lock().unwrap().update_calls.clone()
    }

    /// Read back a string attribute of a stored document.
    pub fn field(&self, collection: &str, id: &str, key: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .collections
            .get(collection)?
            .iter()
            .find(|d| d.id == id)?
            .get_str(key)
            .map(String::from)
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn list(
        &self,
        collection: &str,
        limit: u64,
        offset: u64,
    ) -> Result<DocumentPage, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.list_calls += 1;

        if inner.failing_list_collections.iter().any(|c| c == collection) {
            return Err(StoreError::Other(anyhow!(
                "list failed for collection {collection}"
            )));
        }

        let docs = inner.collections.get(collection).cloned().unwrap_or_default();
        let total = docs.len() as u64;
        let documents = docs
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();

        Ok(DocumentPage { documents, total })
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Document, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner
            .collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id))
            .cloned()
            .ok_or_else(|| StoreError::Other(anyhow!("document {id} not found in {collection}")))
    }

    async fn create(
        &self,
        collection: &str,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        if self
            .inner
            .lock()
            .unwrap()
            .failing_create_collections
            .iter()
            .any(|c| c == collection)
        {
            return Err(StoreError::Other(anyhow!(
                "create failed for collection {collection}"
            )));
        }

        let doc = Document {
            id: id.to_string(),
            collection_id: Some(collection.to_string()),
            created_at: None,
            updated_at: None,
            data,
        };
        self.inner
            .lock()
            .unwrap()
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(doc.clone());
        Ok(doc)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .update_calls
            .push((collection.to_string(), id.to_string()));

        match inner.update_failures.get_mut(id) {
            Some(UpdateFailure::Always) => {
                return Err(StoreError::Other(anyhow!("update failed for {id}")));
            }
            Some(UpdateFailure::RateLimitTimes(n)) if *n > 0 => {
                *n -= 1;
                return Err(StoreError::RateLimited(format!(
                    "rate limit hit updating {id}"
                )));
            }
            _ => {}
        }

        let doc = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| StoreError::Other(anyhow!("document {id} not found in {collection}")))?;

        for (key, value) in data {
            doc.data.insert(key, value);
        }
        Ok(doc.clone())
    }
}
