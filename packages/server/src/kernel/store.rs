// Trait definition for the backing document store
//
// This is an INFRASTRUCTURE trait only - no business logic. The
// migration runner and ledger talk to the store exclusively through it,
// so tests can swap in an in-memory fake and the transport's error
// shape never leaks into migration code.

use anyhow::anyhow;
use appwrite::{AppwriteError, Document, Query};
use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors surfaced by a document store.
///
/// The store implementation decides what counts as rate limiting; the
/// retry layer only looks at [`StoreError::is_rate_limit`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store is throttling us; safe to retry after a delay.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Anything else (network failure, missing document, bad request).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

impl From<AppwriteError> for StoreError {
    fn from(err: AppwriteError) -> Self {
        if err.is_rate_limit() {
            Self::RateLimited(err.to_string())
        } else {
            Self::Other(anyhow!(err))
        }
    }
}

/// One page of documents plus the collection's total count.
#[derive(Debug, Clone)]
pub struct DocumentPage {
    pub documents: Vec<Document>,
    pub total: u64,
}

/// Trait over the backing document database.
///
/// Mirrors the minimal surface the migrations need: list a page by
/// offset/limit, and read/write single documents by id.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// List documents in the store's default order.
    async fn list(
        &self,
        collection: &str,
        limit: u64,
        offset: u64,
    ) -> Result<DocumentPage, StoreError>;

    /// Fetch a single document by id.
    async fn get(&self, collection: &str, id: &str) -> Result<Document, StoreError>;

    /// Create a document with a caller-chosen id.
    async fn create(
        &self,
        collection: &str,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<Document, StoreError>;

    /// Patch the given attributes of an existing document.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<Document, StoreError>;
}

/// Production [`DocumentStore`] backed by the Appwrite Databases API.
#[derive(Debug, Clone)]
pub struct AppwriteStore {
    client: appwrite::Client,
    database_id: String,
}

impl AppwriteStore {
    pub fn new(client: appwrite::Client, database_id: impl Into<String>) -> Self {
        Self {
            client,
            database_id: database_id.into(),
        }
    }
}

#[async_trait]
impl DocumentStore for AppwriteStore {
    async fn list(
        &self,
        collection: &str,
        limit: u64,
        offset: u64,
    ) -> Result<DocumentPage, StoreError> {
        let list = self
            .client
            .list_documents(
                &self.database_id,
                collection,
                &[Query::limit(limit), Query::offset(offset)],
            )
            .await?;

        Ok(DocumentPage {
            documents: list.documents,
            total: list.total,
        })
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Document, StoreError> {
        Ok(self
            .client
            .get_document(&self.database_id, collection, id)
            .await?)
    }

    async fn create(
        &self,
        collection: &str,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        Ok(self
            .client
            .create_document(&self.database_id, collection, id, data)
            .await?)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        Ok(self
            .client
            .update_document(&self.database_id, collection, id, data)
            .await?)
    }
}
