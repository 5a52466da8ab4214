//! Minimal Appwrite Databases REST client
//!
//! Covers the document operations the backend needs: list with query
//! filters, get, create and update. No realtime, storage or account
//! surface.
//!
//! # Example
//!
//! ```rust,ignore
//! use appwrite::{Client, Query};
//!
//! let client = Client::new(endpoint, project_id, api_key);
//!
//! let page = client
//!     .list_documents("main", "clientes", &[Query::limit(25), Query::offset(50)])
//!     .await?;
//! println!("{} of {} documents", page.documents.len(), page.total);
//! ```

pub mod error;
pub mod models;

pub use error::{AppwriteError, Result};
pub use models::{Document, DocumentList};

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::{json, Map, Value};
use tracing::debug;

/// A single query filter, serialized the way the Appwrite REST API
/// expects (`queries[]` entries of JSON-encoded method/values pairs).
#[derive(Debug, Clone)]
pub struct Query(String);

impl Query {
    fn method(method: &str, values: Value) -> Self {
        Self(json!({ "method": method, "values": values }).to_string())
    }

    /// Limit the number of documents returned.
    pub fn limit(limit: u64) -> Self {
        Self::method("limit", json!([limit]))
    }

    /// Skip the first `offset` documents.
    pub fn offset(offset: u64) -> Self {
        Self::method("offset", json!([offset]))
    }

    /// Attribute equals value.
    pub fn equal(attribute: &str, value: impl Into<Value>) -> Self {
        Self(json!({ "method": "equal", "attribute": attribute, "values": [value.into()] }).to_string())
    }

    /// Attribute value is one of the given set.
    pub fn contains(attribute: &str, values: Vec<Value>) -> Self {
        Self(json!({ "method": "contains", "attribute": attribute, "values": values }).to_string())
    }

    /// Full-text search on an indexed attribute.
    pub fn search(attribute: &str, term: &str) -> Self {
        Self(json!({ "method": "search", "attribute": attribute, "values": [term] }).to_string())
    }

    /// Sort ascending by attribute.
    pub fn order_asc(attribute: &str) -> Self {
        Self(json!({ "method": "orderAsc", "attribute": attribute, "values": [] }).to_string())
    }

    /// Sort descending by attribute.
    pub fn order_desc(attribute: &str) -> Self {
        Self(json!({ "method": "orderDesc", "attribute": attribute, "values": [] }).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Appwrite server-side client authenticated with an API key.
#[derive(Debug, Clone)]
pub struct Client {
    http_client: reqwest::Client,
    endpoint: String,
    project_id: String,
    api_key: String,
}

impl Client {
    /// Create a new client against the given endpoint (e.g.
    /// `https://appwrite.example.com/v1`).
    pub fn new(
        endpoint: impl Into<String>,
        project_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let endpoint = endpoint.into();
        Self {
            http_client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            api_key: api_key.into(),
        }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(project) = HeaderValue::from_str(&self.project_id) {
            headers.insert("X-Appwrite-Project", project);
        }
        if let Ok(key) = HeaderValue::from_str(&self.api_key) {
            headers.insert("X-Appwrite-Key", key);
        }
        headers
    }

    fn documents_url(&self, database_id: &str, collection_id: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.endpoint, database_id, collection_id
        )
    }

    /// Turn a non-2xx response into an `Api` error with Appwrite's message.
    async fn api_error(response: reqwest::Response) -> AppwriteError {
        let code = response.status().as_u16();
        let message = match response.json::<Value>().await {
            Ok(body) => body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
            Err(_) => "unknown error".to_string(),
        };
        AppwriteError::Api { code, message }
    }

    /// List documents in a collection, honoring the given query filters.
    pub async fn list_documents(
        &self,
        database_id: &str,
        collection_id: &str,
        queries: &[Query],
    ) -> Result<DocumentList> {
        let url = self.documents_url(database_id, collection_id);
        let params: Vec<(&str, &str)> =
            queries.iter().map(|q| ("queries[]", q.as_str())).collect();

        debug!(collection = collection_id, queries = queries.len(), "listing documents");

        let response = self
            .http_client
            .get(&url)
            .headers(self.headers())
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        response
            .json::<DocumentList>()
            .await
            .map_err(|e| AppwriteError::Parse(e.to_string()))
    }

    /// Fetch a single document by id.
    pub async fn get_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
    ) -> Result<Document> {
        let url = format!(
            "{}/{}",
            self.documents_url(database_id, collection_id),
            document_id
        );

        let response = self.http_client.get(&url).headers(self.headers()).send().await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        response
            .json::<Document>()
            .await
            .map_err(|e| AppwriteError::Parse(e.to_string()))
    }

    /// Create a document with a caller-chosen id.
    pub async fn create_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
        data: Map<String, Value>,
    ) -> Result<Document> {
        let url = self.documents_url(database_id, collection_id);

        let response = self
            .http_client
            .post(&url)
            .headers(self.headers())
            .json(&json!({ "documentId": document_id, "data": data }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        response
            .json::<Document>()
            .await
            .map_err(|e| AppwriteError::Parse(e.to_string()))
    }

    /// Patch the given attributes of an existing document.
    pub async fn update_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
        data: Map<String, Value>,
    ) -> Result<Document> {
        let url = format!(
            "{}/{}",
            self.documents_url(database_id, collection_id),
            document_id
        );

        let response = self
            .http_client
            .patch(&url)
            .headers(self.headers())
            .json(&json!({ "data": data }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        response
            .json::<Document>()
            .await
            .map_err(|e| AppwriteError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_limit_shape() {
        let q = Query::limit(25);
        let parsed: Value = serde_json::from_str(q.as_str()).unwrap();
        assert_eq!(parsed["method"], "limit");
        assert_eq!(parsed["values"][0], 25);
    }

    #[test]
    fn test_query_equal_carries_attribute() {
        let q = Query::equal("cliente_id", "abc");
        let parsed: Value = serde_json::from_str(q.as_str()).unwrap();
        assert_eq!(parsed["method"], "equal");
        assert_eq!(parsed["attribute"], "cliente_id");
        assert_eq!(parsed["values"][0], "abc");
    }

    #[test]
    fn test_endpoint_trailing_slash_is_trimmed() {
        let client = Client::new("https://example.com/v1/", "proj", "key");
        assert_eq!(
            client.documents_url("db", "col"),
            "https://example.com/v1/databases/db/collections/col/documents"
        );
    }
}
