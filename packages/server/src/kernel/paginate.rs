//! Offset/limit batch pagination over a document collection.
//!
//! The store has no streaming API, so collection walks pull pages with
//! an offset cursor until a page comes back empty. That empty page is
//! the single termination condition: an empty collection terminates on
//! the first pull, and a final page of exactly `page_size` documents
//! terminates on the pull after it.

use std::collections::HashMap;
use std::time::Duration;

use appwrite::Document;

use super::store::{DocumentStore, StoreError};

/// Delay between lookup-table pages; reads are cheap but the store
/// still meters them.
const LOOKUP_PAGE_DELAY: Duration = Duration::from_millis(100);

/// Pull-based pager over one collection.
pub struct Pager<'a> {
    store: &'a dyn DocumentStore,
    collection: &'a str,
    page_size: u64,
    offset: u64,
    exhausted: bool,
}

impl<'a> Pager<'a> {
    pub fn new(store: &'a dyn DocumentStore, collection: &'a str, page_size: u64) -> Self {
        Self {
            store,
            collection,
            page_size,
            offset: 0,
            exhausted: false,
        }
    }

    /// Fetch the next page, or `None` once the collection is exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Document>>, StoreError> {
        if self.exhausted {
            return Ok(None);
        }

        let page = self
            .store
            .list(self.collection, self.page_size, self.offset)
            .await?;

        if page.documents.is_empty() {
            self.exhausted = true;
            return Ok(None);
        }

        self.offset += self.page_size;
        Ok(Some(page.documents))
    }
}

/// Fully paginate `collection` into an id -> document map.
///
/// Used to preload a related collection before a join-style backfill.
/// The map is only returned after the final page, so callers never see
/// a partially built lookup. Assumes the related collection fits in
/// memory; per-record fallback for huge collections is an accepted
/// scaling limit.
pub async fn build_lookup(
    store: &dyn DocumentStore,
    collection: &str,
    page_size: u64,
) -> Result<HashMap<String, Document>, StoreError> {
    let mut lookup = HashMap::new();
    let mut pager = Pager::new(store, collection, page_size);

    while let Some(documents) = pager.next_page().await? {
        for doc in documents {
            lookup.insert(doc.id.clone(), doc);
        }
        tokio::time::sleep(LOOKUP_PAGE_DELAY).await;
    }

    Ok(lookup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::InMemoryStore;
    use serde_json::json;

    fn store_with_docs(collection: &str, count: usize) -> InMemoryStore {
        let store = InMemoryStore::new();
        for i in 0..count {
            store.insert(collection, &format!("doc-{i}"), json!({ "n": i }));
        }
        store
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_collection_terminates_immediately() {
        let store = InMemoryStore::new();
        let mut pager = Pager::new(&store, "clientes", 25);

        assert!(pager.next_page().await.unwrap().is_none());
        // Exhaustion is sticky
        assert!(pager.next_page().await.unwrap().is_none());
        assert_eq!(store.list_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exact_page_size_collection_terminates_on_next_pull() {
        let store = store_with_docs("clientes", 25);
        let mut pager = Pager::new(&store, "clientes", 25);

        let page = pager.next_page().await.unwrap().unwrap();
        assert_eq!(page.len(), 25);
        assert!(pager.next_page().await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_final_page_is_not_skipped() {
        let store = store_with_docs("clientes", 60);
        let mut pager = Pager::new(&store, "clientes", 25);

        let mut seen = 0;
        while let Some(page) = pager.next_page().await.unwrap() {
            seen += page.len();
        }
        assert_eq!(seen, 60);
    }

    #[tokio::test(start_paused = true)]
    async fn test_build_lookup_loads_every_document() {
        let store = store_with_docs("clientes", 230);
        let lookup = build_lookup(&store, "clientes", 100).await.unwrap();

        assert_eq!(lookup.len(), 230);
        assert!(lookup.contains_key("doc-0"));
        assert!(lookup.contains_key("doc-229"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_build_lookup_of_empty_collection_is_empty() {
        let store = InMemoryStore::new();
        let lookup = build_lookup(&store, "clientes", 100).await.unwrap();
        assert!(lookup.is_empty());
    }
}
