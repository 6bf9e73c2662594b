//! A document store that rejects writes to one collection.

use async_trait::async_trait;
use seeder::store::{Document, DocumentStore, Filter, MemoryDocumentStore, StoreError};

/// Wraps a [`MemoryDocumentStore`], failing every insert into `collection`.
pub struct FailingStore {
    inner: MemoryDocumentStore,
    collection: &'static str,
}

impl FailingStore {
    pub fn new(collection: &'static str) -> Self {
        Self {
            inner: MemoryDocumentStore::new("failing"),
            collection,
        }
    }

    fn check(&self, collection: &str) -> Result<(), StoreError> {
        if collection == self.collection {
            Err(StoreError::write(collection, "injected write failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    fn name(&self) -> String {
        self.inner.name()
    }

    async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        self.inner.list_collections().await
    }

    async fn insert_one(&self, collection: &str, document: Document) -> Result<(), StoreError> {
        self.check(collection)?;
        self.inner.insert_one(collection, document).await
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<usize, StoreError> {
        self.check(collection)?;
        self.inner.insert_many(collection, documents).await
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        limit: Option<usize>,
    ) -> Result<Vec<Document>, StoreError> {
        self.inner.find(collection, filter, limit).await
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        self.inner.count(collection, filter).await
    }

    async fn clear_collection(&self, collection: &str) -> Result<u64, StoreError> {
        self.inner.clear_collection(collection).await
    }
}
