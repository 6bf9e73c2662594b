//! In-process document store used by tests and dry runs.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{Document, DocumentStore, Filter, StoreError, document_id};

type Collections = BTreeMap<String, Vec<Document>>;

/// Document store that keeps every collection in memory.
///
/// # Example
///
/// ```
/// use seeder::store::{DocumentStore, Filter, MemoryDocumentStore};
/// use serde_json::json;
///
/// # tokio::runtime::Builder::new_current_thread().build().expect("runtime").block_on(async {
/// let store = MemoryDocumentStore::new("memory");
/// store.insert_one("tags", json!({ "id": "t1", "name": "bug" })).await.expect("insert");
///
/// assert_eq!(store.count("tags", &Filter::all()).await.expect("count"), 1);
/// # });
/// ```
#[derive(Debug)]
pub struct MemoryDocumentStore {
    name: String,
    collections: Mutex<Collections>,
}

impl MemoryDocumentStore {
    /// Creates an empty store identified as `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collections: Mutex::new(BTreeMap::new()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>, StoreError> {
        self.collections
            .lock()
            .map_err(|_| StoreError::unavailable("memory store lock poisoned"))
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new("memory")
    }
}

fn check_new_ids<'a>(
    collection: &str,
    existing: &[Document],
    documents: impl IntoIterator<Item = &'a Document>,
) -> Result<(), StoreError> {
    let mut seen: HashSet<&str> = existing
        .iter()
        .filter_map(|doc| doc.get("id").and_then(serde_json::Value::as_str))
        .collect();
    for document in documents {
        let id = document_id(collection, document)?;
        if !seen.insert(id) {
            return Err(StoreError::duplicate_id(collection, id));
        }
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.lock()?.keys().cloned().collect())
    }

    async fn insert_one(&self, collection: &str, document: Document) -> Result<(), StoreError> {
        let mut collections = self.lock()?;
        let entry = collections.entry(collection.to_owned()).or_default();
        check_new_ids(collection, entry, [&document])?;
        entry.push(document);
        Ok(())
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<usize, StoreError> {
        let mut collections = self.lock()?;
        let entry = collections.entry(collection.to_owned()).or_default();
        check_new_ids(collection, entry, &documents)?;
        let inserted = documents.len();
        entry.extend(documents);
        Ok(inserted)
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        limit: Option<usize>,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.lock()?;
        let Some(documents) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(documents
            .iter()
            .filter(|doc| filter.matches(doc))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let collections = self.lock()?;
        let matching = collections
            .get(collection)
            .map_or(0, |documents| documents.iter().filter(|doc| filter.matches(doc)).count());
        Ok(u64::try_from(matching).unwrap_or(u64::MAX))
    }

    async fn clear_collection(&self, collection: &str) -> Result<u64, StoreError> {
        let mut collections = self.lock()?;
        let removed = collections
            .get_mut(collection)
            .map_or(0, |documents| std::mem::take(documents).len());
        Ok(u64::try_from(removed).unwrap_or(u64::MAX))
    }
}
