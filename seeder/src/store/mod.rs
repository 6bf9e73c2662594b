//! Document store port and its adapters.
//!
//! The seeder only needs a handful of operations from the store: enumerate
//! collections, insert documents, run equality queries, count, and clear.
//! [`DocumentStore`] captures exactly that surface so stages, models, and the
//! backup manager stay independent of the concrete backend.

mod atomic_io;
mod json_dir;
mod macros;
mod memory;

use async_trait::async_trait;
use serde_json::Value;

pub(crate) use atomic_io::write_atomic;
pub use json_dir::JsonDirDocumentStore;
use macros::define_port_error;
pub use memory::MemoryDocumentStore;

/// A stored document: a JSON object carrying a string `id` field.
pub type Document = Value;

define_port_error! {
    /// Errors raised by document store adapters.
    pub enum StoreError {
        /// The backend could not be reached or its state is unusable.
        Unavailable {
            /// Adapter-supplied detail.
            message: String,
        } => "document store unavailable: {message}",
        /// A read failed.
        Read {
            /// Collection being read.
            collection: String,
            /// Adapter-supplied detail.
            message: String,
        } => "failed to read collection '{collection}': {message}",
        /// A write failed.
        Write {
            /// Collection being written.
            collection: String,
            /// Adapter-supplied detail.
            message: String,
        } => "failed to write collection '{collection}': {message}",
        /// A document is not an object with a string `id`, or does not decode.
        InvalidDocument {
            /// Target collection.
            collection: String,
            /// What is wrong with it.
            message: String,
        } => "invalid document for collection '{collection}': {message}",
        /// A document with the same `id` already exists.
        DuplicateId {
            /// Target collection.
            collection: String,
            /// The repeated identifier.
            id: String,
        } => "collection '{collection}' already contains a document with id '{id}'",
    }
}

/// Conjunction of top-level field equality conditions.
///
/// # Example
///
/// ```
/// use seeder::store::Filter;
/// use serde_json::json;
///
/// let filter = Filter::eq("systemRole", "admin");
/// assert!(filter.matches(&json!({ "id": "1", "systemRole": "admin" })));
/// assert!(!filter.matches(&json!({ "id": "2", "systemRole": "user" })));
/// assert!(Filter::all().matches(&json!({ "id": "3" })));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// A filter matching every document.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            conditions: Vec::new(),
        }
    }

    /// A filter requiring `field` to equal `value`.
    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::all().and(field, value)
    }

    /// Adds another equality condition.
    #[must_use]
    pub fn and(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    /// Returns `true` when `document` satisfies every condition.
    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        self.conditions
            .iter()
            .all(|(field, expected)| document.get(field) == Some(expected))
    }
}

/// Returns the string `id` of a document.
///
/// # Errors
///
/// Returns [`StoreError::InvalidDocument`] when the document is not an object
/// or has no string `id`.
pub fn document_id<'a>(collection: &str, document: &'a Document) -> Result<&'a str, StoreError> {
    if !document.is_object() {
        return Err(StoreError::invalid_document(
            collection,
            "document must be a JSON object",
        ));
    }
    document
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::invalid_document(collection, "document needs a string 'id'"))
}

/// Port for the document database the seeder writes into.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Stable identifier of the backing store, recorded in backup metadata.
    fn name(&self) -> String;

    /// Names of every existing collection, sorted.
    async fn list_collections(&self) -> Result<Vec<String>, StoreError>;

    /// Inserts one document, creating the collection when needed.
    async fn insert_one(&self, collection: &str, document: Document) -> Result<(), StoreError>;

    /// Inserts documents in order; nothing is written when any is rejected.
    ///
    /// Returns the number of inserted documents.
    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<usize, StoreError>;

    /// Documents matching `filter` in insertion order, capped at `limit`.
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        limit: Option<usize>,
    ) -> Result<Vec<Document>, StoreError>;

    /// Number of documents matching `filter`.
    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;

    /// Removes every document from a collection, returning how many went.
    ///
    /// The collection itself keeps existing.
    async fn clear_collection(&self, collection: &str) -> Result<u64, StoreError>;
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case::missing_field(json!({ "id": "1" }), false)]
    #[case::different_value(json!({ "id": "1", "board": "b", "status": "done" }), false)]
    #[case::all_conditions(json!({ "id": "1", "board": "a", "status": "done" }), true)]
    fn filters_require_every_condition(#[case] document: Document, #[case] expected: bool) {
        let filter = Filter::eq("board", "a").and("status", "done");
        assert_eq!(filter.matches(&document), expected);
    }

    #[rstest]
    #[case::not_an_object(json!(["id"]))]
    #[case::numeric_id(json!({ "id": 4 }))]
    #[case::missing_id(json!({ "name": "x" }))]
    fn document_id_rejects_malformed_documents(#[case] document: Document) {
        let err = document_id("users", &document).expect_err("malformed document");
        assert!(matches!(err, StoreError::InvalidDocument { .. }));
    }

    #[test]
    fn document_id_reads_string_ids() {
        let document = json!({ "id": "abc" });
        assert_eq!(document_id("users", &document).expect("id"), "abc");
    }
}
