//! Document store persisting each collection as a JSON-lines file.
//!
//! Collections live side by side in one directory as `<collection>.jsonl`,
//! one document per line in insertion order. Appends go straight to the
//! file; clearing swaps in an empty file atomically. An in-memory index of
//! identifiers per collection enforces `id` uniqueness without rescanning the
//! file on every insert.

use std::collections::{HashMap, HashSet};
use std::io::{self, Write};

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::{Dir, OpenOptions};
use tokio::sync::Mutex;

use super::{Document, DocumentStore, Filter, StoreError, document_id, write_atomic};

const EXTENSION: &str = ".jsonl";

/// Directory-backed document store.
#[derive(Debug)]
pub struct JsonDirDocumentStore {
    root: Utf8PathBuf,
    dir: Dir,
    ids: Mutex<HashMap<String, HashSet<String>>>,
}

impl JsonDirDocumentStore {
    /// Opens the store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when the directory cannot be
    /// created or opened.
    pub fn open(path: impl Into<Utf8PathBuf>) -> Result<Self, StoreError> {
        let root = path.into();
        Dir::create_ambient_dir_all(&root, ambient_authority())
            .map_err(|err| StoreError::unavailable(format!("create {root}: {err}")))?;
        let dir = Dir::open_ambient_dir(&root, ambient_authority())
            .map_err(|err| StoreError::unavailable(format!("open {root}: {err}")))?;
        Ok(Self {
            root,
            dir,
            ids: Mutex::new(HashMap::new()),
        })
    }

    /// Directory holding the collection files.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn file_name(collection: &str) -> Result<String, StoreError> {
        let valid = !collection.is_empty()
            && collection
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if valid {
            Ok(format!("{collection}{EXTENSION}"))
        } else {
            Err(StoreError::write(
                collection,
                "collection names may only contain letters, digits, '-' and '_'",
            ))
        }
    }

    fn read_documents(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let file_name = Self::file_name(collection)?;
        let contents = match self.dir.read_to_string(&file_name) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StoreError::read(collection, err.to_string())),
        };
        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(index, line)| {
                serde_json::from_str(line).map_err(|err| {
                    StoreError::read(
                        collection,
                        format!("line {}: {err}", index.saturating_add(1)),
                    )
                })
            })
            .collect()
    }

    fn append(&self, collection: &str, documents: &[Document]) -> Result<(), StoreError> {
        let file_name = Self::file_name(collection)?;
        let mut buffer = Vec::new();
        for document in documents {
            serde_json::to_writer(&mut buffer, document)
                .map_err(|err| StoreError::invalid_document(collection, err.to_string()))?;
            buffer.push(b'\n');
        }
        let mut options = OpenOptions::new();
        options.append(true).create(true);
        let mut file = self
            .dir
            .open_with(&file_name, &options)
            .map_err(|err| StoreError::write(collection, err.to_string()))?;
        file.write_all(&buffer)
            .and_then(|()| file.sync_data())
            .map_err(|err| StoreError::write(collection, err.to_string()))
    }

    fn known_ids<'a>(
        &self,
        index: &'a mut HashMap<String, HashSet<String>>,
        collection: &str,
    ) -> Result<&'a mut HashSet<String>, StoreError> {
        if !index.contains_key(collection) {
            let mut ids = HashSet::new();
            for document in self.read_documents(collection)? {
                ids.insert(document_id(collection, &document)?.to_owned());
            }
            index.insert(collection.to_owned(), ids);
        }
        index
            .get_mut(collection)
            .ok_or_else(|| StoreError::unavailable("identifier index lost its entry"))
    }

    async fn insert_checked(
        &self,
        collection: &str,
        documents: &[Document],
    ) -> Result<(), StoreError> {
        let mut index = self.ids.lock().await;
        let known = self.known_ids(&mut index, collection)?;
        let mut fresh = HashSet::with_capacity(documents.len());
        for document in documents {
            let id = document_id(collection, document)?;
            if known.contains(id) || !fresh.insert(id.to_owned()) {
                return Err(StoreError::duplicate_id(collection, id));
            }
        }
        self.append(collection, documents)?;
        known.extend(fresh);
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for JsonDirDocumentStore {
    fn name(&self) -> String {
        format!("json-dir:{}", self.root)
    }

    async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        let entries = self
            .dir
            .entries()
            .map_err(|err| StoreError::unavailable(format!("list {}: {err}", self.root)))?;
        let mut names = Vec::new();
        for item in entries {
            let entry =
                item.map_err(|err| StoreError::unavailable(format!("list {}: {err}", self.root)))?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            if let Some(collection) = name.strip_suffix(EXTENSION) {
                names.push(collection.to_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn insert_one(&self, collection: &str, document: Document) -> Result<(), StoreError> {
        self.insert_checked(collection, std::slice::from_ref(&document))
            .await
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<usize, StoreError> {
        self.insert_checked(collection, &documents).await?;
        Ok(documents.len())
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        limit: Option<usize>,
    ) -> Result<Vec<Document>, StoreError> {
        let _guard = self.ids.lock().await;
        Ok(self
            .read_documents(collection)?
            .into_iter()
            .filter(|doc| filter.matches(doc))
            .take(limit.unwrap_or(usize::MAX))
            .collect())
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let _guard = self.ids.lock().await;
        let matching = self
            .read_documents(collection)?
            .iter()
            .filter(|doc| filter.matches(doc))
            .count();
        Ok(u64::try_from(matching).unwrap_or(u64::MAX))
    }

    async fn clear_collection(&self, collection: &str) -> Result<u64, StoreError> {
        let mut index = self.ids.lock().await;
        let file_name = Self::file_name(collection)?;
        let removed = self.read_documents(collection)?.len();
        if removed > 0 || self.dir.exists(&file_name) {
            write_atomic(&self.dir, Utf8Path::new(&file_name), b"")
                .map_err(|err| StoreError::write(collection, err.to_string()))?;
        }
        index.insert(collection.to_owned(), HashSet::new());
        Ok(u64::try_from(removed).unwrap_or(u64::MAX))
    }
}
