//! Typed collection access over the untyped document store.

use std::marker::PhantomData;

use fixture_data::{
    AnalyticsRecord, BoardRecord, BoardTemplateRecord, ColumnRecord, CommentRecord, FileRecord,
    InvitationRecord, NotificationRecord, ReminderRecord, SpaceRecord, TagRecord, TaskRecord,
    UserPreferencesRecord, UserRecord, UserRolesRecord, UserSessionsRecord, WorkspaceRecord,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::store::{Document, DocumentStore, Filter, StoreError};

/// A record type stored in its own collection.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    /// Collection the record lives in.
    const COLLECTION: &'static str;

    /// The record's identifier.
    fn id(&self) -> Uuid;
}

macro_rules! entity {
    ($($record:ty => $collection:literal),* $(,)?) => {
        $(
            impl Entity for $record {
                const COLLECTION: &'static str = $collection;

                fn id(&self) -> Uuid {
                    self.id
                }
            }
        )*
    };
}

entity! {
    UserRecord => "users",
    UserPreferencesRecord => "userpreferences",
    UserSessionsRecord => "usersessions",
    UserRolesRecord => "userroles",
    WorkspaceRecord => "workspaces",
    SpaceRecord => "spaces",
    BoardRecord => "boards",
    ColumnRecord => "columns",
    BoardTemplateRecord => "boardtemplates",
    TagRecord => "tags",
    TaskRecord => "tasks",
    CommentRecord => "comments",
    NotificationRecord => "notifications",
    ReminderRecord => "reminders",
    FileRecord => "files",
    InvitationRecord => "invitations",
    AnalyticsRecord => "analytics",
}

/// Every collection the seeder writes, in dependency order.
pub const COLLECTIONS: &[&str] = &[
    UserRecord::COLLECTION,
    UserPreferencesRecord::COLLECTION,
    UserSessionsRecord::COLLECTION,
    UserRolesRecord::COLLECTION,
    WorkspaceRecord::COLLECTION,
    SpaceRecord::COLLECTION,
    BoardRecord::COLLECTION,
    ColumnRecord::COLLECTION,
    BoardTemplateRecord::COLLECTION,
    TagRecord::COLLECTION,
    TaskRecord::COLLECTION,
    CommentRecord::COLLECTION,
    NotificationRecord::COLLECTION,
    ReminderRecord::COLLECTION,
    FileRecord::COLLECTION,
    InvitationRecord::COLLECTION,
    AnalyticsRecord::COLLECTION,
];

/// Serialises a record into a store document.
///
/// # Errors
///
/// Returns [`StoreError::InvalidDocument`] when serialisation fails.
pub fn to_document<T: Entity>(record: &T) -> Result<Document, StoreError> {
    serde_json::to_value(record)
        .map_err(|err| StoreError::invalid_document(T::COLLECTION, err.to_string()))
}

/// Typed view of one collection.
///
/// # Example
///
/// ```
/// use fixture_data::TagRecord;
/// use seeder::models::Model;
/// use seeder::store::{Filter, MemoryDocumentStore};
///
/// # tokio::runtime::Builder::new_current_thread().build().expect("runtime").block_on(async {
/// let store = MemoryDocumentStore::default();
/// let tags = Model::<TagRecord>::new(&store);
/// assert_eq!(tags.count_documents(&Filter::all()).await.expect("count"), 0);
/// # });
/// ```
pub struct Model<'a, T> {
    store: &'a dyn DocumentStore,
    record: PhantomData<fn() -> T>,
}

impl<'a, T: Entity> Model<'a, T> {
    /// Wraps `store` for the `T` collection.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            store,
            record: PhantomData,
        }
    }

    /// Persists one record.
    ///
    /// # Errors
    ///
    /// Propagates serialisation and store failures.
    pub async fn create(&self, record: &T) -> Result<(), StoreError> {
        let document = to_document(record)?;
        self.store.insert_one(T::COLLECTION, document).await
    }

    /// Records matching `filter`, decoded, capped at `limit`.
    ///
    /// # Errors
    ///
    /// Propagates store failures and documents that do not decode as `T`.
    pub async fn find(&self, filter: &Filter, limit: Option<usize>) -> Result<Vec<T>, StoreError> {
        self.store
            .find(T::COLLECTION, filter, limit)
            .await?
            .into_iter()
            .map(|document| {
                serde_json::from_value(document)
                    .map_err(|err| StoreError::invalid_document(T::COLLECTION, err.to_string()))
            })
            .collect()
    }

    /// Number of records matching `filter`.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn count_documents(&self, filter: &Filter) -> Result<u64, StoreError> {
        self.store.count(T::COLLECTION, filter).await
    }
}
