//! Point-in-time backups of the document store and rollback from them.
//!
//! Each backup is a directory `<root>/<id>` holding one `<collection>.json`
//! array per non-empty collection plus a `metadata.json` describing the set.
//! Backups are assembled in a hidden staging directory and renamed into
//! place, so a directory named like a backup id is always complete.
//!
//! Restoring parses every artefact before touching the store. Once loading
//! starts there is no compensation: a failure part way through leaves the
//! collections restored so far in place and reports the collection that
//! failed.

mod snapshot_io;

use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::store::{DocumentStore, Filter, StoreError};
use snapshot_io::CollectionSnapshot;

const ID_PREFIX: &str = "backup-";
const ID_FORMAT: &str = "%Y%m%dT%H%M%S%3fZ";
const METADATA_VERSION: &str = "1.0";
const ALL_COLLECTIONS: &str = "*";

/// Errors surfaced while creating, listing, or restoring backups.
#[derive(Debug, Error)]
pub enum BackupError {
    /// A filesystem operation on the backup root failed.
    #[error("filesystem operation failed ({path}): {message}")]
    Io {
        /// Path being touched.
        path: Utf8PathBuf,
        /// I/O detail.
        message: String,
    },
    /// Reading a collection out of the store failed.
    #[error("failed to snapshot collection '{collection}': {source}")]
    Snapshot {
        /// Collection being read, or `*` for the collection listing.
        collection: String,
        /// Store failure.
        #[source]
        source: StoreError,
    },
    /// A collection artefact is missing, malformed, or inconsistent.
    #[error("backup artefact {path} is unusable: {message}")]
    Artifact {
        /// Artefact path.
        path: Utf8PathBuf,
        /// What is wrong with it.
        message: String,
    },
    /// `metadata.json` is missing or malformed.
    #[error("backup metadata {path} is unusable: {message}")]
    Metadata {
        /// Metadata path.
        path: Utf8PathBuf,
        /// What is wrong with it.
        message: String,
    },
    /// No backup carries the requested id.
    #[error("backup '{id}' does not exist")]
    NotFound {
        /// Requested id.
        id: String,
    },
    /// The backup root holds no backups.
    #[error("no backups found in {root}")]
    NoBackups {
        /// Backup root.
        root: Utf8PathBuf,
    },
    /// Clearing or reloading the store failed during a restore.
    #[error("failed to restore collection '{collection}': {source}")]
    Restore {
        /// Collection being cleared or loaded, or `*` for the listing.
        collection: String,
        /// Store failure.
        #[source]
        source: StoreError,
    },
}

impl BackupError {
    fn io(path: impl Into<Utf8PathBuf>, error: impl Display) -> Self {
        Self::Io {
            path: path.into(),
            message: error.to_string(),
        }
    }

    fn artifact(path: impl Into<Utf8PathBuf>, error: impl Display) -> Self {
        Self::Artifact {
            path: path.into(),
            message: error.to_string(),
        }
    }

    fn metadata(path: impl Into<Utf8PathBuf>, error: impl Display) -> Self {
        Self::Metadata {
            path: path.into(),
            message: error.to_string(),
        }
    }

    fn snapshot(collection: &str, source: StoreError) -> Self {
        Self::Snapshot {
            collection: collection.to_owned(),
            source,
        }
    }

    fn restore(collection: &str, source: StoreError) -> Self {
        Self::Restore {
            collection: collection.to_owned(),
            source,
        }
    }
}

/// Contents of a backup's `metadata.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupMetadata {
    /// Sortable identifier, also the backup directory name.
    pub id: String,
    /// When the backup was taken.
    pub timestamp: DateTime<Utc>,
    /// Free-form reason for the backup.
    pub description: String,
    /// Names of the captured collections, sorted.
    pub collections: Vec<String>,
    /// Document count per captured collection.
    pub document_counts: BTreeMap<String, u64>,
    /// Sum of `document_counts`.
    pub total_records: u64,
    /// Name of the store the backup was taken from.
    pub store: String,
    /// Metadata format version.
    pub version: String,
}

/// Aggregate figures over every backup under the root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupStats {
    /// Number of backups.
    pub count: usize,
    /// Bytes on disk across all backups.
    pub total_bytes: u64,
    /// Documents captured across all backups.
    pub total_records: u64,
    /// Timestamp of the oldest backup.
    pub oldest: Option<DateTime<Utc>>,
    /// Timestamp of the newest backup.
    pub newest: Option<DateTime<Utc>>,
}

/// Outcome of restoring a backup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreSummary {
    /// The restored backup.
    pub backup_id: String,
    /// Collections reloaded from the backup.
    pub collections: usize,
    /// Live documents removed before loading.
    pub cleared: u64,
    /// Documents loaded from the backup.
    pub restored: u64,
}

struct LoadedBackup {
    metadata: BackupMetadata,
    collections: Vec<CollectionSnapshot>,
}

fn count(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

fn is_backup_id(name: &str) -> bool {
    name.starts_with(ID_PREFIX) && snapshot_io::is_plain_name(name)
}

/// Creates and restores backups of one [`DocumentStore`] under a root
/// directory.
pub struct BackupManager {
    store: Arc<dyn DocumentStore>,
    root: Utf8PathBuf,
    dir: Dir,
    clock: Arc<dyn Clock>,
}

impl BackupManager {
    /// Opens the backup root, creating it when missing.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Io`] when the directory cannot be created or
    /// opened.
    pub fn open(
        store: Arc<dyn DocumentStore>,
        root: impl Into<Utf8PathBuf>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, BackupError> {
        let root = root.into();
        Dir::create_ambient_dir_all(&root, ambient_authority())
            .map_err(|error| BackupError::io(&root, error))?;
        let dir = Dir::open_ambient_dir(&root, ambient_authority())
            .map_err(|error| BackupError::io(&root, error))?;
        Ok(Self {
            store,
            root,
            dir,
            clock,
        })
    }

    /// Directory holding the backups.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Captures every non-empty collection into a new backup.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Snapshot`] when the store cannot be read and
    /// [`BackupError::Io`] or [`BackupError::Artifact`] when the backup
    /// cannot be written. Nothing is left behind under the root on failure.
    pub async fn create_backup(&self, description: &str) -> Result<BackupMetadata, BackupError> {
        let timestamp = self.clock.utc();
        let snapshots = self.snapshot_collections().await?;
        let document_counts: BTreeMap<String, u64> = snapshots
            .iter()
            .map(|snapshot| (snapshot.name.clone(), count(snapshot.documents.len())))
            .collect();
        let metadata = BackupMetadata {
            id: self.unused_id(timestamp),
            timestamp,
            description: description.to_owned(),
            total_records: document_counts
                .values()
                .fold(0, |sum, n| sum.saturating_add(*n)),
            collections: document_counts.keys().cloned().collect(),
            document_counts,
            store: self.store.name(),
            version: METADATA_VERSION.to_owned(),
        };
        snapshot_io::publish_backup(&self.dir, &self.root, &metadata, &snapshots)?;
        info!(
            backup = %metadata.id,
            collections = metadata.collections.len(),
            records = metadata.total_records,
            "backup written"
        );
        Ok(metadata)
    }

    /// Replaces the store contents with the backup named `id`.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::NotFound`] for an unknown id,
    /// [`BackupError::Metadata`] or [`BackupError::Artifact`] when the backup
    /// is unreadable (the store is untouched in that case), and
    /// [`BackupError::Restore`] when clearing or loading fails.
    pub async fn restore_backup(&self, id: &str) -> Result<RestoreSummary, BackupError> {
        let loaded = self.load(id)?;
        let cleared = self.clear_live_collections().await?;
        let mut restored: u64 = 0;
        for snapshot in &loaded.collections {
            let inserted = self
                .store
                .insert_many(&snapshot.name, snapshot.documents.clone())
                .await
                .map_err(|source| BackupError::restore(&snapshot.name, source))?;
            restored = restored.saturating_add(count(inserted));
        }
        info!(backup = %loaded.metadata.id, cleared, restored, "backup restored");
        Ok(RestoreSummary {
            backup_id: loaded.metadata.id,
            collections: loaded.collections.len(),
            cleared,
            restored,
        })
    }

    /// Restores the newest backup.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::NoBackups`] when the root holds none, otherwise
    /// whatever [`Self::restore_backup`] returns.
    pub async fn restore_latest(&self) -> Result<RestoreSummary, BackupError> {
        let latest = self
            .list_backups()?
            .into_iter()
            .next()
            .ok_or_else(|| BackupError::NoBackups {
                root: self.root.clone(),
            })?;
        self.restore_backup(&latest.id).await
    }

    /// Metadata of every readable backup, newest first.
    ///
    /// Staging directories and backups with unreadable metadata are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Io`] when the root cannot be listed.
    pub fn list_backups(&self) -> Result<Vec<BackupMetadata>, BackupError> {
        let entries = self
            .dir
            .entries()
            .map_err(|error| BackupError::io(&self.root, error))?;
        let mut backups = Vec::new();
        for item in entries {
            let entry = item.map_err(|error| BackupError::io(&self.root, error))?;
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            let is_dir = entry.file_type().is_ok_and(|kind| kind.is_dir());
            if !is_dir || !is_backup_id(&name) {
                continue;
            }
            let path = self.root.join(&name);
            let metadata = entry
                .open_dir()
                .map_err(|error| BackupError::io(&path, error))
                .and_then(|backup| snapshot_io::read_metadata(&backup, &path));
            match metadata {
                Ok(found) => backups.push(found),
                Err(error) => warn!(backup = %name, %error, "skipping unreadable backup"),
            }
        }
        backups.sort_by(|a, b| {
            (b.timestamp, b.id.len(), &b.id).cmp(&(a.timestamp, a.id.len(), &a.id))
        });
        Ok(backups)
    }

    /// Deletes backups taken more than `max_age` ago, returning how many
    /// were removed.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Io`] when listing or deleting fails.
    pub fn cleanup_old_backups(&self, max_age: TimeDelta) -> Result<usize, BackupError> {
        let cutoff = self
            .clock
            .utc()
            .checked_sub_signed(max_age)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let mut removed: usize = 0;
        for backup in self.list_backups()? {
            if backup.timestamp >= cutoff {
                continue;
            }
            self.dir
                .remove_dir_all(&backup.id)
                .map_err(|error| BackupError::io(self.root.join(&backup.id), error))?;
            info!(backup = %backup.id, "removed expired backup");
            removed = removed.saturating_add(1);
        }
        Ok(removed)
    }

    /// Count, size, and age range of the stored backups.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Io`] when a backup directory cannot be read.
    pub fn backup_stats(&self) -> Result<BackupStats, BackupError> {
        let backups = self.list_backups()?;
        let mut total_bytes: u64 = 0;
        let mut total_records: u64 = 0;
        for backup in &backups {
            let path = self.root.join(&backup.id);
            let size = self
                .dir
                .open_dir(&backup.id)
                .and_then(|dir| snapshot_io::directory_size(&dir))
                .map_err(|error| BackupError::io(&path, error))?;
            total_bytes = total_bytes.saturating_add(size);
            total_records = total_records.saturating_add(backup.total_records);
        }
        Ok(BackupStats {
            count: backups.len(),
            total_bytes,
            total_records,
            oldest: backups.last().map(|backup| backup.timestamp),
            newest: backups.first().map(|backup| backup.timestamp),
        })
    }

    fn unused_id(&self, timestamp: DateTime<Utc>) -> String {
        let base = format!("{ID_PREFIX}{}", timestamp.format(ID_FORMAT));
        std::iter::once(base.clone())
            .chain((1_u32..).map(|suffix| format!("{base}-{suffix}")))
            .find(|candidate| !self.dir.exists(candidate))
            .unwrap_or(base)
    }

    async fn snapshot_collections(&self) -> Result<Vec<CollectionSnapshot>, BackupError> {
        let names = self
            .store
            .list_collections()
            .await
            .map_err(|source| BackupError::snapshot(ALL_COLLECTIONS, source))?;
        let mut snapshots = Vec::with_capacity(names.len());
        for name in names {
            if !snapshot_io::is_plain_name(&name) {
                return Err(BackupError::artifact(
                    self.root.join(snapshot_io::artifact_name(&name)),
                    "collection name cannot be used as a file name",
                ));
            }
            let documents = self
                .store
                .find(&name, &Filter::all(), None)
                .await
                .map_err(|source| BackupError::snapshot(&name, source))?;
            if documents.is_empty() {
                debug!(collection = %name, "skipping empty collection");
                continue;
            }
            snapshots.push(CollectionSnapshot { name, documents });
        }
        Ok(snapshots)
    }

    fn load(&self, id: &str) -> Result<LoadedBackup, BackupError> {
        let not_found = || BackupError::NotFound { id: id.to_owned() };
        if !is_backup_id(id) {
            return Err(not_found());
        }
        let path = self.root.join(id);
        let backup = match self.dir.open_dir(id) {
            Ok(backup) => backup,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
            Err(error) => return Err(BackupError::io(&path, error)),
        };
        let metadata = snapshot_io::read_metadata(&backup, &path)?;
        let collections = metadata
            .collections
            .iter()
            .map(|collection| {
                let expected = metadata
                    .document_counts
                    .get(collection)
                    .copied()
                    .ok_or_else(|| {
                        BackupError::artifact(
                            path.join(snapshot_io::artifact_name(collection)),
                            "the metadata records no document count",
                        )
                    })?;
                snapshot_io::read_artifact(&backup, &path, collection, expected)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(LoadedBackup {
            metadata,
            collections,
        })
    }

    async fn clear_live_collections(&self) -> Result<u64, BackupError> {
        let names = self
            .store
            .list_collections()
            .await
            .map_err(|source| BackupError::restore(ALL_COLLECTIONS, source))?;
        let mut cleared: u64 = 0;
        for name in names {
            let removed = self
                .store
                .clear_collection(&name)
                .await
                .map_err(|source| BackupError::restore(&name, source))?;
            cleared = cleared.saturating_add(removed);
        }
        Ok(cleared)
    }
}
