//! Backup directory writing and reading helpers.

use std::io;

use camino::Utf8Path;
use cap_std::fs::Dir;
use uuid::Uuid;

use super::{BackupError, BackupMetadata};
use crate::store::{Document, write_atomic};

pub(super) const METADATA_FILENAME: &str = "metadata.json";

/// One collection captured for, or loaded from, a backup.
pub(super) struct CollectionSnapshot {
    pub(super) name: String,
    pub(super) documents: Vec<Document>,
}

/// Names usable both as a collection and as a directory entry.
pub(super) fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(['.', '-'])
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub(super) fn artifact_name(collection: &str) -> String {
    format!("{collection}.json")
}

/// Writes a complete backup into a hidden staging directory and renames it
/// to `metadata.id` under `root_dir`.
///
/// The staging directory is removed when any step fails.
pub(super) fn publish_backup(
    root_dir: &Dir,
    root: &Utf8Path,
    metadata: &BackupMetadata,
    snapshots: &[CollectionSnapshot],
) -> Result<(), BackupError> {
    let staging_name = format!(".tmp-backup-{}", Uuid::new_v4().simple());
    root_dir
        .create_dir(&staging_name)
        .map_err(|error| BackupError::io(root.join(&staging_name), error))?;

    let result = write_staged(root_dir, root, &staging_name, metadata, snapshots).and_then(|()| {
        root_dir
            .rename(&staging_name, root_dir, &metadata.id)
            .map_err(|error| BackupError::io(root.join(&metadata.id), error))
    });
    if result.is_err() {
        let _cleanup_result = root_dir.remove_dir_all(&staging_name);
    }
    result
}

fn write_staged(
    root_dir: &Dir,
    root: &Utf8Path,
    staging_name: &str,
    metadata: &BackupMetadata,
    snapshots: &[CollectionSnapshot],
) -> Result<(), BackupError> {
    let staging_path = root.join(staging_name);
    let staging = root_dir
        .open_dir(staging_name)
        .map_err(|error| BackupError::io(&staging_path, error))?;

    for snapshot in snapshots {
        let name = artifact_name(&snapshot.name);
        let contents = serde_json::to_vec_pretty(&snapshot.documents)
            .map_err(|error| BackupError::artifact(staging_path.join(&name), error))?;
        staging
            .write(&name, contents)
            .map_err(|error| BackupError::io(staging_path.join(&name), error))?;
    }

    // Metadata goes last: a directory without it is never a finished backup.
    let contents = serde_json::to_vec_pretty(metadata)
        .map_err(|error| BackupError::metadata(staging_path.join(METADATA_FILENAME), error))?;
    write_atomic(&staging, Utf8Path::new(METADATA_FILENAME), &contents)
        .map_err(|error| BackupError::io(staging_path.join(METADATA_FILENAME), error))
}

pub(super) fn read_metadata(
    backup: &Dir,
    backup_path: &Utf8Path,
) -> Result<BackupMetadata, BackupError> {
    let path = backup_path.join(METADATA_FILENAME);
    let contents = backup
        .read_to_string(METADATA_FILENAME)
        .map_err(|error| BackupError::metadata(&path, error))?;
    serde_json::from_str(&contents).map_err(|error| BackupError::metadata(&path, error))
}

/// Loads one collection artefact and checks it against the recorded count.
pub(super) fn read_artifact(
    backup: &Dir,
    backup_path: &Utf8Path,
    collection: &str,
    expected: u64,
) -> Result<CollectionSnapshot, BackupError> {
    let name = artifact_name(collection);
    let path = backup_path.join(&name);
    if !is_plain_name(collection) {
        return Err(BackupError::artifact(
            &path,
            "collection name cannot be used as a file name",
        ));
    }
    let contents = backup
        .read_to_string(&name)
        .map_err(|error| BackupError::artifact(&path, error))?;
    let documents: Vec<Document> =
        serde_json::from_str(&contents).map_err(|error| BackupError::artifact(&path, error))?;
    let found = u64::try_from(documents.len()).unwrap_or(u64::MAX);
    if found != expected {
        return Err(BackupError::artifact(
            &path,
            format!("holds {found} documents but the metadata records {expected}"),
        ));
    }
    Ok(CollectionSnapshot {
        name: collection.to_owned(),
        documents,
    })
}

/// Total size in bytes of the files directly inside `backup`.
pub(super) fn directory_size(backup: &Dir) -> io::Result<u64> {
    let mut total: u64 = 0;
    for entry in backup.entries()? {
        let len = entry?.metadata()?.len();
        total = total.saturating_add(len);
    }
    Ok(total)
}
