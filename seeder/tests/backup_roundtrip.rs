//! Seed, reseed, and roll back against the on-disk store.

#![expect(
    clippy::expect_used,
    reason = "test code uses expect for clear failure messages"
)]

mod support;

#[path = "support/clock.rs"]
mod clock;

use std::sync::Arc;

use camino::Utf8PathBuf;
use fixture_data::{CountRange, ProfileCounts};
use seeder::backup::BackupManager;
use seeder::error::{ConfigurationError, SeedError};
use seeder::pipeline::{RunOptions, SeedPipeline};
use seeder::store::{DocumentStore, Filter, JsonDirDocumentStore};
use tempfile::TempDir;

use clock::MutableClock;
use support::{profile_with, quiet_pipeline, reference_time, scenario_counts};

struct Workspace {
    temp: TempDir,
    store: Arc<JsonDirDocumentStore>,
    clock: Arc<MutableClock>,
}

impl Workspace {
    fn new() -> Self {
        let temp = TempDir::new().expect("temp dir");
        let store = Arc::new(JsonDirDocumentStore::open(path(&temp, "store")).expect("store"));
        Self {
            temp,
            store,
            clock: Arc::new(MutableClock::new(reference_time())),
        }
    }

    fn backups(&self) -> BackupManager {
        BackupManager::open(
            self.store.clone(),
            path(&self.temp, "backups"),
            self.clock.clone(),
        )
        .expect("backup manager")
    }

    fn pipeline(&self, counts: ProfileCounts) -> SeedPipeline {
        quiet_pipeline(self.store.clone(), profile_with(counts))
            .with_backups(self.backups())
            .build()
            .expect("pipeline")
    }
}

fn path(temp: &TempDir, name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(temp.path().join(name)).expect("utf-8 path")
}

#[tokio::test]
async fn rollback_discards_the_second_seed() {
    let workspace = Workspace::new();
    let first = workspace
        .pipeline(scenario_counts())
        .run(&RunOptions::default())
        .await
        .expect("first run");
    let empty_backup = first.backup.expect("pre-run backup");
    assert_eq!(empty_backup.total_records, 0);
    let users_after_first = workspace
        .store
        .find("users", &Filter::all(), None)
        .await
        .expect("users");
    assert_eq!(users_after_first.len(), 5);

    workspace.clock.advance_minutes(5);
    let larger = ProfileCounts {
        users: CountRange::fixed(8),
        ..scenario_counts()
    };
    let second_pipeline = workspace.pipeline(larger);
    let second = second_pipeline
        .run(&RunOptions::default())
        .await
        .expect("second run");
    let backup = second.backup.expect("pre-run backup");
    assert!(backup.collections.iter().any(|name| name == "users"));
    assert_eq!(backup.document_counts.get("users"), Some(&5));
    assert_eq!(
        backup.total_records,
        backup.document_counts.values().sum::<u64>()
    );
    assert_eq!(
        workspace
            .store
            .count("users", &Filter::all())
            .await
            .expect("count"),
        8
    );

    let summary = second_pipeline.rollback(None).await.expect("rollback");

    assert_eq!(summary.backup_id, backup.id);
    assert_eq!(summary.restored, backup.total_records);
    let restored = workspace
        .store
        .find("users", &Filter::all(), None)
        .await
        .expect("users");
    assert_eq!(restored, users_after_first);
}

#[tokio::test]
async fn restored_documents_survive_reopening_the_store() {
    let workspace = Workspace::new();
    let pipeline = workspace.pipeline(scenario_counts());
    pipeline
        .run(&RunOptions::default())
        .await
        .expect("seed run");
    let backup = workspace
        .backups()
        .create_backup("after seeding")
        .await
        .expect("manual backup");
    workspace
        .store
        .clear_collection("tasks")
        .await
        .expect("clear tasks");

    pipeline
        .rollback(Some(&backup.id))
        .await
        .expect("rollback");

    let reopened = JsonDirDocumentStore::open(workspace.store.root().to_owned()).expect("reopen");
    assert_eq!(
        reopened.count("tasks", &Filter::all()).await.expect("count"),
        3
    );
}

#[tokio::test]
async fn backups_are_listed_newest_first() {
    let workspace = Workspace::new();
    let pipeline = workspace.pipeline(scenario_counts());
    for _ in 0..2 {
        pipeline
            .run(&RunOptions::default())
            .await
            .expect("seed run");
        workspace.clock.advance_minutes(1);
    }

    let listed = workspace.backups().list_backups().expect("list");

    assert_eq!(listed.len(), 2);
    let timestamps: Vec<_> = listed.iter().map(|backup| backup.timestamp).collect();
    assert!(timestamps.windows(2).all(|pair| pair.first() >= pair.last()));
    assert!(
        listed
            .iter()
            .all(|backup| workspace.backups().root().join(&backup.id).is_dir())
    );
}

#[tokio::test]
async fn rollback_requires_a_backup_directory() {
    let workspace = Workspace::new();
    let pipeline = quiet_pipeline(workspace.store.clone(), profile_with(scenario_counts()))
        .build()
        .expect("pipeline");

    let err = pipeline.rollback(None).await.expect_err("no backups");

    assert!(matches!(
        err,
        SeedError::Configuration(ConfigurationError::BackupsDisabled)
    ));
}
