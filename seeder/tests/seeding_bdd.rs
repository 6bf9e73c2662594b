//! Behavioural tests for seed runs, validation skips, and rollback.

#![expect(
    clippy::expect_used,
    reason = "test code uses expect for clear failure messages"
)]

mod support;

#[path = "support/clock.rs"]
mod clock;

use std::future::Future;
use std::sync::Arc;

use camino::Utf8PathBuf;
use fixture_data::{CountRange, Profile, ProfileCounts, ProfileRegistry};
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::{ScenarioState, given, scenario, then, when};
use seeder::backup::BackupManager;
use seeder::pipeline::{RunOptions, SeedPipeline, SeedRun, StepName, StepOutcome};
use seeder::stages::{BoardsStage, TagsStage, TasksStage, UsersStage, WorkspacesStage};
use seeder::store::{DocumentStore, Filter, MemoryDocumentStore};
use tempfile::TempDir;
use tokio::runtime::Builder;

use clock::MutableClock;
use support::{FIXED_EMAILS, profile_with, quiet_pipeline, reference_time, scenario_counts};

/// Test world holding the store, the active profile, and the last run.
#[derive(Default, ScenarioState)]
struct World {
    store: Slot<Arc<MemoryDocumentStore>>,
    backup_dir: Slot<Arc<TempDir>>,
    clock: Slot<Arc<MutableClock>>,
    counts: Slot<ProfileCounts>,
    profile: Slot<Profile>,
    palette: Slot<Vec<String>>,
    run: Slot<SeedRun>,
}

impl World {
    fn store(&self) -> Arc<MemoryDocumentStore> {
        self.store.get().expect("store should be created")
    }

    fn counts(&self) -> ProfileCounts {
        self.counts.get().expect("counts should be set")
    }

    fn last_run(&self) -> SeedRun {
        self.run.get().expect("pipeline should have run")
    }

    fn backups(&self) -> Option<BackupManager> {
        let temp = self.backup_dir.get()?;
        let clock = self.clock.get().expect("clock should be set");
        let root = Utf8PathBuf::from_path_buf(temp.path().join("backups")).expect("utf-8 path");
        Some(BackupManager::open(self.store(), root, clock).expect("backup manager"))
    }

    fn pipeline(&self) -> SeedPipeline {
        let profile = self
            .profile
            .get()
            .unwrap_or_else(|| profile_with(self.counts()));
        let mut builder = quiet_pipeline(self.store(), profile);
        if let Some(palette) = self.palette.get() {
            builder = builder.with_stages(vec![
                Box::new(UsersStage),
                Box::new(WorkspacesStage),
                Box::new(BoardsStage),
                Box::new(TagsStage::with_palette(palette)),
                Box::new(TasksStage),
            ]);
        }
        if let Some(backups) = self.backups() {
            builder = builder.with_backups(backups);
        }
        builder.build().expect("pipeline")
    }

    fn stored(&self, collection: &str) -> u64 {
        block_on(self.store().count(collection, &Filter::all())).expect("count")
    }
}

fn block_on<F: Future>(future: F) -> F::Output {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
        .block_on(future)
}

#[fixture]
fn world() -> World {
    World::default()
}

// ============================================================================
// Given steps
// ============================================================================

#[given("an empty store")]
fn an_empty_store(world: &World) {
    world.store.set(Arc::new(MemoryDocumentStore::default()));
}

#[given("an empty store with backups")]
fn an_empty_store_with_backups(world: &World) {
    an_empty_store(world);
    world
        .backup_dir
        .set(Arc::new(TempDir::new().expect("temp dir")));
    world
        .clock
        .set(Arc::new(MutableClock::new(reference_time())));
}

#[given("a profile with {users:usize} users, {boards:usize} boards per space, and {tasks:usize} tasks per board")]
fn a_profile_with(world: &World, users: usize, boards: usize, tasks: usize) {
    world.counts.set(ProfileCounts {
        users: CountRange::fixed(users),
        boards_per_space: CountRange::fixed(boards),
        tasks_per_board: CountRange::fixed(tasks),
        ..scenario_counts()
    });
}

#[given("{count:usize} tags drawn from a palette with one malformed colour")]
fn tags_from_a_malformed_palette(world: &World, count: usize) {
    world.counts.set(ProfileCounts {
        tags: CountRange::fixed(count),
        ..world.counts()
    });
    world
        .palette
        .set(vec!["#ff5733".to_owned(), "not-a-color".to_owned()]);
}

#[given("the built-in production profile")]
fn the_built_in_production_profile(world: &World) {
    let registry = ProfileRegistry::builtin().expect("builtin registry parses");
    let profile = registry
        .find_profile("production")
        .expect("production profile");
    world.profile.set(profile.clone());
}

// ============================================================================
// When steps
// ============================================================================

#[when("the pipeline runs")]
fn the_pipeline_runs(world: &World) {
    let pipeline = world.pipeline();
    let run = block_on(pipeline.run(&RunOptions::default())).expect("seed run");
    world.run.set(run);
}

#[when("the pipeline runs again with {users:usize} users")]
fn the_pipeline_runs_again(world: &World, users: usize) {
    world.counts.set(ProfileCounts {
        users: CountRange::fixed(users),
        ..world.counts()
    });
    if let Some(clock) = world.clock.get() {
        clock.advance_minutes(1);
    }
    the_pipeline_runs(world);
}

#[when("the latest backup is restored")]
fn the_latest_backup_is_restored(world: &World) {
    let pipeline = world.pipeline();
    block_on(pipeline.rollback(None)).expect("rollback");
}

// ============================================================================
// Then steps
// ============================================================================

#[then("the store holds {count:u64} {collection}")]
fn the_store_holds(world: &World, count: u64, collection: String) {
    assert_eq!(world.stored(&collection), count, "{collection}");
}

#[then("both fixed accounts exist")]
fn both_fixed_accounts_exist(world: &World) {
    let store = world.store();
    for email in FIXED_EMAILS {
        let found = block_on(store.count("users", &Filter::eq("email", email))).expect("count");
        assert_eq!(found, 1, "missing fixed account {email}");
    }
}

#[then("the tasks step is skipped")]
fn the_tasks_step_is_skipped(world: &World) {
    let run = world.last_run();
    let report = run.report(StepName::Tasks).expect("tasks report");
    assert_eq!(report.outcome, StepOutcome::Skipped);
}

#[then("the tags step skipped {count:usize} records")]
fn the_tags_step_skipped(world: &World, count: usize) {
    let run = world.last_run();
    let report = run.report(StepName::Tags).expect("tags report");
    assert_eq!(report.skipped(), count);
}

#[then("no steps were reported")]
fn no_steps_were_reported(world: &World) {
    assert!(world.last_run().reports.is_empty());
}

#[then("no backup was taken")]
fn no_backup_was_taken(world: &World) {
    assert!(world.last_run().backup.is_none());
    let backups = world.backups().expect("backups configured");
    assert!(backups.list_backups().expect("list").is_empty());
}

// ============================================================================
// Scenario bindings
// ============================================================================

#[scenario(
    path = "tests/features/seeding.feature",
    name = "A small profile builds one connected board"
)]
fn a_small_profile_builds_one_connected_board(world: World) {
    let _ = world;
}

#[scenario(
    path = "tests/features/seeding.feature",
    name = "Tasks are skipped when no boards exist"
)]
fn tasks_are_skipped_when_no_boards_exist(world: World) {
    let _ = world;
}

#[scenario(
    path = "tests/features/seeding.feature",
    name = "Tags with malformed colours are skipped"
)]
fn tags_with_malformed_colours_are_skipped(world: World) {
    let _ = world;
}

#[scenario(
    path = "tests/features/seeding.feature",
    name = "The production profile seeds nothing"
)]
fn the_production_profile_seeds_nothing(world: World) {
    let _ = world;
}

#[scenario(
    path = "tests/features/seeding.feature",
    name = "Rollback restores the store as it was before the last run"
)]
fn rollback_restores_the_previous_store(world: World) {
    let _ = world;
}
