//! Staged seeding of the task-board document store, with backup and
//! rollback.
//!
//! A [`pipeline::SeedPipeline`] runs an ordered list of
//! [`pipeline::Stage`]s against a [`store::DocumentStore`]. Each stage
//! generates one entity family from a deterministic
//! [`fixture_data::FixtureGenerator`], validates every record, and persists
//! the ones that pass. Stages read their dependencies from earlier stage
//! outputs, falling back to records already in the store.
//!
//! Before a destructive run the [`backup::BackupManager`] snapshots every
//! collection so a failed or unwanted seed can be rolled back.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use fixture_data::ProfileRegistry;
//! use seeder::pipeline::{RunOptions, SeedPipeline};
//! use seeder::progress::ProgressMode;
//! use seeder::store::MemoryDocumentStore;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let registry = ProfileRegistry::builtin().expect("built-in registry");
//! let profile = registry.find_profile("test").expect("test profile").clone();
//! let pipeline = SeedPipeline::builder(Arc::new(MemoryDocumentStore::default()), profile)
//!     .with_progress(ProgressMode::Hidden)
//!     .build()
//!     .expect("valid stage order");
//!
//! let run = pipeline
//!     .run(&RunOptions { skip_backup: true, ..RunOptions::default() })
//!     .await
//!     .expect("seed run");
//! assert!(run.results.total_records() > 0);
//! # });
//! ```

pub mod backup;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod stages;
pub mod store;
pub mod telemetry;
