//! Error types for configuring and running a seed.

use camino::Utf8PathBuf;
use fixture_data::{GenerationError, ProfileError};
use thiserror::Error;

use crate::backup::BackupError;
use crate::pipeline::StepName;
use crate::store::StoreError;

/// The seeder was configured inconsistently; nothing was written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// `SEEDER_ENVIRONMENT` names no known environment.
    #[error("unknown environment '{value}': expected development, test, or production")]
    UnknownEnvironment {
        /// The rejected value.
        value: String,
    },
    /// The profile registry could not be loaded or lacks the environment.
    #[error(transparent)]
    Profile(#[from] ProfileError),
    /// Layered settings failed to load.
    #[error("failed to load seeder settings: {message}")]
    Settings {
        /// Loader detail.
        message: String,
    },
    /// A stage reads from a stage registered after it.
    #[error("stage '{stage}' reads from '{dependency}', which is registered after it")]
    StageOrder {
        /// The reading stage.
        stage: StepName,
        /// The dependency that would run too late.
        dependency: StepName,
    },
    /// Two stages share a step name.
    #[error("stage '{stage}' is registered more than once")]
    DuplicateStage {
        /// The repeated step.
        stage: StepName,
    },
    /// A stage queried upstream records it never declared.
    #[error("stage '{stage}' read '{dependency}' without declaring it")]
    UndeclaredRead {
        /// The reading stage.
        stage: StepName,
        /// The undeclared dependency.
        dependency: StepName,
    },
    /// A backup operation was requested without a backup directory.
    #[error("no backup directory is configured")]
    BackupsDisabled,
    /// A configured directory could not be opened.
    #[error("failed to open {path}: {message}")]
    Io {
        /// Offending path.
        path: Utf8PathBuf,
        /// I/O detail.
        message: String,
    },
}

/// Fatal failure of a seed run.
///
/// Soft, per-record problems never surface here; they are collected in the
/// step reports instead.
#[derive(Debug, Error)]
pub enum SeedError {
    /// Configuration was rejected before any writes.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// The generator could not produce a value.
    #[error(transparent)]
    Generation(#[from] GenerationError),
    /// A record failed validation under the abort policy.
    #[error("{entity} {record} failed validation: {summary}")]
    Validation {
        /// Collection of the rejected record.
        entity: &'static str,
        /// Identifier of the rejected record.
        record: uuid::Uuid,
        /// Joined error messages.
        summary: String,
    },
    /// Writing to the store failed.
    #[error("failed to persist {collection}: {source}")]
    Persistence {
        /// Target collection.
        collection: &'static str,
        /// Store failure.
        #[source]
        source: StoreError,
    },
    /// Reading upstream records from the store failed.
    #[error("failed to query {collection}: {source}")]
    Query {
        /// Queried collection.
        collection: &'static str,
        /// Store failure.
        #[source]
        source: StoreError,
    },
    /// Creating or restoring a backup failed.
    #[error(transparent)]
    Backup(#[from] BackupError),
    /// A stage aborted the run.
    #[error("step '{step}' failed: {source}")]
    StageFailed {
        /// The failing step.
        step: StepName,
        /// What went wrong inside it.
        #[source]
        source: Box<SeedError>,
    },
}

impl SeedError {
    /// The step that aborted the run, if any.
    #[must_use]
    pub const fn failed_step(&self) -> Option<StepName> {
        match self {
            Self::StageFailed { step, .. } => Some(*step),
            _ => None,
        }
    }
}
