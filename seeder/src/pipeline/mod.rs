//! Ordered, dependency-aware seed pipeline.
//!
//! A [`SeedPipeline`] owns the registered stages, the target store, and the
//! active profile. A run optionally backs up the store, clears it for full
//! runs, then executes each planned stage in registration order, threading
//! an immutable [`SeedResults`] value from one stage to the next. Per-record
//! problems become soft failures in the step reports; anything else aborts
//! the run with [`SeedError::StageFailed`] naming the step.

mod results;
mod stage;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use fixture_data::{FixtureGenerator, Profile};
use tracing::{error, info, warn};

pub use results::{
    Produced, SeedResults, SoftFailure, StageOutput, StepOutcome, StepReport, ValidationLog,
    ValidationTally,
};
pub use stage::{
    FailurePolicy, Stage, StageContext, StageInputs, StepName, UPSTREAM_QUERY_LIMIT,
    distinct_excluding,
};

use crate::backup::{BackupManager, BackupMetadata, RestoreSummary};
use crate::error::{ConfigurationError, SeedError};
use crate::progress::{PipelineProgress, ProgressMode};
use crate::stages::default_stages;
use crate::store::DocumentStore;

/// Flags for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Do not snapshot the store before writing.
    pub skip_backup: bool,
    /// Persist records without validating them.
    pub skip_validation: bool,
    /// Case-insensitive substrings selecting steps; empty runs every step
    /// and clears the store first.
    pub modules: Vec<String>,
}

impl RunOptions {
    /// Whether this is a full run rather than a module subset.
    #[must_use]
    pub fn is_full_run(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Default)]
pub struct SeedRun {
    /// Everything persisted, by record type.
    pub results: SeedResults,
    /// One report per executed step.
    pub reports: Vec<StepReport>,
    /// Validation counters per step.
    pub validation: ValidationLog,
    /// Backup taken before writing, if any.
    pub backup: Option<BackupMetadata>,
    /// Documents removed by the pre-run clear.
    pub cleared: u64,
}

impl SeedRun {
    /// Total soft failures across every step.
    #[must_use]
    pub fn soft_failure_count(&self) -> usize {
        self.reports.iter().map(StepReport::skipped).sum()
    }

    /// Report for `step`, if it ran.
    #[must_use]
    pub fn report(&self, step: StepName) -> Option<&StepReport> {
        self.reports.iter().find(|report| report.step == step)
    }
}

impl fmt::Display for SeedRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(backup) = &self.backup {
            writeln!(f, "backup: {}", backup.id)?;
        }
        for report in &self.reports {
            writeln!(
                f,
                "{:<16} {:>6} records  {:>3} skipped  {:>6} ms",
                report.step.as_str(),
                report.processed,
                report.skipped(),
                report.elapsed.as_millis()
            )?;
        }
        for (collection, count) in self.results.collection_counts() {
            if count > 0 {
                writeln!(f, "  {collection:<16} {count:>6}")?;
            }
        }
        let tally = self.validation.total();
        write!(
            f,
            "total: {} records, {} validated, {} rejected, {} warnings",
            self.results.total_records(),
            tally.checked,
            tally.rejected,
            tally.warnings
        )
    }
}

/// Assembles a [`SeedPipeline`].
pub struct SeedPipelineBuilder {
    store: Arc<dyn DocumentStore>,
    profile: Profile,
    stages: Option<Vec<Box<dyn Stage>>>,
    backups: Option<BackupManager>,
    progress: ProgressMode,
}

impl SeedPipelineBuilder {
    /// Replaces the default stage list.
    #[must_use]
    pub fn with_stages(mut self, stages: Vec<Box<dyn Stage>>) -> Self {
        self.stages = Some(stages);
        self
    }

    /// Enables pre-run backups and rollback.
    #[must_use]
    pub fn with_backups(mut self, backups: BackupManager) -> Self {
        self.backups = Some(backups);
        self
    }

    /// Chooses whether progress bars are drawn.
    #[must_use]
    pub const fn with_progress(mut self, progress: ProgressMode) -> Self {
        self.progress = progress;
        self
    }

    /// Validates the stage order and builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::DuplicateStage`] when a step is
    /// registered twice and [`ConfigurationError::StageOrder`] when a stage
    /// reads from a stage registered after it.
    pub fn build(self) -> Result<SeedPipeline, ConfigurationError> {
        let stages = self.stages.unwrap_or_else(default_stages);
        check_stage_order(&stages)?;
        Ok(SeedPipeline {
            store: self.store,
            profile: self.profile,
            stages,
            backups: self.backups,
            progress: self.progress,
        })
    }
}

fn check_stage_order(stages: &[Box<dyn Stage>]) -> Result<(), ConfigurationError> {
    let registered: Vec<StepName> = stages.iter().map(|stage| stage.name()).collect();
    let mut seen = HashSet::new();
    for (position, stage) in stages.iter().enumerate() {
        let name = stage.name();
        if !seen.insert(name) {
            return Err(ConfigurationError::DuplicateStage { stage: name });
        }
        let later = registered.get(position.saturating_add(1)..).unwrap_or_default();
        if let Some(dependency) = stage
            .reads()
            .iter()
            .copied()
            .find(|dependency| *dependency == name || later.contains(dependency))
        {
            return Err(ConfigurationError::StageOrder {
                stage: name,
                dependency,
            });
        }
    }
    Ok(())
}

/// The seed pipeline.
pub struct SeedPipeline {
    store: Arc<dyn DocumentStore>,
    profile: Profile,
    stages: Vec<Box<dyn Stage>>,
    backups: Option<BackupManager>,
    progress: ProgressMode,
}

impl SeedPipeline {
    /// Starts building a pipeline over `store` for `profile`.
    #[must_use]
    pub fn builder(store: Arc<dyn DocumentStore>, profile: Profile) -> SeedPipelineBuilder {
        SeedPipelineBuilder {
            store,
            profile,
            stages: None,
            backups: None,
            progress: ProgressMode::default(),
        }
    }

    /// Active profile.
    #[must_use]
    pub const fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Registered steps in execution order.
    #[must_use]
    pub fn registered_steps(&self) -> Vec<StepName> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Steps a run with `modules` would execute, in order.
    ///
    /// A step is planned when its profile count is non-zero and, if any
    /// modules are given, its name contains one of them.
    #[must_use]
    pub fn plan(&self, modules: &[String]) -> Vec<StepName> {
        let counts = self.profile.counts();
        self.stages
            .iter()
            .map(|stage| stage.name())
            .filter(|step| !step.count_range(counts).is_zero())
            .filter(|step| modules.is_empty() || modules.iter().any(|m| step.matches(m)))
            .collect()
    }

    /// Runs the planned steps.
    ///
    /// # Errors
    ///
    /// Returns [`SeedError::Backup`] when the pre-run backup fails,
    /// [`SeedError::Persistence`] when clearing fails, and
    /// [`SeedError::StageFailed`] when a stage aborts.
    pub async fn run(&self, options: &RunOptions) -> Result<SeedRun, SeedError> {
        let steps = self.plan(&options.modules);
        if steps.is_empty() {
            info!(
                profile = self.profile.name(),
                "profile plans no steps; nothing to seed"
            );
            return Ok(SeedRun::default());
        }

        let backup = self.backup_before_run(options).await?;
        let cleared = if options.is_full_run() {
            self.clear_store().await?
        } else {
            0
        };

        let mut generator = FixtureGenerator::for_profile(&self.profile);
        let progress = PipelineProgress::new(steps.len(), self.progress);
        let mut results = SeedResults::default();
        let mut reports = Vec::with_capacity(steps.len());
        let mut validation = ValidationLog::default();

        for step in steps {
            let Some(stage) = self.stages.iter().find(|stage| stage.name() == step) else {
                continue;
            };
            let expected = step.count_range(self.profile.counts()).max();
            let step_progress =
                progress.start_step(step, u64::try_from(expected).unwrap_or(u64::MAX));
            let mut ctx = StageContext::new(
                stage.as_ref(),
                StageInputs {
                    profile: &self.profile,
                    generator: &mut generator,
                    store: self.store.as_ref(),
                    results: &results,
                    progress: &step_progress,
                    skip_validation: options.skip_validation,
                },
            );
            let outcome = stage.seed(&mut ctx).await;
            let (soft_failures, tally) = ctx.finish();
            validation.insert(step, tally);

            let output = match outcome {
                Ok(output) => output,
                Err(source) => {
                    step_progress.fail(&source.to_string());
                    error!(step = %step, error = %source, "seed step failed");
                    return Err(SeedError::StageFailed {
                        step,
                        source: Box::new(source),
                    });
                }
            };

            let step_outcome = if soft_failures
                .iter()
                .any(|failure| matches!(failure, SoftFailure::DependencyMissing { .. }))
            {
                StepOutcome::Skipped
            } else {
                StepOutcome::Completed
            };
            let processed = step_progress.processed();
            let expected_total = step_progress.expected();
            step_progress.finish();
            step_progress.success(&format!(
                "{} records, {} skipped",
                output.primary_len(),
                soft_failures.len()
            ));
            progress.step_done();
            reports.push(StepReport {
                step,
                processed,
                expected: expected_total,
                soft_failures,
                elapsed: step_progress.elapsed(),
                outcome: step_outcome,
            });
            results = results.with(step, output);
        }

        progress.finish();
        progress.log(&format!(
            "seeded {} records across {} steps",
            results.total_records(),
            reports.len()
        ));
        Ok(SeedRun {
            results,
            reports,
            validation,
            backup,
            cleared,
        })
    }

    /// Restores the backup named `backup_id`, or the newest one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::BackupsDisabled`] without a backup
    /// manager and [`SeedError::Backup`] when the restore fails.
    pub async fn rollback(&self, backup_id: Option<&str>) -> Result<RestoreSummary, SeedError> {
        let backups = self
            .backups
            .as_ref()
            .ok_or(ConfigurationError::BackupsDisabled)?;
        let summary = match backup_id {
            Some(id) => backups.restore_backup(id).await?,
            None => backups.restore_latest().await?,
        };
        Ok(summary)
    }

    async fn backup_before_run(
        &self,
        options: &RunOptions,
    ) -> Result<Option<BackupMetadata>, SeedError> {
        if options.skip_backup {
            return Ok(None);
        }
        let Some(backups) = &self.backups else {
            warn!("no backup directory configured; seeding without a backup");
            return Ok(None);
        };
        let description = format!("pre-seed backup for profile '{}'", self.profile.name());
        let metadata = backups.create_backup(&description).await?;
        info!(backup = %metadata.id, records = metadata.total_records, "backup created");
        Ok(Some(metadata))
    }

    async fn clear_store(&self) -> Result<u64, SeedError> {
        let collections = self
            .store
            .list_collections()
            .await
            .map_err(|source| SeedError::Query {
                collection: "*",
                source,
            })?;
        let mut removed: u64 = 0;
        for collection in collections {
            let count = self
                .store
                .clear_collection(&collection)
                .await
                .map_err(|source| SeedError::Persistence {
                    collection: "*",
                    source,
                })?;
            removed = removed.saturating_add(count);
        }
        info!(documents = removed, "cleared store before full run");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use fixture_data::{CountRange, ProfileCounts};

    use super::*;
    use crate::store::MemoryDocumentStore;

    struct Probe {
        name: StepName,
        reads: &'static [StepName],
    }

    #[async_trait]
    impl Stage for Probe {
        fn name(&self) -> StepName {
            self.name
        }

        fn reads(&self) -> &'static [StepName] {
            self.reads
        }

        fn policy(&self) -> FailurePolicy {
            FailurePolicy::SkipRecord
        }

        async fn seed(&self, _ctx: &mut StageContext<'_>) -> Result<StageOutput, SeedError> {
            Ok(StageOutput::empty(self.name))
        }
    }

    fn probe(name: StepName, reads: &'static [StepName]) -> Box<dyn Stage> {
        Box::new(Probe { name, reads })
    }

    fn builder() -> SeedPipelineBuilder {
        let reference = Utc
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .expect("timestamp");
        let profile = Profile::new("unit", 7, reference).with_counts(ProfileCounts {
            users: CountRange::fixed(2),
            workspaces: CountRange::fixed(1),
            tags: CountRange::fixed(1),
            ..ProfileCounts::default()
        });
        SeedPipeline::builder(Arc::new(MemoryDocumentStore::default()), profile)
            .with_progress(ProgressMode::Hidden)
    }

    #[test]
    fn default_stage_order_is_topological() {
        let pipeline = builder().build().expect("default stages");
        assert_eq!(pipeline.registered_steps(), StepName::ALL.to_vec());
    }

    #[test]
    fn reading_a_later_stage_is_rejected() {
        let err = builder()
            .with_stages(vec![
                probe(StepName::Workspaces, &[StepName::Users]),
                probe(StepName::Users, &[]),
            ])
            .build()
            .err()
            .expect("order violation");
        assert_eq!(
            err,
            ConfigurationError::StageOrder {
                stage: StepName::Workspaces,
                dependency: StepName::Users,
            }
        );
    }

    #[test]
    fn unregistered_dependencies_are_allowed() {
        builder()
            .with_stages(vec![probe(
                StepName::Tags,
                &[StepName::Users, StepName::Boards],
            )])
            .build()
            .expect("missing producers fall back to the store");
    }

    #[test]
    fn duplicate_stages_are_rejected() {
        let err = builder()
            .with_stages(vec![probe(StepName::Users, &[]), probe(StepName::Users, &[])])
            .build()
            .err()
            .expect("duplicate");
        assert_eq!(
            err,
            ConfigurationError::DuplicateStage {
                stage: StepName::Users
            }
        );
    }

    #[test]
    fn plan_skips_zero_count_steps() {
        let pipeline = builder().build().expect("pipeline");
        assert_eq!(
            pipeline.plan(&[]),
            vec![StepName::Users, StepName::Workspaces, StepName::Tags]
        );
    }

    #[test]
    fn plan_applies_module_filters() {
        let pipeline = builder().build().expect("pipeline");
        let modules = vec!["USER".to_owned(), "tag".to_owned()];
        assert_eq!(pipeline.plan(&modules), vec![StepName::Users, StepName::Tags]);
    }

    #[tokio::test]
    async fn rollback_requires_a_backup_manager() {
        let pipeline = builder().build().expect("pipeline");
        let err = pipeline.rollback(None).await.expect_err("no backups");
        assert!(matches!(
            err,
            SeedError::Configuration(ConfigurationError::BackupsDisabled)
        ));
    }
}
