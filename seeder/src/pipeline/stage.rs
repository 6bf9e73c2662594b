//! Stage abstraction and the per-stage execution context.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fixture_data::{CountRange, FixtureGenerator, Profile, ProfileCounts, ValidationReport};
use tracing::debug;
use uuid::Uuid;

use super::results::{Produced, SeedResults, SoftFailure, StageOutput, ValidationTally};
use crate::error::{ConfigurationError, SeedError};
use crate::models::{Entity, Model, to_document};
use crate::progress::StepProgress;
use crate::store::{DocumentStore, Filter};

/// Upper bound on records pulled from the store when an upstream step did
/// not run in the current pass.
pub const UPSTREAM_QUERY_LIMIT: usize = 50;

/// Identifies a pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StepName {
    /// Accounts with their preferences, sessions, and roles.
    Users,
    /// Workspaces and their spaces.
    Workspaces,
    /// Boards inside spaces.
    Boards,
    /// Catalogue board templates.
    BoardTemplates,
    /// Tags at every scope.
    Tags,
    /// Columns and tasks.
    Tasks,
    /// Task comments.
    Comments,
    /// Per-user notifications.
    Notifications,
    /// Per-user reminders.
    Reminders,
    /// File attachments.
    Files,
    /// Workspace invitations.
    Invitations,
    /// Derived analytics aggregates.
    Analytics,
}

impl StepName {
    /// Every step in canonical execution order.
    pub const ALL: [Self; 12] = [
        Self::Users,
        Self::Workspaces,
        Self::Boards,
        Self::BoardTemplates,
        Self::Tags,
        Self::Tasks,
        Self::Comments,
        Self::Notifications,
        Self::Reminders,
        Self::Files,
        Self::Invitations,
        Self::Analytics,
    ];

    /// Stable kebab-case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Workspaces => "workspaces",
            Self::Boards => "boards",
            Self::BoardTemplates => "board-templates",
            Self::Tags => "tags",
            Self::Tasks => "tasks",
            Self::Comments => "comments",
            Self::Notifications => "notifications",
            Self::Reminders => "reminders",
            Self::Files => "files",
            Self::Invitations => "invitations",
            Self::Analytics => "analytics",
        }
    }

    /// The profile count that decides whether the step has work to do.
    #[must_use]
    pub const fn count_range(self, counts: &ProfileCounts) -> CountRange {
        match self {
            Self::Users => counts.users,
            Self::Workspaces => counts.workspaces,
            Self::Boards => counts.boards_per_space,
            Self::BoardTemplates => counts.board_templates,
            Self::Tags => counts.tags,
            Self::Tasks => counts.tasks_per_board,
            Self::Comments => counts.comments_per_task,
            Self::Notifications => counts.notifications_per_user,
            Self::Reminders => counts.reminders_per_user,
            Self::Files => counts.files,
            Self::Invitations => counts.invitations_per_workspace,
            Self::Analytics => counts.analytics,
        }
    }

    /// Case-insensitive substring match against a module filter entry.
    ///
    /// # Example
    ///
    /// ```
    /// use seeder::pipeline::StepName;
    ///
    /// assert!(StepName::BoardTemplates.matches("Template"));
    /// assert!(StepName::Boards.matches("board"));
    /// assert!(!StepName::Tasks.matches("tags"));
    /// ```
    #[must_use]
    pub fn matches(self, filter: &str) -> bool {
        self.as_str()
            .contains(filter.trim().to_ascii_lowercase().as_str())
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepName {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|step| step.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("unknown step '{value}'"))
    }
}

/// How a stage reacts to a record that fails validation or persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop the run; the failure names the step.
    Abort,
    /// Drop invalid records and keep going; persistence failures still abort.
    SkipRecord,
    /// Log any per-record failure, validation or persistence, and keep going.
    CatchAndContinue,
}

/// One step of the seed pipeline.
#[async_trait]
pub trait Stage: Send + Sync {
    /// The step this stage implements.
    fn name(&self) -> StepName;

    /// Steps whose output this stage reads.
    fn reads(&self) -> &'static [StepName];

    /// Default per-record failure policy.
    fn policy(&self) -> FailurePolicy;

    /// Generates, validates, and persists the stage's records.
    async fn seed(&self, ctx: &mut StageContext<'_>) -> Result<StageOutput, SeedError>;
}

/// Everything a stage may touch while it runs.
pub struct StageContext<'a> {
    step: StepName,
    reads: &'static [StepName],
    profile: &'a Profile,
    generator: &'a mut FixtureGenerator,
    store: &'a dyn DocumentStore,
    results: &'a SeedResults,
    progress: &'a StepProgress,
    skip_validation: bool,
    soft_failures: Vec<SoftFailure>,
    tally: ValidationTally,
}

/// Borrowed inputs for a [`StageContext`].
pub struct StageInputs<'a> {
    /// Active profile.
    pub profile: &'a Profile,
    /// Run-wide generator.
    pub generator: &'a mut FixtureGenerator,
    /// Target store.
    pub store: &'a dyn DocumentStore,
    /// Results of the steps that already ran.
    pub results: &'a SeedResults,
    /// This step's progress handle.
    pub progress: &'a StepProgress,
    /// Persist records without validating them.
    pub skip_validation: bool,
}

impl<'a> StageContext<'a> {
    /// Builds the context for `stage`.
    #[must_use]
    pub fn new(stage: &dyn Stage, inputs: StageInputs<'a>) -> Self {
        Self {
            step: stage.name(),
            reads: stage.reads(),
            profile: inputs.profile,
            generator: inputs.generator,
            store: inputs.store,
            results: inputs.results,
            progress: inputs.progress,
            skip_validation: inputs.skip_validation,
            soft_failures: Vec::new(),
            tally: ValidationTally::default(),
        }
    }

    /// The running step.
    #[must_use]
    pub const fn step(&self) -> StepName {
        self.step
    }

    /// Profile counts.
    #[must_use]
    pub const fn counts(&self) -> &ProfileCounts {
        self.profile.counts()
    }

    /// Active profile.
    #[must_use]
    pub const fn profile(&self) -> &Profile {
        self.profile
    }

    /// The run-wide generator.
    pub const fn generator(&mut self) -> &mut FixtureGenerator {
        &mut *self.generator
    }

    /// Instant every generated timestamp is relative to.
    #[must_use]
    pub const fn reference_time(&self) -> DateTime<Utc> {
        self.profile.reference_time()
    }

    /// The target store.
    #[must_use]
    pub const fn store(&self) -> &'a dyn DocumentStore {
        self.store
    }

    /// This step's progress handle.
    #[must_use]
    pub const fn progress(&self) -> &'a StepProgress {
        self.progress
    }

    /// Records `T` produced upstream.
    ///
    /// Uses the in-run results when the producing step ran in this pass and
    /// otherwise falls back to at most [`UPSTREAM_QUERY_LIMIT`] records from
    /// the store.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UndeclaredRead`] when the step did not
    /// declare the producer in [`Stage::reads`], or [`SeedError::Query`]
    /// when the store query fails.
    pub async fn upstream<T: Produced>(&self) -> Result<Vec<T>, SeedError> {
        self.upstream_matching(&Filter::all()).await
    }

    /// Like [`Self::upstream`], restricted to records matching `filter`.
    ///
    /// # Errors
    ///
    /// See [`Self::upstream`].
    pub async fn upstream_matching<T: Produced>(
        &self,
        filter: &Filter,
    ) -> Result<Vec<T>, SeedError> {
        if T::PRODUCER != self.step && !self.reads.contains(&T::PRODUCER) {
            return Err(ConfigurationError::UndeclaredRead {
                stage: self.step,
                dependency: T::PRODUCER,
            }
            .into());
        }
        if self.results.has_run(T::PRODUCER) {
            let mut matching = Vec::new();
            for record in T::collected(self.results) {
                let document = to_document(record).map_err(|source| SeedError::Query {
                    collection: T::COLLECTION,
                    source,
                })?;
                if filter.matches(&document) {
                    matching.push(record.clone());
                }
            }
            return Ok(matching);
        }
        debug!(
            step = %self.step,
            collection = T::COLLECTION,
            "upstream step did not run; querying the store"
        );
        Model::<T>::new(self.store)
            .find(filter, Some(UPSTREAM_QUERY_LIMIT))
            .await
            .map_err(|source| SeedError::Query {
                collection: T::COLLECTION,
                source,
            })
    }

    /// The stored `T` matching `filter`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`SeedError::Query`] when the store cannot be read.
    pub async fn existing<T: Entity>(&self, filter: &Filter) -> Result<Option<T>, SeedError> {
        Model::<T>::new(self.store)
            .find(filter, Some(1))
            .await
            .map(|found| found.into_iter().next())
            .map_err(|source| SeedError::Query {
                collection: T::COLLECTION,
                source,
            })
    }

    /// Records that the record keyed by `key` is already stored and was not
    /// written again.
    pub fn already_present(&mut self, entity: &'static str, key: &str) {
        self.progress
            .log(&format!("{entity} {key} already present; keeping it"));
        self.soft_failures.push(SoftFailure::AlreadyPresent {
            entity,
            key: key.to_owned(),
        });
    }

    /// Records that a required upstream step produced nothing.
    pub fn dependency_missing(&mut self, dependency: StepName) {
        self.progress
            .warn(&format!("no {dependency} records available; skipping"));
        self.soft_failures
            .push(SoftFailure::DependencyMissing { dependency });
    }

    /// Applies the validation gate to one record.
    ///
    /// Returns `true` when the record may be persisted. Under
    /// [`FailurePolicy::Abort`] an invalid record fails the stage.
    ///
    /// # Errors
    ///
    /// Returns [`SeedError::Validation`] for invalid records under the abort
    /// policy.
    pub fn admit<T, F>(
        &mut self,
        record: &T,
        validate: F,
        policy: FailurePolicy,
    ) -> Result<bool, SeedError>
    where
        T: Produced,
        F: FnOnce() -> ValidationReport,
    {
        if self.skip_validation {
            return Ok(true);
        }
        let report = validate();
        self.tally.record(&report);
        for warning in report.warnings() {
            debug!(step = %self.step, record = %record.id(), "validation warning: {warning}");
        }
        if report.is_valid() {
            return Ok(true);
        }
        let summary = report.summary();
        if policy == FailurePolicy::Abort {
            return Err(SeedError::Validation {
                entity: T::COLLECTION,
                record: record.id(),
                summary,
            });
        }
        self.progress.warn(&format!(
            "skipping invalid {} {}: {summary}",
            T::COLLECTION,
            record.id()
        ));
        self.soft_failures.push(SoftFailure::Validation {
            entity: T::COLLECTION,
            record: record.id(),
            summary,
        });
        Ok(false)
    }

    /// Writes an admitted record.
    ///
    /// Returns `false` when the write failed and `policy` allowed continuing.
    ///
    /// # Errors
    ///
    /// Returns [`SeedError::Persistence`] unless `policy` is
    /// [`FailurePolicy::CatchAndContinue`].
    pub async fn store_record<T: Produced>(
        &mut self,
        record: &T,
        policy: FailurePolicy,
    ) -> Result<bool, SeedError> {
        match Model::<T>::new(self.store).create(record).await {
            Ok(()) => {
                self.progress.inc(1);
                Ok(true)
            }
            Err(source) if policy == FailurePolicy::CatchAndContinue => {
                self.progress.error(&format!(
                    "failed to persist {} {}: {source}",
                    T::COLLECTION,
                    record.id()
                ));
                self.soft_failures.push(SoftFailure::Persistence {
                    entity: T::COLLECTION,
                    record: record.id(),
                    message: source.to_string(),
                });
                Ok(false)
            }
            Err(source) => Err(SeedError::Persistence {
                collection: T::COLLECTION,
                source,
            }),
        }
    }

    /// Validates then writes one record; see [`Self::admit`] and
    /// [`Self::store_record`].
    ///
    /// # Errors
    ///
    /// Propagates the gate and write failures allowed by `policy`.
    pub async fn persist<T, F>(
        &mut self,
        record: &T,
        validate: F,
        policy: FailurePolicy,
    ) -> Result<bool, SeedError>
    where
        T: Produced,
        F: FnOnce() -> ValidationReport + Send,
    {
        if !self.admit(record, validate, policy)? {
            return Ok(false);
        }
        self.store_record(record, policy).await
    }

    /// Records a soft failure raised outside the helpers above.
    pub fn soft_failure(&mut self, failure: SoftFailure) {
        self.soft_failures.push(failure);
    }

    /// Consumes the context, returning the collected soft failures and the
    /// validation tally.
    #[must_use]
    pub fn finish(self) -> (Vec<SoftFailure>, ValidationTally) {
        (self.soft_failures, self.tally)
    }
}

/// Identifiers of `ids` excluding `exclude`, deduplicated, in order.
#[must_use]
pub fn distinct_excluding(
    ids: impl IntoIterator<Item = Uuid>,
    exclude: &HashSet<Uuid>,
) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| !exclude.contains(id) && seen.insert(*id))
        .collect()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("users", StepName::Users)]
    #[case("Board-Templates", StepName::BoardTemplates)]
    #[case(" analytics ", StepName::Analytics)]
    fn step_names_parse_case_insensitively(#[case] raw: &str, #[case] expected: StepName) {
        assert_eq!(raw.parse::<StepName>().expect("known step"), expected);
    }

    #[test]
    fn unknown_step_names_are_rejected() {
        assert!("widgets".parse::<StepName>().is_err());
    }

    #[rstest]
    #[case("board", &[StepName::Boards, StepName::BoardTemplates])]
    #[case("TASK", &[StepName::Tasks])]
    #[case("s", &StepName::ALL)]
    fn module_filters_match_substrings(#[case] filter: &str, #[case] expected: &[StepName]) {
        let matched: Vec<StepName> = StepName::ALL
            .into_iter()
            .filter(|step| step.matches(filter))
            .collect();
        let wanted: Vec<StepName> = expected.to_vec();
        assert_eq!(matched, wanted);
    }

    #[test]
    fn canonical_order_is_sorted() {
        let mut sorted = StepName::ALL;
        sorted.sort();
        assert_eq!(sorted, StepName::ALL);
    }

    #[test]
    fn distinct_excluding_drops_repeats_and_exclusions() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        let c = Uuid::from_u128(3);
        let exclude = HashSet::from([b]);
        assert_eq!(distinct_excluding([a, b, a, c, b], &exclude), vec![a, c]);
    }
}
