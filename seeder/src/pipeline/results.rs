//! Values produced by stages and accumulated across a run.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

use fixture_data::{
    AnalyticsRecord, BoardRecord, BoardTemplateRecord, ColumnRecord, CommentRecord, FileRecord,
    InvitationRecord, NotificationRecord, ReminderRecord, SpaceRecord, TagRecord, TaskRecord,
    UserPreferencesRecord, UserRecord, UserRolesRecord, UserSessionsRecord, ValidationReport,
    WorkspaceRecord,
};
use uuid::Uuid;

use super::stage::StepName;
use crate::models::Entity;

/// A per-record problem that did not stop the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoftFailure {
    /// The record failed validation and was not persisted.
    Validation {
        /// Collection of the skipped record.
        entity: &'static str,
        /// Identifier of the skipped record.
        record: Uuid,
        /// Joined validation errors.
        summary: String,
    },
    /// A required upstream step produced nothing, so the stage did no work.
    DependencyMissing {
        /// The empty dependency.
        dependency: StepName,
    },
    /// The write failed under a catch-and-continue policy.
    Persistence {
        /// Target collection.
        entity: &'static str,
        /// Identifier of the lost record.
        record: Uuid,
        /// Store failure detail.
        message: String,
    },
    /// The record already exists in the store and was left untouched.
    AlreadyPresent {
        /// Collection holding the record.
        entity: &'static str,
        /// Natural key the record was matched on.
        key: String,
    },
}

impl fmt::Display for SoftFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation {
                entity,
                record,
                summary,
            } => write!(f, "{entity} {record} skipped: {summary}"),
            Self::DependencyMissing { dependency } => {
                write!(f, "no {dependency} records were available")
            }
            Self::Persistence {
                entity,
                record,
                message,
            } => write!(f, "{entity} {record} not persisted: {message}"),
            Self::AlreadyPresent { entity, key } => write!(f, "{entity} {key} already present"),
        }
    }
}

/// Records produced by one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutput {
    /// Users and their companion documents.
    Users {
        /// Accounts.
        users: Vec<UserRecord>,
        /// Preferences documents.
        preferences: Vec<UserPreferencesRecord>,
        /// Sessions documents.
        sessions: Vec<UserSessionsRecord>,
        /// Roles documents.
        roles: Vec<UserRolesRecord>,
    },
    /// Workspaces and the spaces inside them.
    Workspaces {
        /// Workspaces.
        workspaces: Vec<WorkspaceRecord>,
        /// Spaces.
        spaces: Vec<SpaceRecord>,
    },
    /// Boards.
    Boards(Vec<BoardRecord>),
    /// Board templates.
    BoardTemplates(Vec<BoardTemplateRecord>),
    /// Tags.
    Tags(Vec<TagRecord>),
    /// Columns created on demand and tasks.
    Tasks {
        /// Columns created during the step.
        columns: Vec<ColumnRecord>,
        /// Tasks.
        tasks: Vec<TaskRecord>,
    },
    /// Comments.
    Comments(Vec<CommentRecord>),
    /// Notifications.
    Notifications(Vec<NotificationRecord>),
    /// Reminders.
    Reminders(Vec<ReminderRecord>),
    /// Files.
    Files(Vec<FileRecord>),
    /// Invitations.
    Invitations(Vec<InvitationRecord>),
    /// Analytics aggregates.
    Analytics(Vec<AnalyticsRecord>),
}

impl StageOutput {
    /// An output with no records for `step`.
    #[must_use]
    pub const fn empty(step: StepName) -> Self {
        match step {
            StepName::Users => Self::Users {
                users: Vec::new(),
                preferences: Vec::new(),
                sessions: Vec::new(),
                roles: Vec::new(),
            },
            StepName::Workspaces => Self::Workspaces {
                workspaces: Vec::new(),
                spaces: Vec::new(),
            },
            StepName::Boards => Self::Boards(Vec::new()),
            StepName::BoardTemplates => Self::BoardTemplates(Vec::new()),
            StepName::Tags => Self::Tags(Vec::new()),
            StepName::Tasks => Self::Tasks {
                columns: Vec::new(),
                tasks: Vec::new(),
            },
            StepName::Comments => Self::Comments(Vec::new()),
            StepName::Notifications => Self::Notifications(Vec::new()),
            StepName::Reminders => Self::Reminders(Vec::new()),
            StepName::Files => Self::Files(Vec::new()),
            StepName::Invitations => Self::Invitations(Vec::new()),
            StepName::Analytics => Self::Analytics(Vec::new()),
        }
    }

    /// Number of primary records: users, workspaces, tasks, and so on.
    #[must_use]
    pub fn primary_len(&self) -> usize {
        match self {
            Self::Users { users, .. } => users.len(),
            Self::Workspaces { workspaces, .. } => workspaces.len(),
            Self::Boards(records) => records.len(),
            Self::BoardTemplates(records) => records.len(),
            Self::Tags(records) => records.len(),
            Self::Tasks { tasks, .. } => tasks.len(),
            Self::Comments(records) => records.len(),
            Self::Notifications(records) => records.len(),
            Self::Reminders(records) => records.len(),
            Self::Files(records) => records.len(),
            Self::Invitations(records) => records.len(),
            Self::Analytics(records) => records.len(),
        }
    }
}

/// Immutable record of everything persisted so far in a run.
///
/// Each completed step folds its [`StageOutput`] in via [`Self::with`],
/// producing a new value for the next step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedResults {
    completed: BTreeSet<StepName>,
    users: Vec<UserRecord>,
    preferences: Vec<UserPreferencesRecord>,
    sessions: Vec<UserSessionsRecord>,
    roles: Vec<UserRolesRecord>,
    workspaces: Vec<WorkspaceRecord>,
    spaces: Vec<SpaceRecord>,
    boards: Vec<BoardRecord>,
    columns: Vec<ColumnRecord>,
    templates: Vec<BoardTemplateRecord>,
    tags: Vec<TagRecord>,
    tasks: Vec<TaskRecord>,
    comments: Vec<CommentRecord>,
    notifications: Vec<NotificationRecord>,
    reminders: Vec<ReminderRecord>,
    files: Vec<FileRecord>,
    invitations: Vec<InvitationRecord>,
    analytics: Vec<AnalyticsRecord>,
}

impl SeedResults {
    /// Folds a completed step into the results.
    #[must_use]
    pub fn with(mut self, step: StepName, output: StageOutput) -> Self {
        self.completed.insert(step);
        match output {
            StageOutput::Users {
                users,
                preferences,
                sessions,
                roles,
            } => {
                self.users.extend(users);
                self.preferences.extend(preferences);
                self.sessions.extend(sessions);
                self.roles.extend(roles);
            }
            StageOutput::Workspaces { workspaces, spaces } => {
                self.workspaces.extend(workspaces);
                self.spaces.extend(spaces);
            }
            StageOutput::Boards(records) => self.boards.extend(records),
            StageOutput::BoardTemplates(records) => self.templates.extend(records),
            StageOutput::Tags(records) => self.tags.extend(records),
            StageOutput::Tasks { columns, tasks } => {
                self.columns.extend(columns);
                self.tasks.extend(tasks);
            }
            StageOutput::Comments(records) => self.comments.extend(records),
            StageOutput::Notifications(records) => self.notifications.extend(records),
            StageOutput::Reminders(records) => self.reminders.extend(records),
            StageOutput::Files(records) => self.files.extend(records),
            StageOutput::Invitations(records) => self.invitations.extend(records),
            StageOutput::Analytics(records) => self.analytics.extend(records),
        }
        self
    }

    /// Whether `step` completed in this run.
    #[must_use]
    pub fn has_run(&self, step: StepName) -> bool {
        self.completed.contains(&step)
    }

    /// Records of type `T` persisted in this run.
    #[must_use]
    pub fn records<T: Produced>(&self) -> &[T] {
        T::collected(self)
    }

    /// Persisted record counts keyed by collection, in seeding order.
    #[must_use]
    pub fn collection_counts(&self) -> Vec<(&'static str, usize)> {
        vec![
            (UserRecord::COLLECTION, self.users.len()),
            (UserPreferencesRecord::COLLECTION, self.preferences.len()),
            (UserSessionsRecord::COLLECTION, self.sessions.len()),
            (UserRolesRecord::COLLECTION, self.roles.len()),
            (WorkspaceRecord::COLLECTION, self.workspaces.len()),
            (SpaceRecord::COLLECTION, self.spaces.len()),
            (BoardRecord::COLLECTION, self.boards.len()),
            (ColumnRecord::COLLECTION, self.columns.len()),
            (BoardTemplateRecord::COLLECTION, self.templates.len()),
            (TagRecord::COLLECTION, self.tags.len()),
            (TaskRecord::COLLECTION, self.tasks.len()),
            (CommentRecord::COLLECTION, self.comments.len()),
            (NotificationRecord::COLLECTION, self.notifications.len()),
            (ReminderRecord::COLLECTION, self.reminders.len()),
            (FileRecord::COLLECTION, self.files.len()),
            (InvitationRecord::COLLECTION, self.invitations.len()),
            (AnalyticsRecord::COLLECTION, self.analytics.len()),
        ]
    }

    /// Total records persisted in this run.
    #[must_use]
    pub fn total_records(&self) -> usize {
        self.collection_counts()
            .iter()
            .map(|(_, count)| count)
            .sum()
    }
}

/// A record type some step produces and later steps may read.
pub trait Produced: Entity + Clone {
    /// The step that generates records of this type.
    const PRODUCER: StepName;

    /// This type's records within `results`.
    fn collected(results: &SeedResults) -> &[Self];
}

macro_rules! produced {
    ($($record:ty => $step:ident . $field:ident),* $(,)?) => {
        $(
            impl Produced for $record {
                const PRODUCER: StepName = StepName::$step;

                fn collected(results: &SeedResults) -> &[Self] {
                    &results.$field
                }
            }
        )*
    };
}

produced! {
    UserRecord => Users.users,
    UserPreferencesRecord => Users.preferences,
    UserSessionsRecord => Users.sessions,
    UserRolesRecord => Users.roles,
    WorkspaceRecord => Workspaces.workspaces,
    SpaceRecord => Workspaces.spaces,
    BoardRecord => Boards.boards,
    BoardTemplateRecord => BoardTemplates.templates,
    TagRecord => Tags.tags,
    ColumnRecord => Tasks.columns,
    TaskRecord => Tasks.tasks,
    CommentRecord => Comments.comments,
    NotificationRecord => Notifications.notifications,
    ReminderRecord => Reminders.reminders,
    FileRecord => Files.files,
    InvitationRecord => Invitations.invitations,
    AnalyticsRecord => Analytics.analytics,
}

/// Validation counters for one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationTally {
    /// Records validated.
    pub checked: usize,
    /// Records rejected.
    pub rejected: usize,
    /// Warnings raised.
    pub warnings: usize,
}

impl ValidationTally {
    /// Counts one validation outcome.
    pub fn record(&mut self, report: &ValidationReport) {
        self.checked = self.checked.saturating_add(1);
        if !report.is_valid() {
            self.rejected = self.rejected.saturating_add(1);
        }
        self.warnings = self.warnings.saturating_add(report.warnings().len());
    }
}

/// Validation counters for every step of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationLog {
    steps: BTreeMap<StepName, ValidationTally>,
}

impl ValidationLog {
    /// Stores the tally for `step`.
    pub fn insert(&mut self, step: StepName, tally: ValidationTally) {
        self.steps.insert(step, tally);
    }

    /// Tally recorded for `step`.
    #[must_use]
    pub fn get(&self, step: StepName) -> Option<ValidationTally> {
        self.steps.get(&step).copied()
    }

    /// Sum of every step's tally.
    #[must_use]
    pub fn total(&self) -> ValidationTally {
        self.steps
            .values()
            .fold(ValidationTally::default(), |acc, tally| ValidationTally {
                checked: acc.checked.saturating_add(tally.checked),
                rejected: acc.rejected.saturating_add(tally.rejected),
                warnings: acc.warnings.saturating_add(tally.warnings),
            })
    }
}

/// How a step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The stage ran to completion.
    Completed,
    /// A required dependency was empty, so the stage produced nothing.
    Skipped,
}

/// Summary of one executed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    /// The step.
    pub step: StepName,
    /// Primary records persisted.
    pub processed: u64,
    /// Records the step expected to persist.
    pub expected: u64,
    /// Per-record failures that did not stop the run.
    pub soft_failures: Vec<SoftFailure>,
    /// Wall time spent in the step.
    pub elapsed: Duration,
    /// How the step ended.
    pub outcome: StepOutcome,
}

impl StepReport {
    /// Number of soft failures.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.soft_failures.len()
    }
}
