//! Tag, task, and comment records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a tag may be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagScope {
    /// Usable everywhere.
    Global,
    /// Limited to one workspace.
    Workspace,
    /// Limited to one space.
    Space,
    /// Limited to one board.
    Board,
}

/// A generated tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagRecord {
    /// Unique identifier.
    pub id: Uuid,
    /// Tag label.
    pub name: String,
    /// Hex colour.
    pub color: String,
    /// Optional description.
    pub description: Option<String>,
    /// Applicability scope.
    pub scope: TagScope,
    /// Workspace, space, or board the scope refers to; `None` for global tags.
    pub scope_ref: Option<Uuid>,
    /// User that created the tag.
    pub created_by: Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Workflow state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started.
    Todo,
    /// Being worked on.
    InProgress,
    /// Awaiting review.
    Review,
    /// Finished.
    Done,
}

impl TaskStatus {
    /// Maps a zero-based column position onto a workflow state.
    #[must_use]
    pub const fn for_column(position: u32, column_count: u32) -> Self {
        if column_count == 0 || position == 0 {
            Self::Todo
        } else if position.saturating_add(1) >= column_count {
            Self::Done
        } else if position.saturating_add(2) == column_count {
            Self::Review
        } else {
            Self::InProgress
        }
    }

    /// Stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Review => "review",
            Self::Done => "done",
        }
    }
}

/// Urgency of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    /// Low urgency.
    Low,
    /// Normal urgency.
    Medium,
    /// High urgency.
    High,
    /// Drop everything.
    Critical,
}

impl TaskPriority {
    /// Stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// A generated task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    /// Unique identifier.
    pub id: Uuid,
    /// Short title.
    pub title: String,
    /// Longer description.
    pub description: String,
    /// Owning board.
    pub board: Uuid,
    /// Space owning the board.
    pub space: Uuid,
    /// Column of the owning board.
    pub column: Uuid,
    /// Workflow state derived from the column.
    pub status: TaskStatus,
    /// Urgency.
    pub priority: TaskPriority,
    /// Board member that reported the task.
    pub reporter: Uuid,
    /// Board members assigned to the task.
    pub assignees: Vec<Uuid>,
    /// Board members watching the task.
    pub watchers: Vec<Uuid>,
    /// Applied tags.
    pub tags: Vec<Uuid>,
    /// Optional due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Optional effort estimate in minutes.
    pub estimate_minutes: Option<u32>,
    /// Position within the column.
    pub position: u32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl TaskRecord {
    /// Iterates over every participant: reporter, assignees, then watchers.
    ///
    /// Identifiers may repeat when a user holds several roles.
    pub fn participants(&self) -> impl Iterator<Item = Uuid> + '_ {
        std::iter::once(self.reporter)
            .chain(self.assignees.iter().copied())
            .chain(self.watchers.iter().copied())
    }
}

/// A generated comment on a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    /// Unique identifier.
    pub id: Uuid,
    /// Commented task.
    pub task: Uuid,
    /// Task participant that wrote the comment.
    pub author: Uuid,
    /// Comment body.
    pub content: String,
    /// Task participants mentioned in the body.
    pub mentions: Vec<Uuid>,
    /// Whether the comment was edited after posting.
    pub is_edited: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
