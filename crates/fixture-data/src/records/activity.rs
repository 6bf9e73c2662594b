//! Notification, reminder, file, invitation, and analytics records.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::workspace::WorkspaceRole;

/// Category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// The recipient was assigned to a task.
    TaskAssigned,
    /// A comment was added to a watched task.
    CommentAdded,
    /// The recipient was mentioned.
    Mention,
    /// A task is nearly due.
    DueSoon,
    /// The recipient was invited to a workspace.
    WorkspaceInvite,
    /// Platform announcement.
    System,
}

impl NotificationKind {
    /// Whether notifications of this kind point at a task.
    #[must_use]
    pub const fn is_task_related(self) -> bool {
        matches!(
            self,
            Self::TaskAssigned | Self::CommentAdded | Self::Mention | Self::DueSoon
        )
    }
}

/// A generated notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    /// Unique identifier.
    pub id: Uuid,
    /// Receiving user.
    pub recipient: Uuid,
    /// Optional sending user.
    pub sender: Option<Uuid>,
    /// Category.
    pub kind: NotificationKind,
    /// Headline.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Related task, if any.
    pub task: Option<Uuid>,
    /// Whether the recipient has read it.
    pub is_read: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// How often a reminder repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderRepeat {
    /// Fires once.
    None,
    /// Every day.
    Daily,
    /// Every week.
    Weekly,
    /// Every month.
    Monthly,
}

/// Delivery channel for a reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderChannel {
    /// In-application banner.
    InApp,
    /// E-mail.
    Email,
    /// Mobile push.
    Push,
}

/// A generated reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRecord {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning user.
    pub user: Uuid,
    /// Related task, if any.
    pub task: Option<Uuid>,
    /// Reminder title.
    pub title: String,
    /// When the reminder fires.
    pub remind_at: DateTime<Utc>,
    /// Repetition schedule.
    pub repeat: ReminderRepeat,
    /// Delivery channels; never empty.
    pub channels: Vec<ReminderChannel>,
    /// Whether the reminder already fired.
    pub is_sent: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Broad file category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Raster image.
    Image,
    /// Video clip.
    Video,
    /// Audio clip.
    Audio,
    /// Paged document.
    Document,
    /// Compressed archive.
    Archive,
}

impl FileKind {
    /// MIME type prefix or exact types accepted for the kind.
    #[must_use]
    pub fn accepts_mime(self, mime_type: &str) -> bool {
        match self {
            Self::Image => mime_type.starts_with("image/"),
            Self::Video => mime_type.starts_with("video/"),
            Self::Audio => mime_type.starts_with("audio/"),
            Self::Document => matches!(
                mime_type,
                "application/pdf"
                    | "application/msword"
                    | "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
                    | "text/plain"
            ),
            Self::Archive => matches!(
                mime_type,
                "application/zip" | "application/gzip" | "application/x-tar"
            ),
        }
    }
}

/// Type-specific file metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FileMetadata {
    /// Image dimensions.
    Image {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
    /// Video dimensions and length.
    Video {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
        /// Duration in seconds.
        duration_secs: u32,
    },
    /// Audio length.
    Audio {
        /// Duration in seconds.
        duration_secs: u32,
    },
    /// Document length.
    Document {
        /// Number of pages.
        page_count: u32,
    },
    /// Archive contents.
    Archive {
        /// Number of entries.
        entry_count: u32,
    },
}

impl FileMetadata {
    /// The file kind this metadata describes.
    #[must_use]
    pub const fn kind(&self) -> FileKind {
        match self {
            Self::Image { .. } => FileKind::Image,
            Self::Video { .. } => FileKind::Video,
            Self::Audio { .. } => FileKind::Audio,
            Self::Document { .. } => FileKind::Document,
            Self::Archive { .. } => FileKind::Archive,
        }
    }
}

/// A generated file attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Unique identifier.
    pub id: Uuid,
    /// Stored file name.
    pub filename: String,
    /// Name supplied by the uploader.
    pub original_name: String,
    /// MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Broad category.
    pub kind: FileKind,
    /// Type-specific metadata consistent with `kind`.
    pub metadata: FileMetadata,
    /// Uploading user, if known.
    pub uploaded_by: Option<Uuid>,
    /// Task the file is attached to, if any.
    pub task: Option<Uuid>,
    /// Storage key.
    pub storage_key: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Lifecycle state of an invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    /// Awaiting a response.
    Pending,
    /// Accepted by the invitee.
    Accepted,
    /// Declined by the invitee.
    Declined,
    /// Lapsed without response.
    Expired,
}

/// A generated workspace invitation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationRecord {
    /// Unique identifier.
    pub id: Uuid,
    /// Opaque acceptance token.
    pub token: String,
    /// Inviting user.
    pub inviter: Uuid,
    /// Invitee e-mail address.
    pub invitee_email: String,
    /// Existing user matching the e-mail, if any.
    pub invitee: Option<Uuid>,
    /// Target workspace.
    pub workspace: Uuid,
    /// Role granted on acceptance.
    pub role: WorkspaceRole,
    /// Lifecycle state.
    pub status: InvitationStatus,
    /// Expiry timestamp.
    pub expires_at: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Aggregation scope of an analytics document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyticsScope {
    /// One workspace.
    Workspace,
    /// One user.
    User,
    /// Whole system.
    System,
}

/// Aggregate counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsMetrics {
    /// Tasks in scope.
    pub total_tasks: u64,
    /// Tasks in the `done` state.
    pub completed_tasks: u64,
    /// Unfinished tasks past their due date.
    pub overdue_tasks: u64,
    /// Task counts keyed by status label.
    pub tasks_by_status: BTreeMap<String, u64>,
    /// Task counts keyed by priority label.
    pub tasks_by_priority: BTreeMap<String, u64>,
    /// Users participating in at least one task in scope.
    pub active_users: u64,
    /// Users in scope.
    pub total_users: u64,
    /// Workspaces in scope.
    pub total_workspaces: u64,
    /// Completed share of tasks, as a whole percentage.
    pub completion_rate_percent: u64,
}

/// A derived analytics aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsRecord {
    /// Unique identifier.
    pub id: Uuid,
    /// Aggregation scope.
    pub scope: AnalyticsScope,
    /// Workspace or user the scope refers to; `None` for system scope.
    pub scope_ref: Option<Uuid>,
    /// Start of the reporting period.
    pub period_start: DateTime<Utc>,
    /// End of the reporting period.
    pub period_end: DateTime<Utc>,
    /// Aggregated counters.
    pub metrics: AnalyticsMetrics,
    /// Generation timestamp.
    pub generated_at: DateTime<Utc>,
}
