//! Generated entity records.
//!
//! These types describe every document the seeder writes. They are plain
//! serialisable values, independent of any persistence adapter, and use
//! camelCase field names on the wire.

mod activity;
mod board;
mod identity;
mod task;
mod workspace;

pub use activity::{
    AnalyticsMetrics, AnalyticsRecord, AnalyticsScope, FileKind, FileMetadata, FileRecord,
    InvitationRecord, InvitationStatus, NotificationKind, NotificationRecord, ReminderChannel,
    ReminderRecord, ReminderRepeat,
};
pub use board::{
    BoardMember, BoardRecord, BoardRole, BoardTemplateRecord, BoardType, BoardVisibility,
    ColumnRecord, TemplateColumn,
};
pub use identity::{
    SessionEntry, SystemRole, Theme, UserPreferencesRecord, UserRecord, UserRolesRecord,
    UserSessionsRecord,
};
pub use task::{CommentRecord, TagRecord, TagScope, TaskPriority, TaskRecord, TaskStatus};
pub use workspace::{
    SpaceMember, SpaceRecord, SpaceRole, WorkspaceMember, WorkspaceRecord, WorkspaceRole,
};
