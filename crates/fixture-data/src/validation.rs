//! Stateless rule checks for generated records.
//!
//! Each `validate_*` function inspects one candidate record, together with the
//! parent records it must be consistent with, and returns a
//! [`ValidationReport`]. Errors make a record unfit for persistence; warnings
//! are advisory.
//!
//! # Display name rules
//!
//! - Minimum length: 3 characters
//! - Maximum length: 32 characters
//! - Allowed characters: letters (A-Z, a-z), digits (0-9), spaces, underscores
//! - Must not be whitespace-only

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use crate::records::{
    AnalyticsRecord, AnalyticsScope, BoardRecord, BoardTemplateRecord, ColumnRecord,
    CommentRecord, FileRecord, InvitationRecord, InvitationStatus, NotificationRecord,
    ReminderRecord, SpaceRecord, SystemRole, TagRecord, TagScope, TaskRecord,
    UserPreferencesRecord, UserRecord, UserRolesRecord, UserSessionsRecord, WorkspaceRecord,
    WorkspaceRole,
};

/// Minimum allowed length for a display name.
pub const DISPLAY_NAME_MIN: usize = 3;

/// Maximum allowed length for a display name.
pub const DISPLAY_NAME_MAX: usize = 32;

/// Maximum length for workspace, space, board, and template names.
pub const CONTAINER_NAME_MAX: usize = 64;

/// Maximum length for tag names.
pub const TAG_NAME_MAX: usize = 32;

/// Maximum length for task titles.
pub const TASK_TITLE_MAX: usize = 200;

/// Maximum length for comment bodies.
pub const COMMENT_MAX: usize = 2_000;

static EMAIL_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}$").ok()
});

static HEX_COLOR_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").ok());

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Offending field, in wire (camelCase) form.
    pub field: &'static str,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors and warnings collected for one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Records a blocking issue.
    pub fn error(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(ValidationIssue {
            field,
            message: message.into(),
        });
    }

    /// Records an advisory issue.
    pub fn warn(&mut self, field: &'static str, message: impl Into<String>) {
        self.warnings.push(ValidationIssue {
            field,
            message: message.into(),
        });
    }

    fn require(&mut self, condition: bool, field: &'static str, message: &str) {
        if !condition {
            self.error(field, message);
        }
    }

    /// Returns `true` when no errors were recorded.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Blocking issues.
    #[must_use]
    pub fn errors(&self) -> &[ValidationIssue] {
        &self.errors
    }

    /// Advisory issues.
    #[must_use]
    pub fn warnings(&self) -> &[ValidationIssue] {
        &self.warnings
    }

    /// Errors joined into one line, for logging.
    #[must_use]
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Validates a display name.
///
/// # Examples
///
/// ```
/// use fixture_data::is_valid_display_name;
///
/// assert!(is_valid_display_name("Ada Lovelace"));
/// assert!(is_valid_display_name("user_123"));
/// assert!(!is_valid_display_name("ab"));
/// assert!(!is_valid_display_name("O'Brien"));
/// assert!(!is_valid_display_name("   "));
/// ```
#[must_use]
pub fn is_valid_display_name(name: &str) -> bool {
    let length = name.chars().count();
    if !(DISPLAY_NAME_MIN..=DISPLAY_NAME_MAX).contains(&length) {
        return false;
    }
    if name.trim().is_empty() {
        return false;
    }
    name.chars().all(is_valid_display_name_char)
}

const fn is_valid_display_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == ' ' || c == '_'
}

/// Replaces characters a display name may not contain with underscores.
///
/// Length is not enforced.
#[must_use]
pub(crate) fn sanitize_display_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if is_valid_display_name_char(c) {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Returns `true` for a lowercase `local@domain.tld` address.
///
/// ```
/// use fixture_data::is_valid_email;
///
/// assert!(is_valid_email("ada.lovelace@example.com"));
/// assert!(!is_valid_email("ada"));
/// ```
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(email))
}

/// Returns `true` for `#rgb` or `#rrggbb` colours.
///
/// ```
/// use fixture_data::is_valid_hex_color;
///
/// assert!(is_valid_hex_color("#ff5733"));
/// assert!(!is_valid_hex_color("not-a-color"));
/// ```
#[must_use]
pub fn is_valid_hex_color(color: &str) -> bool {
    HEX_COLOR_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(color))
}

fn check_name(
    report: &mut ValidationReport,
    field: &'static str,
    value: &str,
    max: usize,
) {
    let length = value.trim().chars().count();
    if length == 0 {
        report.error(field, "must not be empty");
    } else if value.chars().count() > max {
        report.error(field, format!("must be at most {max} characters"));
    }
}

fn check_color(report: &mut ValidationReport, field: &'static str, color: &str) {
    if !is_valid_hex_color(color) {
        report.error(field, format!("'{color}' is not a hex colour"));
    }
}

fn check_unique(report: &mut ValidationReport, field: &'static str, ids: &[Uuid]) {
    let mut seen = HashSet::with_capacity(ids.len());
    if ids.iter().any(|id| !seen.insert(*id)) {
        report.error(field, "contains duplicate users");
    }
}

/// Validates a user account.
#[must_use]
pub fn validate_user(user: &UserRecord) -> ValidationReport {
    let mut report = ValidationReport::default();
    report.require(
        is_valid_display_name(&user.name),
        "name",
        "must be 3-32 letters, digits, spaces or underscores",
    );
    report.require(is_valid_email(&user.email), "email", "is not a valid address");
    report.require(
        user.password_hash.starts_with("sha256$"),
        "passwordHash",
        "must be a salted sha256 digest",
    );
    if user.is_locked && user.lock_until.is_none() {
        report.error("lockUntil", "is required when the account is locked");
    }
    if !user.is_locked && user.lock_until.is_some() {
        report.warn("lockUntil", "is set on an unlocked account");
    }
    if !user.is_email_verified {
        report.warn("isEmailVerified", "account e-mail is unverified");
    }
    report
}

/// Validates a preferences document against its owning user.
#[must_use]
pub fn validate_user_preferences(
    preferences: &UserPreferencesRecord,
    user: &UserRecord,
) -> ValidationReport {
    let mut report = ValidationReport::default();
    report.require(preferences.user == user.id, "user", "must reference the owning user");
    report.require(
        preferences.id == user.preferences,
        "id",
        "must match the user's preferences reference",
    );
    report.require(!preferences.language.is_empty(), "language", "must not be empty");
    report.require(
        preferences.timezone.contains('/') || preferences.timezone == "UTC",
        "timezone",
        "must be an IANA zone name",
    );
    report
}

/// Validates a sessions document against its owning user.
#[must_use]
pub fn validate_user_sessions(
    sessions: &UserSessionsRecord,
    user: &UserRecord,
) -> ValidationReport {
    let mut report = ValidationReport::default();
    report.require(sessions.user == user.id, "user", "must reference the owning user");
    report.require(
        sessions.id == user.sessions,
        "id",
        "must match the user's sessions reference",
    );
    if sessions
        .sessions
        .iter()
        .any(|entry| entry.ip_address.is_empty() || entry.device.is_empty())
    {
        report.error("sessions", "every session needs a device and an IP address");
    }
    report
}

/// Validates a roles document against its owning user.
#[must_use]
pub fn validate_user_roles(roles: &UserRolesRecord, user: &UserRecord) -> ValidationReport {
    let mut report = ValidationReport::default();
    report.require(roles.user == user.id, "user", "must reference the owning user");
    report.require(roles.id == user.roles, "id", "must match the user's roles reference");
    if roles.system_role == SystemRole::Admin && roles.permissions.is_empty() {
        report.warn("permissions", "admin account has no explicit permissions");
    }
    report
}

/// Validates a workspace and its member list.
#[must_use]
pub fn validate_workspace(workspace: &WorkspaceRecord) -> ValidationReport {
    let mut report = ValidationReport::default();
    check_name(&mut report, "name", &workspace.name, CONTAINER_NAME_MAX);
    match workspace.members.first() {
        Some(first) if first.user == workspace.owner => {
            report.require(
                first.role.is_admin_equivalent(),
                "members",
                "owner must hold an admin-equivalent role",
            );
        }
        _ => report.error("members", "owner must be the first member"),
    }
    let ids: Vec<Uuid> = workspace.member_ids().collect();
    check_unique(&mut report, "members", &ids);
    if workspace
        .members
        .iter()
        .skip(1)
        .any(|member| member.role == WorkspaceRole::Owner)
    {
        report.error("members", "only the owner may hold the owner role");
    }
    if workspace.members.len() == 1 {
        report.warn("members", "workspace has no members besides the owner");
    }
    report
}

/// Validates a space against its parent workspace.
#[must_use]
pub fn validate_space(space: &SpaceRecord, workspace: &WorkspaceRecord) -> ValidationReport {
    let mut report = ValidationReport::default();
    check_name(&mut report, "name", &space.name, CONTAINER_NAME_MAX);
    check_color(&mut report, "color", &space.color);
    report.require(
        space.workspace == workspace.id,
        "workspace",
        "must reference the parent workspace",
    );
    let workspace_members: HashSet<Uuid> = workspace.member_ids().collect();
    report.require(
        workspace_members.contains(&space.owner),
        "owner",
        "must be a workspace member",
    );
    if space.member_ids().any(|id| !workspace_members.contains(&id)) {
        report.error("members", "must be workspace members");
    }
    let ids: Vec<Uuid> = space.member_ids().collect();
    check_unique(&mut report, "members", &ids);
    report
}

/// Validates a board against its parent space.
#[must_use]
pub fn validate_board(board: &BoardRecord, space: &SpaceRecord) -> ValidationReport {
    let mut report = ValidationReport::default();
    check_name(&mut report, "name", &board.name, CONTAINER_NAME_MAX);
    report.require(board.space == space.id, "space", "must reference the parent space");
    report.require(
        board.workspace == space.workspace,
        "workspace",
        "must match the space's workspace",
    );
    report.require(
        board.member_ids().next() == Some(board.owner),
        "members",
        "owner must be the first member",
    );
    let space_members: HashSet<Uuid> = space.member_ids().collect();
    if board.member_ids().any(|id| !space_members.contains(&id)) {
        report.error("members", "must be space members");
    }
    let ids: Vec<Uuid> = board.member_ids().collect();
    check_unique(&mut report, "members", &ids);
    report
}

/// Validates a column against the board it belongs to.
#[must_use]
pub fn validate_column(column: &ColumnRecord, board: &BoardRecord) -> ValidationReport {
    let mut report = ValidationReport::default();
    report.require(column.board == board.id, "board", "must reference the owning board");
    check_name(&mut report, "name", &column.name, TAG_NAME_MAX);
    check_color(&mut report, "color", &column.color);
    if column.wip_limit == Some(0) {
        report.error("wipLimit", "must be positive when set");
    }
    report
}

/// Validates a board template; `creator_is_privileged` reports whether the
/// creating user holds the admin system role.
#[must_use]
pub fn validate_board_template(
    template: &BoardTemplateRecord,
    creator_is_privileged: bool,
) -> ValidationReport {
    let mut report = ValidationReport::default();
    check_name(&mut report, "name", &template.name, CONTAINER_NAME_MAX);
    report.require(!template.category.is_empty(), "category", "must not be empty");
    report.require(
        creator_is_privileged,
        "createdBy",
        "must be a privileged user",
    );
    if template.columns.is_empty() {
        report.error("columns", "must define at least one column");
    }
    let contiguous = template
        .columns
        .iter()
        .enumerate()
        .all(|(index, column)| usize::try_from(column.position).is_ok_and(|p| p == index));
    report.require(contiguous, "columns", "positions must be contiguous from zero");
    for column in &template.columns {
        check_color(&mut report, "columns", &column.color);
    }
    report
}

/// Validates a tag.
#[must_use]
pub fn validate_tag(tag: &TagRecord) -> ValidationReport {
    let mut report = ValidationReport::default();
    check_name(&mut report, "name", &tag.name, TAG_NAME_MAX);
    check_color(&mut report, "color", &tag.color);
    match (tag.scope, tag.scope_ref) {
        (TagScope::Global, Some(_)) => {
            report.error("scopeRef", "must be empty for global tags");
        }
        (TagScope::Workspace | TagScope::Space | TagScope::Board, None) => {
            report.error("scopeRef", "is required for scoped tags");
        }
        _ => {}
    }
    if tag.description.as_deref().is_some_and(str::is_empty) {
        report.warn("description", "is present but empty");
    }
    report
}

/// Validates a task against its board and column.
#[must_use]
pub fn validate_task(
    task: &TaskRecord,
    board: &BoardRecord,
    column: &ColumnRecord,
) -> ValidationReport {
    let mut report = ValidationReport::default();
    check_name(&mut report, "title", &task.title, TASK_TITLE_MAX);
    report.require(task.board == board.id, "board", "must reference the owning board");
    report.require(task.space == board.space, "space", "must match the board's space");
    report.require(
        task.column == column.id && column.board == board.id,
        "column",
        "must be a column of the owning board",
    );

    let members: HashSet<Uuid> = board.member_ids().collect();
    report.require(
        members.contains(&task.reporter),
        "reporter",
        "must be a board member",
    );
    if task.assignees.iter().any(|id| !members.contains(id)) {
        report.error("assignees", "must be board members");
    }
    if task.watchers.iter().any(|id| !members.contains(id)) {
        report.error("watchers", "must be board members");
    }
    check_unique(&mut report, "assignees", &task.assignees);
    check_unique(&mut report, "watchers", &task.watchers);

    if task.due_date.is_some_and(|due| due < task.created_at) {
        report.warn("dueDate", "is before the creation date");
    }
    if task.estimate_minutes == Some(0) {
        report.error("estimateMinutes", "must be positive when set");
    }
    report
}

/// Validates a comment against the task it belongs to.
#[must_use]
pub fn validate_comment(comment: &CommentRecord, task: &TaskRecord) -> ValidationReport {
    let mut report = ValidationReport::default();
    report.require(comment.task == task.id, "task", "must reference the commented task");
    check_name(&mut report, "content", &comment.content, COMMENT_MAX);
    let participants: HashSet<Uuid> = task.participants().collect();
    report.require(
        participants.contains(&comment.author),
        "author",
        "must be a task participant",
    );
    if comment.mentions.iter().any(|id| !participants.contains(id)) {
        report.error("mentions", "must be task participants");
    }
    if comment.mentions.contains(&comment.author) {
        report.warn("mentions", "author mentions themselves");
    }
    report
}

/// Validates a notification.
#[must_use]
pub fn validate_notification(notification: &NotificationRecord) -> ValidationReport {
    let mut report = ValidationReport::default();
    check_name(&mut report, "title", &notification.title, TASK_TITLE_MAX);
    report.require(!notification.message.is_empty(), "message", "must not be empty");
    if notification.kind.is_task_related() && notification.task.is_none() {
        report.error("task", "is required for task notifications");
    }
    if notification.sender == Some(notification.recipient) {
        report.warn("sender", "notifies the recipient about their own action");
    }
    report
}

/// Validates a reminder.
#[must_use]
pub fn validate_reminder(reminder: &ReminderRecord) -> ValidationReport {
    let mut report = ValidationReport::default();
    check_name(&mut report, "title", &reminder.title, TASK_TITLE_MAX);
    report.require(
        !reminder.channels.is_empty(),
        "channels",
        "must list at least one channel",
    );
    if reminder.remind_at < reminder.created_at {
        report.warn("remindAt", "is before the creation date");
    }
    report
}

/// Validates a file attachment.
#[must_use]
pub fn validate_file(file: &FileRecord) -> ValidationReport {
    let mut report = ValidationReport::default();
    report.require(!file.filename.is_empty(), "filename", "must not be empty");
    report.require(!file.storage_key.is_empty(), "storageKey", "must not be empty");
    report.require(file.size_bytes > 0, "sizeBytes", "must be positive");
    report.require(
        file.kind.accepts_mime(&file.mime_type),
        "mimeType",
        "does not match the file kind",
    );
    report.require(
        file.metadata.kind() == file.kind,
        "metadata",
        "does not match the file kind",
    );
    if file.uploaded_by.is_none() {
        report.warn("uploadedBy", "file has no known uploader");
    }
    report
}

/// Validates an invitation against its target workspace.
#[must_use]
pub fn validate_invitation(
    invitation: &InvitationRecord,
    workspace: &WorkspaceRecord,
) -> ValidationReport {
    let mut report = ValidationReport::default();
    report.require(
        invitation.workspace == workspace.id,
        "workspace",
        "must reference the target workspace",
    );
    report.require(
        is_valid_email(&invitation.invitee_email),
        "inviteeEmail",
        "is not a valid address",
    );
    report.require(invitation.token.len() >= 32, "token", "must be at least 32 characters");
    report.require(
        invitation.role != WorkspaceRole::Owner,
        "role",
        "invitations cannot grant ownership",
    );
    report.require(
        invitation.expires_at > invitation.created_at,
        "expiresAt",
        "must be after the creation date",
    );
    let inviter_is_admin = workspace
        .members
        .iter()
        .any(|member| member.user == invitation.inviter && member.role.is_admin_equivalent());
    report.require(
        inviter_is_admin,
        "inviter",
        "must be a workspace owner or admin",
    );
    if invitation.status == InvitationStatus::Accepted && invitation.invitee.is_none() {
        report.warn("invitee", "accepted invitation has no linked user");
    }
    report
}

/// Validates an analytics aggregate.
#[must_use]
pub fn validate_analytics(analytics: &AnalyticsRecord) -> ValidationReport {
    let mut report = ValidationReport::default();
    report.require(
        analytics.period_end >= analytics.period_start,
        "periodEnd",
        "must not precede the period start",
    );
    match (analytics.scope, analytics.scope_ref) {
        (AnalyticsScope::System, Some(_)) => {
            report.error("scopeRef", "must be empty for system analytics");
        }
        (AnalyticsScope::Workspace | AnalyticsScope::User, None) => {
            report.error("scopeRef", "is required for scoped analytics");
        }
        _ => {}
    }
    let metrics = &analytics.metrics;
    report.require(
        metrics.completed_tasks <= metrics.total_tasks,
        "metrics",
        "completed tasks exceed total tasks",
    );
    report.require(
        metrics.completion_rate_percent <= 100,
        "metrics",
        "completion rate exceeds 100%",
    );
    let by_status: u64 = metrics.tasks_by_status.values().sum();
    report.require(
        by_status == metrics.total_tasks,
        "metrics",
        "status breakdown does not sum to the task total",
    );
    if metrics.total_tasks == 0 {
        report.warn("metrics", "no tasks in scope");
    }
    report
}

#[cfg(test)]
mod tests {
    //! Covers the validation rules for each record type.

    use chrono::{DateTime, TimeDelta, TimeZone, Utc};
    use rstest::{fixture, rstest};

    use super::*;
    use crate::records::{
        AnalyticsMetrics, BoardMember, BoardRole, BoardType, BoardVisibility, FileKind,
        FileMetadata, NotificationKind, ReminderChannel, ReminderRepeat, SpaceMember, SpaceRole,
        TaskPriority, TaskStatus, TemplateColumn, WorkspaceMember,
    };

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    #[fixture]
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .expect("timestamp")
    }

    #[fixture]
    fn workspace(now: DateTime<Utc>) -> WorkspaceRecord {
        WorkspaceRecord {
            id: id(100),
            name: "Acme".to_owned(),
            description: String::new(),
            owner: id(1),
            members: vec![
                WorkspaceMember {
                    user: id(1),
                    role: WorkspaceRole::Owner,
                    permissions: WorkspaceRole::Owner.default_permissions(),
                    joined_at: now,
                },
                WorkspaceMember {
                    user: id(2),
                    role: WorkspaceRole::Member,
                    permissions: WorkspaceRole::Member.default_permissions(),
                    joined_at: now,
                },
                WorkspaceMember {
                    user: id(3),
                    role: WorkspaceRole::Member,
                    permissions: WorkspaceRole::Member.default_permissions(),
                    joined_at: now,
                },
            ],
            is_archived: false,
            created_at: now,
        }
    }

    #[fixture]
    fn space(now: DateTime<Utc>) -> SpaceRecord {
        SpaceRecord {
            id: id(200),
            name: "Engineering".to_owned(),
            description: String::new(),
            workspace: id(100),
            owner: id(1),
            color: "#336699".to_owned(),
            members: [1, 2, 3]
                .into_iter()
                .map(|n| SpaceMember {
                    user: id(n),
                    role: SpaceRole::Contributor,
                    permissions: SpaceRole::Contributor.default_permissions(),
                })
                .collect(),
            is_archived: false,
            created_at: now,
        }
    }

    #[fixture]
    fn board(now: DateTime<Utc>) -> BoardRecord {
        BoardRecord {
            id: id(300),
            name: "Sprint".to_owned(),
            description: String::new(),
            space: id(200),
            workspace: id(100),
            owner: id(1),
            visibility: BoardVisibility::Workspace,
            board_type: BoardType::Kanban,
            members: vec![
                BoardMember {
                    user: id(1),
                    role: BoardRole::Owner,
                },
                BoardMember {
                    user: id(2),
                    role: BoardRole::Member,
                },
            ],
            created_at: now,
        }
    }

    #[fixture]
    fn column(now: DateTime<Utc>) -> ColumnRecord {
        ColumnRecord {
            id: id(400),
            board: id(300),
            name: "To Do".to_owned(),
            position: 0,
            color: "#cccccc".to_owned(),
            wip_limit: None,
            created_at: now,
        }
    }

    #[fixture]
    fn task(now: DateTime<Utc>) -> TaskRecord {
        TaskRecord {
            id: id(500),
            title: "Write docs".to_owned(),
            description: String::new(),
            board: id(300),
            space: id(200),
            column: id(400),
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            reporter: id(1),
            assignees: vec![id(2)],
            watchers: vec![],
            tags: vec![],
            due_date: None,
            estimate_minutes: Some(60),
            position: 0,
            created_at: now,
        }
    }

    fn tag(color: &str, scope: TagScope, scope_ref: Option<Uuid>, now: DateTime<Utc>) -> TagRecord {
        TagRecord {
            id: id(600),
            name: "bug".to_owned(),
            color: color.to_owned(),
            description: None,
            scope,
            scope_ref,
            created_by: id(1),
            created_at: now,
        }
    }

    #[rstest]
    #[case("Ada", true)]
    #[case("Ada Lovelace", true)]
    #[case("user_123", true)]
    #[case("ab", false)]
    #[case("", false)]
    #[case("O'Brien", false)]
    #[case("Marie-Claire", false)]
    #[case("   ", false)]
    fn display_names(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_valid_display_name(name), expected);
    }

    #[test]
    fn rejects_names_exceeding_max_length() {
        assert!(!is_valid_display_name(&"A".repeat(DISPLAY_NAME_MAX + 1)));
        assert!(is_valid_display_name(&"A".repeat(DISPLAY_NAME_MAX)));
    }

    #[rstest]
    #[case("O'Brien", "O_Brien")]
    #[case("Marie-Claire", "Marie_Claire")]
    #[case("Ada Lovelace", "Ada Lovelace")]
    fn sanitizes_display_names(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(sanitize_display_name(raw), expected);
    }

    #[rstest]
    #[case("ada@example.com", true)]
    #[case("ada.lovelace+tag@mail.example.org", true)]
    #[case("Ada@Example.com", false)]
    #[case("ada@", false)]
    #[case("ada@example", false)]
    #[case("not an email", false)]
    fn emails(#[case] email: &str, #[case] expected: bool) {
        assert_eq!(is_valid_email(email), expected);
    }

    #[rstest]
    #[case("#fff", true)]
    #[case("#FF5733", true)]
    #[case("#ff573", false)]
    #[case("ff5733", false)]
    #[case("not-a-color", false)]
    fn hex_colors(#[case] color: &str, #[case] expected: bool) {
        assert_eq!(is_valid_hex_color(color), expected);
    }

    #[rstest]
    fn tag_with_bad_color_reports_color_error(now: DateTime<Utc>) {
        let report = validate_tag(&tag("not-a-color", TagScope::Global, None, now));

        assert!(!report.is_valid());
        assert_eq!(report.errors().first().map(|e| e.field), Some("color"));
    }

    #[rstest]
    fn scoped_tag_requires_scope_ref(now: DateTime<Utc>) {
        let report = validate_tag(&tag("#123456", TagScope::Board, None, now));
        assert!(!report.is_valid());

        let report = validate_tag(&tag("#123456", TagScope::Board, Some(id(300)), now));
        assert!(report.is_valid());
    }

    #[rstest]
    fn valid_workspace_passes(workspace: WorkspaceRecord) {
        assert!(validate_workspace(&workspace).is_valid());
    }

    #[rstest]
    fn workspace_owner_must_be_first(mut workspace: WorkspaceRecord) {
        workspace.members.swap(0, 1);
        let report = validate_workspace(&workspace);
        assert!(report.errors().iter().any(|e| e.field == "members"));
    }

    #[rstest]
    fn space_members_must_belong_to_workspace(
        workspace: WorkspaceRecord,
        mut space: SpaceRecord,
    ) {
        assert!(validate_space(&space, &workspace).is_valid());

        space.members.push(SpaceMember {
            user: id(99),
            role: SpaceRole::Viewer,
            permissions: vec![],
        });
        assert!(!validate_space(&space, &workspace).is_valid());
    }

    #[rstest]
    fn board_members_must_belong_to_space(space: SpaceRecord, mut board: BoardRecord) {
        assert!(validate_board(&board, &space).is_valid());

        board.members.push(BoardMember {
            user: id(42),
            role: BoardRole::Viewer,
        });
        assert!(!validate_board(&board, &space).is_valid());
    }

    #[rstest]
    fn task_participants_must_be_board_members(
        board: BoardRecord,
        column: ColumnRecord,
        mut task: TaskRecord,
    ) {
        assert!(validate_task(&task, &board, &column).is_valid());

        task.watchers.push(id(3));
        let report = validate_task(&task, &board, &column);
        assert_eq!(report.errors().first().map(|e| e.field), Some("watchers"));
    }

    #[rstest]
    fn task_column_must_belong_to_board(
        board: BoardRecord,
        mut column: ColumnRecord,
        task: TaskRecord,
    ) {
        column.board = id(301);
        assert!(!validate_task(&task, &board, &column).is_valid());
    }

    #[rstest]
    fn task_due_before_creation_is_warning_only(
        board: BoardRecord,
        column: ColumnRecord,
        mut task: TaskRecord,
        now: DateTime<Utc>,
    ) {
        task.due_date = Some(now - TimeDelta::days(1));
        let report = validate_task(&task, &board, &column);
        assert!(report.is_valid());
        assert_eq!(report.warnings().len(), 1);
    }

    #[rstest]
    fn comment_author_must_participate(task: TaskRecord, now: DateTime<Utc>) {
        let mut comment = CommentRecord {
            id: id(700),
            task: task.id,
            author: id(2),
            content: "Looks good".to_owned(),
            mentions: vec![id(1)],
            is_edited: false,
            created_at: now,
        };
        assert!(validate_comment(&comment, &task).is_valid());

        comment.author = id(3);
        assert!(!validate_comment(&comment, &task).is_valid());
    }

    #[rstest]
    fn task_notification_requires_task(now: DateTime<Utc>) {
        let notification = NotificationRecord {
            id: id(800),
            recipient: id(1),
            sender: Some(id(2)),
            kind: NotificationKind::TaskAssigned,
            title: "Assigned".to_owned(),
            message: "You were assigned".to_owned(),
            task: None,
            is_read: false,
            created_at: now,
        };
        let report = validate_notification(&notification);
        assert_eq!(report.errors().first().map(|e| e.field), Some("task"));
    }

    #[rstest]
    fn reminder_requires_channel(now: DateTime<Utc>) {
        let reminder = ReminderRecord {
            id: id(900),
            user: id(1),
            task: None,
            title: "Stand-up".to_owned(),
            remind_at: now + TimeDelta::hours(1),
            repeat: ReminderRepeat::Daily,
            channels: vec![],
            is_sent: false,
            created_at: now,
        };
        assert!(!validate_reminder(&reminder).is_valid());

        let reminder = ReminderRecord {
            channels: vec![ReminderChannel::InApp],
            ..reminder
        };
        assert!(validate_reminder(&reminder).is_valid());
    }

    #[rstest]
    #[case(FileKind::Image, "image/png", FileMetadata::Image { width: 10, height: 10 }, true)]
    #[case(FileKind::Image, "application/pdf", FileMetadata::Image { width: 10, height: 10 }, false)]
    #[case(FileKind::Document, "application/pdf", FileMetadata::Audio { duration_secs: 3 }, false)]
    #[case(FileKind::Archive, "application/zip", FileMetadata::Archive { entry_count: 4 }, true)]
    fn file_kind_must_match_mime_and_metadata(
        now: DateTime<Utc>,
        #[case] kind: FileKind,
        #[case] mime: &str,
        #[case] metadata: FileMetadata,
        #[case] expected: bool,
    ) {
        let file = FileRecord {
            id: id(1000),
            filename: "f".to_owned(),
            original_name: "f".to_owned(),
            mime_type: mime.to_owned(),
            size_bytes: 10,
            kind,
            metadata,
            uploaded_by: Some(id(1)),
            task: None,
            storage_key: "uploads/f".to_owned(),
            created_at: now,
        };
        assert_eq!(validate_file(&file).is_valid(), expected);
    }

    #[rstest]
    fn invitation_requires_admin_inviter(workspace: WorkspaceRecord, now: DateTime<Utc>) {
        let mut invitation = InvitationRecord {
            id: id(1100),
            token: "a".repeat(32),
            inviter: id(1),
            invitee_email: "guest@example.com".to_owned(),
            invitee: None,
            workspace: workspace.id,
            role: WorkspaceRole::Member,
            status: InvitationStatus::Pending,
            expires_at: now + TimeDelta::days(7),
            created_at: now,
        };
        assert!(validate_invitation(&invitation, &workspace).is_valid());

        invitation.inviter = id(2);
        let report = validate_invitation(&invitation, &workspace);
        assert_eq!(report.errors().first().map(|e| e.field), Some("inviter"));
    }

    #[rstest]
    fn template_positions_must_be_contiguous(now: DateTime<Utc>) {
        let mut template = BoardTemplateRecord {
            id: id(1200),
            name: "Kanban".to_owned(),
            description: String::new(),
            category: "general".to_owned(),
            columns: vec![
                TemplateColumn {
                    name: "To Do".to_owned(),
                    color: "#cccccc".to_owned(),
                    position: 0,
                },
                TemplateColumn {
                    name: "Done".to_owned(),
                    color: "#00aa00".to_owned(),
                    position: 1,
                },
            ],
            created_by: id(1),
            is_public: true,
            created_at: now,
        };
        assert!(validate_board_template(&template, true).is_valid());
        assert!(!validate_board_template(&template, false).is_valid());

        if let Some(last) = template.columns.last_mut() {
            last.position = 5;
        }
        assert!(!validate_board_template(&template, true).is_valid());
    }

    #[rstest]
    fn analytics_breakdown_must_sum(now: DateTime<Utc>) {
        let mut metrics = AnalyticsMetrics {
            total_tasks: 2,
            completed_tasks: 1,
            completion_rate_percent: 50,
            ..AnalyticsMetrics::default()
        };
        metrics.tasks_by_status.insert("todo".to_owned(), 1);
        metrics.tasks_by_status.insert("done".to_owned(), 1);
        let mut analytics = AnalyticsRecord {
            id: id(1300),
            scope: AnalyticsScope::System,
            scope_ref: None,
            period_start: now - TimeDelta::days(30),
            period_end: now,
            metrics,
            generated_at: now,
        };
        assert!(validate_analytics(&analytics).is_valid());

        analytics.metrics.total_tasks = 3;
        assert!(!validate_analytics(&analytics).is_valid());
    }

    #[test]
    fn report_summary_joins_errors() {
        let mut report = ValidationReport::default();
        report.error("color", "bad");
        report.error("name", "empty");
        report.warn("description", "ignored");

        assert_eq!(report.summary(), "color: bad; name: empty");
    }
}
