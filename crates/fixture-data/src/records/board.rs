//! Board, column, and board template records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who can see a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardVisibility {
    /// Board members only.
    Private,
    /// Every workspace member.
    Workspace,
    /// Anyone with the link.
    Public,
}

/// Board presentation style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardType {
    /// Column-based board.
    Kanban,
    /// Flat list.
    List,
    /// Calendar view.
    Calendar,
    /// Timeline view.
    Timeline,
}

/// Role held by a board member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardRole {
    /// Board owner.
    Owner,
    /// Board administrator.
    Admin,
    /// Regular member.
    Member,
    /// Read-only member.
    Viewer,
}

/// Entry in a board's member list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardMember {
    /// Member user.
    pub user: Uuid,
    /// Role on the board.
    pub role: BoardRole,
}

/// A generated board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardRecord {
    /// Unique identifier.
    pub id: Uuid,
    /// Board name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Parent space.
    pub space: Uuid,
    /// Workspace owning the parent space.
    pub workspace: Uuid,
    /// Owning user.
    pub owner: Uuid,
    /// Visibility mode.
    pub visibility: BoardVisibility,
    /// Presentation style.
    pub board_type: BoardType,
    /// Board members drawn from the space members; the owner is first.
    pub members: Vec<BoardMember>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl BoardRecord {
    /// Iterates over member user identifiers in list order.
    pub fn member_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.members.iter().map(|member| member.user)
    }
}

/// A workflow column on a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnRecord {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning board.
    pub board: Uuid,
    /// Column title.
    pub name: String,
    /// Zero-based position from the left.
    pub position: u32,
    /// Hex colour.
    pub color: String,
    /// Optional work-in-progress limit.
    pub wip_limit: Option<u32>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Column layout entry in a board template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateColumn {
    /// Column title.
    pub name: String,
    /// Hex colour.
    pub color: String,
    /// Zero-based position.
    pub position: u32,
}

/// A reusable board layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardTemplateRecord {
    /// Unique identifier.
    pub id: Uuid,
    /// Template name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Catalogue category.
    pub category: String,
    /// Column layout.
    pub columns: Vec<TemplateColumn>,
    /// Privileged user that published the template.
    pub created_by: Uuid,
    /// Whether every workspace may use the template.
    pub is_public: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
