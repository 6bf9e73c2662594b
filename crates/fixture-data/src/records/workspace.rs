//! Workspace and space records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role held by a workspace member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceRole {
    /// Workspace owner; admin-equivalent.
    Owner,
    /// Administrator.
    Admin,
    /// Regular member.
    Member,
    /// Read-mostly guest.
    Guest,
}

impl WorkspaceRole {
    /// Returns `true` for roles with administrative rights.
    #[must_use]
    pub const fn is_admin_equivalent(self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }

    /// Permission names granted by the role.
    #[must_use]
    pub fn default_permissions(self) -> Vec<String> {
        let names: &[&str] = match self {
            Self::Owner => &[
                "workspace:manage",
                "workspace:invite",
                "space:create",
                "board:create",
                "task:write",
            ],
            Self::Admin => &["workspace:invite", "space:create", "board:create", "task:write"],
            Self::Member => &["board:create", "task:write"],
            Self::Guest => &["task:read"],
        };
        names.iter().map(|name| (*name).to_owned()).collect()
    }
}

/// Entry in a workspace's ordered member list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceMember {
    /// Member user.
    pub user: Uuid,
    /// Role within the workspace.
    pub role: WorkspaceRole,
    /// Granted permission names.
    pub permissions: Vec<String>,
    /// Join timestamp.
    pub joined_at: DateTime<Utc>,
}

/// A generated workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceRecord {
    /// Unique identifier.
    pub id: Uuid,
    /// Workspace name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Owning user.
    pub owner: Uuid,
    /// Ordered member list; the owner is always first.
    pub members: Vec<WorkspaceMember>,
    /// Whether the workspace is archived.
    pub is_archived: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl WorkspaceRecord {
    /// Iterates over member user identifiers in list order.
    pub fn member_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.members.iter().map(|member| member.user)
    }
}

/// Role held by a space member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpaceRole {
    /// Space administrator.
    Admin,
    /// Can create and edit boards and tasks.
    Contributor,
    /// Read-only access.
    Viewer,
}

impl SpaceRole {
    /// Permission names granted by the role.
    #[must_use]
    pub fn default_permissions(self) -> Vec<String> {
        let names: &[&str] = match self {
            Self::Admin => &["space:manage", "board:create", "task:write"],
            Self::Contributor => &["board:create", "task:write"],
            Self::Viewer => &["task:read"],
        };
        names.iter().map(|name| (*name).to_owned()).collect()
    }
}

/// Entry in a space's member list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceMember {
    /// Member user.
    pub user: Uuid,
    /// Role within the space.
    pub role: SpaceRole,
    /// Space-scoped permission names.
    pub permissions: Vec<String>,
}

/// A generated space inside a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceRecord {
    /// Unique identifier.
    pub id: Uuid,
    /// Space name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Parent workspace.
    pub workspace: Uuid,
    /// User that created the space.
    pub owner: Uuid,
    /// Hex colour used in listings.
    pub color: String,
    /// Space members drawn from the workspace members.
    pub members: Vec<SpaceMember>,
    /// Whether the space is archived.
    pub is_archived: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl SpaceRecord {
    /// Iterates over member user identifiers in list order.
    pub fn member_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.members.iter().map(|member| member.user)
    }
}
