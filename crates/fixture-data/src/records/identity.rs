//! User identity records and the documents created alongside each user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// System-wide role attached to a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemRole {
    /// Privileged operator able to manage templates and workspaces.
    Admin,
    /// Regular account.
    #[default]
    User,
}

/// Interface theme preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light theme.
    Light,
    /// Dark theme.
    Dark,
    /// Follow the operating system.
    #[default]
    System,
}

/// A generated user account.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use fixture_data::UserRecord;
/// use uuid::Uuid;
///
/// let created_at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().expect("timestamp");
/// let user = UserRecord {
///     id: Uuid::nil(),
///     name: "Ada Lovelace".to_owned(),
///     email: "ada.lovelace@example.com".to_owned(),
///     password_hash: "sha256$salt$digest".to_owned(),
///     is_email_verified: true,
///     is_locked: false,
///     lock_until: None,
///     preferences: Uuid::nil(),
///     sessions: Uuid::nil(),
///     roles: Uuid::nil(),
///     created_at,
/// };
///
/// assert_eq!(user.email, "ada.lovelace@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Unique identifier.
    pub id: Uuid,
    /// Human-readable display name.
    pub name: String,
    /// Unique e-mail address.
    pub email: String,
    /// Salted credential digest.
    pub password_hash: String,
    /// Whether the e-mail address has been verified.
    pub is_email_verified: bool,
    /// Whether the account is locked.
    pub is_locked: bool,
    /// End of the lock window when locked.
    pub lock_until: Option<DateTime<Utc>>,
    /// Identifier of the user's preferences document.
    pub preferences: Uuid,
    /// Identifier of the user's sessions document.
    pub sessions: Uuid,
    /// Identifier of the user's roles document.
    pub roles: Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Preferences document owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferencesRecord {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning user.
    pub user: Uuid,
    /// Interface theme.
    pub theme: Theme,
    /// BCP 47 language tag.
    pub language: String,
    /// IANA time zone name.
    pub timezone: String,
    /// Receive e-mail notifications.
    pub email_notifications: bool,
    /// Receive push notifications.
    pub push_notifications: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// One remembered login session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEntry {
    /// Device description.
    pub device: String,
    /// Client IP address.
    pub ip_address: String,
    /// Last activity timestamp.
    pub last_active_at: DateTime<Utc>,
}

/// Sessions document owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSessionsRecord {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning user.
    pub user: Uuid,
    /// Remembered sessions, most recent first.
    pub sessions: Vec<SessionEntry>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Roles document owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRolesRecord {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning user.
    pub user: Uuid,
    /// System-wide role.
    pub system_role: SystemRole,
    /// Granted permission names.
    pub permissions: Vec<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
