//! Environment profile registry types and JSON parsing.
//!
//! A profile selects the RNG seed, the reference time every generated
//! timestamp is derived from, the fixed accounts that must always exist, and
//! the target count or range for every entity type. Profiles are loaded from a
//! versioned JSON registry; a built-in registry ships with the crate.

use std::collections::HashSet;

use camino::Utf8Path;
use cap_std::fs::Dir;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::ProfileError;
use crate::records::SystemRole;
use crate::validation::is_valid_email;

/// Current supported registry version.
const SUPPORTED_VERSION: u32 = 1;

/// Registry shipped with the crate.
const BUILTIN_REGISTRY_JSON: &str = include_str!("../fixtures/profiles.json");

/// A registry of named environment profiles.
///
/// # Example
///
/// ```
/// use fixture_data::ProfileRegistry;
///
/// let json = r#"{
///     "version": 1,
///     "profiles": [{
///         "name": "test",
///         "seed": 42,
///         "referenceTime": "2026-01-01T00:00:00Z",
///         "counts": {"users": 3, "tasksPerBoard": {"min": 1, "max": 4}}
///     }]
/// }"#;
///
/// let registry = ProfileRegistry::from_json(json).expect("valid registry");
/// let profile = registry.find_profile("test").expect("profile exists");
/// assert_eq!(profile.counts().users.max(), 3);
/// assert_eq!(profile.counts().tasks_per_board.min(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRegistry {
    version: u32,
    profiles: Vec<Profile>,
}

impl ProfileRegistry {
    /// Parses a profile registry from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError`] if:
    /// - The JSON is malformed
    /// - Required fields are missing
    /// - The version is unsupported
    /// - A reference time, range, or fixed user e-mail is invalid
    /// - The profiles array is empty or repeats a name
    pub fn from_json(json: &str) -> Result<Self, ProfileError> {
        let raw: RawProfileRegistry =
            serde_json::from_str(json).map_err(|e| ProfileError::ParseError {
                message: e.to_string(),
            })?;

        Self::from_raw(raw)
    }

    /// Loads a profile registry from a file inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError`] if the file cannot be read or parsed.
    pub fn from_file(dir: &Dir, path: &Utf8Path) -> Result<Self, ProfileError> {
        let contents = dir
            .read_to_string(path)
            .map_err(|e| ProfileError::IoError {
                path: path.as_std_path().to_path_buf(),
                message: e.to_string(),
            })?;

        Self::from_json(&contents)
    }

    /// Returns the registry embedded in the crate.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError`] only if the embedded fixture is corrupt.
    pub fn builtin() -> Result<Self, ProfileError> {
        Self::from_json(BUILTIN_REGISTRY_JSON)
    }

    fn from_raw(raw: RawProfileRegistry) -> Result<Self, ProfileError> {
        if raw.version != SUPPORTED_VERSION {
            return Err(ProfileError::UnsupportedVersion {
                expected: SUPPORTED_VERSION,
                actual: raw.version,
            });
        }

        if raw.profiles.is_empty() {
            return Err(ProfileError::EmptyProfiles);
        }

        let mut seen = HashSet::new();
        let mut profiles = Vec::with_capacity(raw.profiles.len());
        for raw_profile in raw.profiles {
            if !seen.insert(raw_profile.name.clone()) {
                return Err(ProfileError::DuplicateProfile {
                    name: raw_profile.name,
                });
            }
            profiles.push(Profile::from_raw(raw_profile)?);
        }

        Ok(Self {
            version: raw.version,
            profiles,
        })
    }

    /// Returns the registry version.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Returns all profiles.
    #[must_use]
    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    /// Finds a profile by name.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::ProfileNotFound`] if no profile with the given
    /// name exists.
    pub fn find_profile(&self, name: &str) -> Result<&Profile, ProfileError> {
        self.profiles
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ProfileError::ProfileNotFound {
                name: name.to_owned(),
            })
    }
}

/// A named environment profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    name: String,
    seed: u64,
    reference_time: DateTime<Utc>,
    fixed_users: Vec<FixedUser>,
    counts: ProfileCounts,
}

impl Profile {
    /// Creates a profile with no fixed users and all counts at zero.
    #[must_use]
    pub fn new(name: impl Into<String>, seed: u64, reference_time: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            seed,
            reference_time,
            fixed_users: Vec::new(),
            counts: ProfileCounts::default(),
        }
    }

    /// Replaces the target counts.
    #[must_use]
    pub fn with_counts(mut self, counts: ProfileCounts) -> Self {
        self.counts = counts;
        self
    }

    /// Replaces the fixed users.
    #[must_use]
    pub fn with_fixed_users(mut self, fixed_users: Vec<FixedUser>) -> Self {
        self.fixed_users = fixed_users;
        self
    }

    /// Overrides the RNG seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Returns the profile name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the RNG seed value.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns the instant generated timestamps are derived from.
    #[must_use]
    pub const fn reference_time(&self) -> DateTime<Utc> {
        self.reference_time
    }

    /// Returns the accounts that are always created first.
    #[must_use]
    pub fn fixed_users(&self) -> &[FixedUser] {
        &self.fixed_users
    }

    /// Returns the target counts.
    #[must_use]
    pub const fn counts(&self) -> &ProfileCounts {
        &self.counts
    }

    fn from_raw(raw: RawProfile) -> Result<Self, ProfileError> {
        let reference_time = DateTime::parse_from_rfc3339(&raw.reference_time)
            .map_err(|_| ProfileError::InvalidReferenceTime {
                profile: raw.name.clone(),
                value: raw.reference_time.clone(),
            })?
            .with_timezone(&Utc);

        for fixed in &raw.fixed_users {
            if !is_valid_email(&fixed.email) {
                return Err(ProfileError::InvalidFixedUserEmail {
                    profile: raw.name.clone(),
                    email: fixed.email.clone(),
                });
            }
        }

        let counts = ProfileCounts::from_raw(&raw.name, &raw.counts)?;
        let fixed_users = raw
            .fixed_users
            .into_iter()
            .map(|fixed| FixedUser {
                name: fixed.name,
                email: fixed.email,
                password: fixed.password,
                system_role: fixed.system_role,
            })
            .collect();

        Ok(Self {
            name: raw.name,
            seed: raw.seed,
            reference_time,
            fixed_users,
            counts,
        })
    }
}

/// An account that every run creates with exact credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedUser {
    /// Display name.
    pub name: String,
    /// Exact e-mail address.
    pub email: String,
    /// Plain-text password hashed at generation time.
    pub password: String,
    /// System role.
    pub system_role: SystemRole,
}

/// Inclusive count range; a fixed count has `min == max`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CountRange {
    min: usize,
    max: usize,
}

impl CountRange {
    /// A range that always yields `count`.
    #[must_use]
    pub const fn fixed(count: usize) -> Self {
        Self {
            min: count,
            max: count,
        }
    }

    /// A range from `min` to `max`; bounds are swapped when inverted.
    #[must_use]
    pub const fn new(min: usize, max: usize) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Lower bound.
    #[must_use]
    pub const fn min(self) -> usize {
        self.min
    }

    /// Upper bound.
    #[must_use]
    pub const fn max(self) -> usize {
        self.max
    }

    /// Returns `true` when the range can only yield zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.max == 0
    }

    /// Returns `true` when `count` lies within the bounds.
    #[must_use]
    pub const fn contains(self, count: usize) -> bool {
        count >= self.min && count <= self.max
    }
}

/// Target count or range per entity type.
///
/// Fields suffixed `per_*` are applied once per parent entity; the others are
/// run-wide totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileCounts {
    /// Users, including the fixed users.
    pub users: CountRange,
    /// Workspaces.
    pub workspaces: CountRange,
    /// Extra members per workspace besides the owner.
    pub workspace_members: CountRange,
    /// Spaces per workspace.
    pub spaces_per_workspace: CountRange,
    /// Boards per space.
    pub boards_per_space: CountRange,
    /// Extra members per board besides the owner.
    pub board_members: CountRange,
    /// Board templates taken from the catalogue.
    pub board_templates: CountRange,
    /// Tags.
    pub tags: CountRange,
    /// Tasks per board.
    pub tasks_per_board: CountRange,
    /// Comments per task.
    pub comments_per_task: CountRange,
    /// Notifications per user.
    pub notifications_per_user: CountRange,
    /// Reminders per user.
    pub reminders_per_user: CountRange,
    /// Files.
    pub files: CountRange,
    /// Invitations per workspace.
    pub invitations_per_workspace: CountRange,
    /// Analytics generation toggle; any non-zero value enables the step.
    pub analytics: CountRange,
}

impl ProfileCounts {
    fn from_raw(profile: &str, raw: &RawProfileCounts) -> Result<Self, ProfileError> {
        let range = |field: &'static str, value: RawCount| value.into_range(profile, field);
        Ok(Self {
            users: range("users", raw.users)?,
            workspaces: range("workspaces", raw.workspaces)?,
            workspace_members: range("workspaceMembers", raw.workspace_members)?,
            spaces_per_workspace: range("spacesPerWorkspace", raw.spaces_per_workspace)?,
            boards_per_space: range("boardsPerSpace", raw.boards_per_space)?,
            board_members: range("boardMembers", raw.board_members)?,
            board_templates: range("boardTemplates", raw.board_templates)?,
            tags: range("tags", raw.tags)?,
            tasks_per_board: range("tasksPerBoard", raw.tasks_per_board)?,
            comments_per_task: range("commentsPerTask", raw.comments_per_task)?,
            notifications_per_user: range("notificationsPerUser", raw.notifications_per_user)?,
            reminders_per_user: range("remindersPerUser", raw.reminders_per_user)?,
            files: range("files", raw.files)?,
            invitations_per_workspace: range(
                "invitationsPerWorkspace",
                raw.invitations_per_workspace,
            )?,
            analytics: range("analytics", raw.analytics)?,
        })
    }
}

/// Raw JSON representation for deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProfileRegistry {
    version: u32,
    profiles: Vec<RawProfile>,
}

/// Raw JSON representation of a profile.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProfile {
    name: String,
    seed: u64,
    reference_time: String,
    #[serde(default)]
    fixed_users: Vec<RawFixedUser>,
    #[serde(default)]
    counts: RawProfileCounts,
}

/// Raw JSON representation of a fixed user.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFixedUser {
    name: String,
    email: String,
    password: String,
    #[serde(default)]
    system_role: SystemRole,
}

/// Raw JSON representation of the counts block; missing entries are zero.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawProfileCounts {
    users: RawCount,
    workspaces: RawCount,
    workspace_members: RawCount,
    spaces_per_workspace: RawCount,
    boards_per_space: RawCount,
    board_members: RawCount,
    board_templates: RawCount,
    tags: RawCount,
    tasks_per_board: RawCount,
    comments_per_task: RawCount,
    notifications_per_user: RawCount,
    reminders_per_user: RawCount,
    files: RawCount,
    invitations_per_workspace: RawCount,
    analytics: RawCount,
}

/// A count written either as an integer or as a `{min, max}` object.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum RawCount {
    Fixed(usize),
    Range { min: usize, max: usize },
}

impl Default for RawCount {
    fn default() -> Self {
        Self::Fixed(0)
    }
}

impl RawCount {
    fn into_range(self, profile: &str, field: &'static str) -> Result<CountRange, ProfileError> {
        match self {
            Self::Fixed(count) => Ok(CountRange::fixed(count)),
            Self::Range { min, max } if min > max => Err(ProfileError::InvalidRange {
                profile: profile.to_owned(),
                field,
                min,
                max,
            }),
            Self::Range { min, max } => Ok(CountRange::new(min, max)),
        }
    }
}
