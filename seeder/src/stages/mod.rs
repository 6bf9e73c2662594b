//! One [`Stage`] per entity group, in dependency order.
//!
//! Each stage draws its counts from the active profile, builds candidate
//! records with the run's generator, gates them through the validator, and
//! persists the survivors. Upstream records arrive through
//! [`crate::pipeline::StageContext::upstream`]; stages never call each
//! other.

mod analytics;
mod boards;
mod comments;
mod files;
mod invitations;
mod notifications;
mod reminders;
mod tags;
mod tasks;
mod templates;
mod users;
mod workspaces;

pub use analytics::AnalyticsStage;
pub use boards::BoardsStage;
pub use comments::CommentsStage;
pub use files::FilesStage;
pub use invitations::InvitationsStage;
pub use notifications::NotificationsStage;
pub use reminders::RemindersStage;
pub use tags::TagsStage;
pub use tasks::TasksStage;
pub use templates::BoardTemplatesStage;
pub use users::UsersStage;
pub use workspaces::WorkspacesStage;

use fixture_data::FixtureGenerator;
use uuid::Uuid;

use crate::pipeline::Stage;

/// The standard stage list in topological order.
#[must_use]
pub fn default_stages() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(UsersStage),
        Box::new(WorkspacesStage),
        Box::new(BoardsStage),
        Box::new(BoardTemplatesStage),
        Box::new(TagsStage::default()),
        Box::new(TasksStage),
        Box::new(CommentsStage),
        Box::new(NotificationsStage),
        Box::new(RemindersStage),
        Box::new(FilesStage),
        Box::new(InvitationsStage),
        Box::new(AnalyticsStage),
    ]
}

/// Converts a count to the `u64` progress bars use.
fn as_progress(count: usize) -> u64 {
    u64::try_from(count).unwrap_or(u64::MAX)
}

/// Picks one identifier, or `None` for an empty slice.
fn pick_id(generator: &mut FixtureGenerator, ids: &[Uuid]) -> Option<Uuid> {
    generator.pick(ids).copied()
}

#[cfg(test)]
mod tests {
    //! Runs individual stages against an in-memory store.

    use std::sync::Arc;

    use chrono::{DateTime, TimeZone, Utc};
    use fixture_data::{CountRange, FixedUser, Profile, ProfileCounts, SystemRole};

    use crate::pipeline::{RunOptions, SeedPipeline, SeedRun};
    use crate::progress::ProgressMode;
    use crate::store::MemoryDocumentStore;

    pub(super) fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0)
            .single()
            .expect("timestamp")
    }

    pub(super) fn profile(counts: ProfileCounts) -> Profile {
        Profile::new("unit", 42, reference())
            .with_counts(counts)
            .with_fixed_users(vec![FixedUser {
                name: "Admin User".to_owned(),
                email: "admin@taskboard.test".to_owned(),
                password: "admin-password".to_owned(),
                system_role: SystemRole::Admin,
            }])
    }

    pub(super) fn small_counts() -> ProfileCounts {
        ProfileCounts {
            users: CountRange::fixed(4),
            workspaces: CountRange::fixed(1),
            workspace_members: CountRange::new(2, 3),
            spaces_per_workspace: CountRange::fixed(1),
            boards_per_space: CountRange::fixed(1),
            board_members: CountRange::new(1, 2),
            board_templates: CountRange::fixed(2),
            tags: CountRange::fixed(3),
            tasks_per_board: CountRange::fixed(3),
            comments_per_task: CountRange::new(1, 2),
            notifications_per_user: CountRange::fixed(1),
            reminders_per_user: CountRange::fixed(1),
            files: CountRange::fixed(2),
            invitations_per_workspace: CountRange::fixed(1),
            analytics: CountRange::fixed(1),
        }
    }

    pub(super) async fn run_with(
        store: Arc<MemoryDocumentStore>,
        counts: ProfileCounts,
        modules: &[&str],
    ) -> SeedRun {
        run_profile(store, profile(counts), modules).await
    }

    pub(super) async fn run_profile(
        store: Arc<MemoryDocumentStore>,
        profile: Profile,
        modules: &[&str],
    ) -> SeedRun {
        let pipeline = SeedPipeline::builder(store, profile)
            .with_progress(ProgressMode::Hidden)
            .build()
            .expect("pipeline");
        let options = RunOptions {
            modules: modules.iter().map(|m| (*m).to_owned()).collect(),
            ..RunOptions::default()
        };
        pipeline.run(&options).await.expect("run")
    }
}
