//! Shared helpers for seeder integration tests.
//!
//! Integration tests compile as separate crates under `seeder/tests/`; this
//! module keeps profile construction and pipeline wiring in one place.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use fixture_data::{CountRange, FixedUser, Profile, ProfileCounts, SystemRole};
use seeder::pipeline::{SeedPipeline, SeedPipelineBuilder};
use seeder::progress::ProgressMode;
use seeder::store::DocumentStore;

/// E-mail of the fixed administrator.
pub const ADMIN_EMAIL: &str = "admin@taskboard.test";
/// E-mail of the fixed regular user.
pub const USER_EMAIL: &str = "user@taskboard.test";
/// Fixed e-mail addresses of the scenario profile.
pub const FIXED_EMAILS: [&str; 2] = [ADMIN_EMAIL, USER_EMAIL];

/// Reference instant every scenario profile derives timestamps from.
pub fn reference_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0)
        .single()
        .expect("valid reference time")
}

fn fixed_users() -> Vec<FixedUser> {
    vec![
        FixedUser {
            name: "Admin User".to_owned(),
            email: ADMIN_EMAIL.to_owned(),
            password: "Admin123!".to_owned(),
            system_role: SystemRole::Admin,
        },
        FixedUser {
            name: "Test User".to_owned(),
            email: USER_EMAIL.to_owned(),
            password: "User123!".to_owned(),
            system_role: SystemRole::User,
        },
    ]
}

/// Five users (two fixed), one workspace, one space, one board, and exactly
/// three tasks; every other count is zero.
pub fn scenario_counts() -> ProfileCounts {
    ProfileCounts {
        users: CountRange::fixed(5),
        workspaces: CountRange::fixed(1),
        spaces_per_workspace: CountRange::fixed(1),
        boards_per_space: CountRange::fixed(1),
        tasks_per_board: CountRange::new(3, 3),
        ..ProfileCounts::default()
    }
}

/// A profile named `scenario` with the two fixed users and `counts`.
pub fn profile_with(counts: ProfileCounts) -> Profile {
    Profile::new("scenario", 42, reference_time())
        .with_counts(counts)
        .with_fixed_users(fixed_users())
}

/// Pipeline builder with hidden progress bars.
pub fn quiet_pipeline(store: Arc<dyn DocumentStore>, profile: Profile) -> SeedPipelineBuilder {
    SeedPipeline::builder(store, profile).with_progress(ProgressMode::Hidden)
}
