//! Users together with their preferences, sessions, and roles documents.

use async_trait::async_trait;
use fixture_data::catalogue::{DEVICES, LANGUAGES, TIMEZONES};
use fixture_data::validation::{
    validate_user, validate_user_preferences, validate_user_roles, validate_user_sessions,
};
use fixture_data::{
    FixedUser, FixtureGenerator, SessionEntry, SystemRole, Theme, UserPreferencesRecord,
    UserRecord, UserRolesRecord, UserSessionsRecord,
};

use super::as_progress;
use crate::error::SeedError;
use crate::models::{Entity, Model};
use crate::pipeline::{FailurePolicy, Stage, StageContext, StageOutput, StepName};
use crate::store::{DocumentStore, Filter};

const THEMES: &[Theme] = &[Theme::Light, Theme::Dark, Theme::System];
const ADMIN_PERMISSIONS: &[&str] = &["users:manage", "templates:manage", "workspaces:manage"];
const USER_PERMISSIONS: &[&str] = &["workspaces:create"];

/// Seeds accounts, fixed users first.
///
/// An account whose email is already stored is kept as it is, so seeding
/// users into a populated store does not duplicate them.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsersStage;

struct UserBundle {
    user: UserRecord,
    preferences: UserPreferencesRecord,
    sessions: UserSessionsRecord,
    roles: UserRolesRecord,
}

#[derive(Default)]
struct UsersOutput {
    users: Vec<UserRecord>,
    preferences: Vec<UserPreferencesRecord>,
    sessions: Vec<UserSessionsRecord>,
    roles: Vec<UserRolesRecord>,
}

impl From<UsersOutput> for StageOutput {
    fn from(output: UsersOutput) -> Self {
        Self::Users {
            users: output.users,
            preferences: output.preferences,
            sessions: output.sessions,
            roles: output.roles,
        }
    }
}

fn permissions(role: SystemRole) -> Vec<String> {
    let names = match role {
        SystemRole::Admin => ADMIN_PERMISSIONS,
        SystemRole::User => USER_PERMISSIONS,
    };
    names.iter().map(|name| (*name).to_owned()).collect()
}

fn build_user(
    generator: &mut FixtureGenerator,
    fixed: Option<&FixedUser>,
) -> Result<UserBundle, SeedError> {
    let (name, email, password) = match fixed {
        Some(account) => (
            account.name.clone(),
            account.email.clone(),
            account.password.clone(),
        ),
        None => {
            let generated = generator.person_name()?;
            let address = generator.unique_email(&generated)?;
            (generated, address, generator.token())
        }
    };
    let created_at = generator.past(365)?;
    let is_locked = fixed.is_none() && generator.chance(1, 20);
    let lock_until = if is_locked {
        Some(generator.future(7)?)
    } else {
        None
    };
    let system_role = match fixed {
        Some(account) => account.system_role,
        None if generator.chance(1, 10) => SystemRole::Admin,
        None => SystemRole::User,
    };

    let user = UserRecord {
        id: generator.uuid(),
        name,
        email,
        password_hash: generator.password_hash(&password),
        is_email_verified: fixed.is_some() || generator.chance(4, 5),
        is_locked,
        lock_until,
        preferences: generator.uuid(),
        sessions: generator.uuid(),
        roles: generator.uuid(),
        created_at,
    };
    let preferences = build_preferences(generator, &user);
    let sessions = build_sessions(generator, &user)?;
    let roles = UserRolesRecord {
        id: user.roles,
        user: user.id,
        system_role,
        permissions: permissions(system_role),
        created_at,
    };
    Ok(UserBundle {
        user,
        preferences,
        sessions,
        roles,
    })
}

fn build_preferences(generator: &mut FixtureGenerator, user: &UserRecord) -> UserPreferencesRecord {
    UserPreferencesRecord {
        id: user.preferences,
        user: user.id,
        theme: generator.pick(THEMES).copied().unwrap_or_default(),
        language: generator.pick(LANGUAGES).copied().unwrap_or("en").to_owned(),
        timezone: generator.pick(TIMEZONES).copied().unwrap_or("UTC").to_owned(),
        email_notifications: generator.chance(3, 4),
        push_notifications: generator.chance(1, 2),
        created_at: user.created_at,
    }
}

fn build_sessions(
    generator: &mut FixtureGenerator,
    user: &UserRecord,
) -> Result<UserSessionsRecord, SeedError> {
    let count = generator.between(1, 3);
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        entries.push(SessionEntry {
            device: generator.pick(DEVICES).copied().unwrap_or("Desktop").to_owned(),
            ip_address: generator.ipv4(),
            last_active_at: generator.past(30)?,
        });
    }
    entries.sort_by(|a, b| b.last_active_at.cmp(&a.last_active_at));
    Ok(UserSessionsRecord {
        id: user.sessions,
        user: user.id,
        sessions: entries,
        created_at: user.created_at,
    })
}

async fn create_child<T: Entity>(
    store: &dyn DocumentStore,
    record: Option<&T>,
) -> Result<(), SeedError> {
    let Some(child) = record else {
        return Ok(());
    };
    Model::<T>::new(store)
        .create(child)
        .await
        .map_err(|source| SeedError::Persistence {
            collection: T::COLLECTION,
            source,
        })
}

impl UsersStage {
    async fn persist_bundle(
        ctx: &mut StageContext<'_>,
        bundle: UserBundle,
        output: &mut UsersOutput,
    ) -> Result<(), SeedError> {
        let policy = FailurePolicy::SkipRecord;
        let UserBundle {
            user,
            preferences,
            sessions,
            roles,
        } = bundle;
        if !ctx.persist(&user, || validate_user(&user), policy).await? {
            return Ok(());
        }

        let keep_preferences =
            ctx.admit(&preferences, || validate_user_preferences(&preferences, &user), policy)?;
        let keep_sessions =
            ctx.admit(&sessions, || validate_user_sessions(&sessions, &user), policy)?;
        let keep_roles = ctx.admit(&roles, || validate_user_roles(&roles, &user), policy)?;

        let store = ctx.store();
        tokio::try_join!(
            create_child(store, keep_preferences.then_some(&preferences)),
            create_child(store, keep_sessions.then_some(&sessions)),
            create_child(store, keep_roles.then_some(&roles)),
        )?;

        output.users.push(user);
        if keep_preferences {
            output.preferences.push(preferences);
        }
        if keep_sessions {
            output.sessions.push(sessions);
        }
        if keep_roles {
            output.roles.push(roles);
        }
        Ok(())
    }
}

#[async_trait]
impl Stage for UsersStage {
    fn name(&self) -> StepName {
        StepName::Users
    }

    fn reads(&self) -> &'static [StepName] {
        &[]
    }

    fn policy(&self) -> FailurePolicy {
        FailurePolicy::SkipRecord
    }

    async fn seed(&self, ctx: &mut StageContext<'_>) -> Result<StageOutput, SeedError> {
        let counts = *ctx.counts();
        let fixed: Vec<FixedUser> = ctx.profile().fixed_users().to_vec();
        for account in &fixed {
            ctx.generator().reserve_email(&account.email);
        }
        let total = ctx.generator().count(counts.users).max(fixed.len());
        ctx.progress().set_expected(as_progress(total));

        let mut output = UsersOutput::default();
        for index in 0..total {
            let bundle = build_user(ctx.generator(), fixed.get(index))?;
            let by_email = Filter::eq("email", bundle.user.email.as_str());
            if let Some(existing) = ctx.existing::<UserRecord>(&by_email).await? {
                ctx.already_present(UserRecord::COLLECTION, &existing.email);
                output.users.push(existing);
                continue;
            }
            Self::persist_bundle(ctx, bundle, &mut output).await?;
        }
        ctx.progress().log(&format!(
            "created {} users ({} fixed)",
            output.users.len(),
            fixed.len()
        ));
        Ok(output.into())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use fixture_data::{CountRange, ProfileCounts};

    use super::super::tests::{profile, run_profile, run_with, small_counts};
    use super::*;
    use crate::store::MemoryDocumentStore;

    #[tokio::test]
    async fn fixed_users_come_first_with_exact_credentials() {
        let store = Arc::new(MemoryDocumentStore::default());
        let run = run_with(store, small_counts(), &["users"]).await;

        let users = run.results.records::<UserRecord>();
        assert_eq!(users.len(), 4);
        let first = users.first().expect("fixed user");
        assert_eq!(first.email, "admin@taskboard.test");
        assert!(first.is_email_verified);
        let roles = run.results.records::<UserRolesRecord>();
        assert!(
            roles
                .iter()
                .any(|r| r.user == first.id && r.system_role == SystemRole::Admin)
        );
    }

    #[tokio::test]
    async fn every_user_has_matching_children() {
        let store = Arc::new(MemoryDocumentStore::default());
        let run = run_with(store, small_counts(), &["users"]).await;

        for user in run.results.records::<UserRecord>() {
            assert!(
                run.results
                    .records::<UserPreferencesRecord>()
                    .iter()
                    .any(|p| p.id == user.preferences && p.user == user.id)
            );
            assert!(
                run.results
                    .records::<UserSessionsRecord>()
                    .iter()
                    .any(|s| s.id == user.sessions && !s.sessions.is_empty())
            );
        }
    }

    #[tokio::test]
    async fn fixed_users_are_created_even_when_the_count_is_lower() {
        let store = Arc::new(MemoryDocumentStore::default());
        let counts = ProfileCounts {
            users: CountRange::fixed(1),
            ..ProfileCounts::default()
        };
        let mut fixed = profile(counts).fixed_users().to_vec();
        fixed.push(FixedUser {
            name: "Regular User".to_owned(),
            email: "user@taskboard.test".to_owned(),
            password: "user-password".to_owned(),
            system_role: SystemRole::User,
        });
        let run = run_profile(store, profile(counts).with_fixed_users(fixed), &[]).await;

        let emails: Vec<&str> = run
            .results
            .records::<UserRecord>()
            .iter()
            .map(|user| user.email.as_str())
            .collect();
        assert_eq!(emails, ["admin@taskboard.test", "user@taskboard.test"]);
    }
}
