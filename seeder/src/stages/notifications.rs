//! Per-user notifications.

use std::collections::HashSet;

use async_trait::async_trait;
use fixture_data::validation::validate_notification;
use fixture_data::{FixtureGenerator, NotificationKind, NotificationRecord, TaskRecord, UserRecord};
use uuid::Uuid;

use super::as_progress;
use crate::error::SeedError;
use crate::pipeline::{FailurePolicy, Stage, StageContext, StageOutput, StepName};

const ALL_KINDS: &[NotificationKind] = &[
    NotificationKind::TaskAssigned,
    NotificationKind::CommentAdded,
    NotificationKind::Mention,
    NotificationKind::DueSoon,
    NotificationKind::WorkspaceInvite,
    NotificationKind::System,
];
const UNRELATED_KINDS: &[NotificationKind] =
    &[NotificationKind::WorkspaceInvite, NotificationKind::System];

/// Seeds notifications for every user.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationsStage;

const fn headline(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::TaskAssigned => "You were assigned a task",
        NotificationKind::CommentAdded => "New comment on your task",
        NotificationKind::Mention => "You were mentioned",
        NotificationKind::DueSoon => "A task is due soon",
        NotificationKind::WorkspaceInvite => "You were invited to a workspace",
        NotificationKind::System => "System announcement",
    }
}

struct Audience<'a> {
    user_ids: &'a [Uuid],
    tasks: &'a [TaskRecord],
}

/// A task `recipient` takes part in, or any task when they take part in none.
fn related_task<'a>(
    generator: &mut FixtureGenerator,
    recipient: Uuid,
    tasks: &'a [TaskRecord],
) -> Option<&'a TaskRecord> {
    let involved: Vec<&TaskRecord> = tasks
        .iter()
        .filter(|task| task.participants().any(|id| id == recipient))
        .collect();
    if involved.is_empty() {
        generator.pick(tasks)
    } else {
        generator.pick(&involved).copied()
    }
}

fn build_notification(
    generator: &mut FixtureGenerator,
    recipient: Uuid,
    audience: &Audience<'_>,
) -> Result<NotificationRecord, SeedError> {
    let kinds = if audience.tasks.is_empty() {
        UNRELATED_KINDS
    } else {
        ALL_KINDS
    };
    let kind = generator
        .pick(kinds)
        .copied()
        .unwrap_or(NotificationKind::System);
    let task = if kind.is_task_related() {
        related_task(generator, recipient, audience.tasks)
    } else {
        None
    };
    let sender = match kind {
        NotificationKind::System => None,
        _ => generator.pick_excluding(audience.user_ids, &HashSet::from([recipient])),
    };
    let message = task.map_or_else(|| generator.sentence(), |t| t.title.clone());
    Ok(NotificationRecord {
        id: generator.uuid(),
        recipient,
        sender,
        kind,
        title: headline(kind).to_owned(),
        message,
        task: task.map(|t| t.id),
        is_read: generator.chance(1, 2),
        created_at: generator.past(30)?,
    })
}

#[async_trait]
impl Stage for NotificationsStage {
    fn name(&self) -> StepName {
        StepName::Notifications
    }

    fn reads(&self) -> &'static [StepName] {
        &[StepName::Users, StepName::Tasks]
    }

    fn policy(&self) -> FailurePolicy {
        FailurePolicy::SkipRecord
    }

    async fn seed(&self, ctx: &mut StageContext<'_>) -> Result<StageOutput, SeedError> {
        let users = ctx.upstream::<UserRecord>().await?;
        if users.is_empty() {
            ctx.dependency_missing(StepName::Users);
            return Ok(StageOutput::empty(self.name()));
        }
        let tasks = ctx.upstream::<TaskRecord>().await?;
        let user_ids: Vec<Uuid> = users.iter().map(|user| user.id).collect();
        let audience = Audience {
            user_ids: &user_ids,
            tasks: &tasks,
        };
        let counts = *ctx.counts();
        ctx.progress().set_expected(0);

        let mut notifications = Vec::new();
        for recipient in &user_ids {
            let wanted = ctx.generator().count(counts.notifications_per_user);
            ctx.progress().add_expected(as_progress(wanted));
            for _ in 0..wanted {
                let notification = build_notification(ctx.generator(), *recipient, &audience)?;
                if ctx
                    .persist(
                        &notification,
                        || validate_notification(&notification),
                        self.policy(),
                    )
                    .await?
                {
                    notifications.push(notification);
                }
            }
        }
        Ok(StageOutput::Notifications(notifications))
    }
}
