//! Per-user reminders, optionally tied to a task.

use async_trait::async_trait;
use fixture_data::validation::validate_reminder;
use fixture_data::{
    FixtureGenerator, ReminderChannel, ReminderRecord, ReminderRepeat, TaskRecord, UserRecord,
};
use uuid::Uuid;

use super::as_progress;
use crate::error::SeedError;
use crate::pipeline::{FailurePolicy, Stage, StageContext, StageOutput, StepName};

const REPEATS: &[ReminderRepeat] = &[
    ReminderRepeat::None,
    ReminderRepeat::None,
    ReminderRepeat::Daily,
    ReminderRepeat::Weekly,
    ReminderRepeat::Monthly,
];

/// Seeds reminders for every user.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemindersStage;

fn channels(generator: &mut FixtureGenerator) -> Vec<ReminderChannel> {
    let mut picked = vec![ReminderChannel::InApp];
    if generator.chance(1, 2) {
        picked.push(ReminderChannel::Email);
    }
    if generator.chance(1, 3) {
        picked.push(ReminderChannel::Push);
    }
    picked
}

fn build_reminder(
    generator: &mut FixtureGenerator,
    user: Uuid,
    tasks: &[TaskRecord],
) -> Result<ReminderRecord, SeedError> {
    let task = if generator.chance(2, 3) {
        generator.pick(tasks)
    } else {
        None
    };
    let title = task.map_or_else(
        || generator.title(2, 5),
        |t| format!("Follow up: {}", t.title),
    );
    Ok(ReminderRecord {
        id: generator.uuid(),
        user,
        task: task.map(|t| t.id),
        title,
        remind_at: generator.future(14)?,
        repeat: generator
            .pick(REPEATS)
            .copied()
            .unwrap_or(ReminderRepeat::None),
        channels: channels(generator),
        is_sent: false,
        created_at: generator.past(7)?,
    })
}

#[async_trait]
impl Stage for RemindersStage {
    fn name(&self) -> StepName {
        StepName::Reminders
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
        let counts = *ctx.counts();
        ctx.progress().set_expected(0);

        let mut reminders = Vec::new();
        for user in &users {
            let wanted = ctx.generator().count(counts.reminders_per_user);
            ctx.progress().add_expected(as_progress(wanted));
            for _ in 0..wanted {
                let reminder = build_reminder(ctx.generator(), user.id, &tasks)?;
                if ctx
                    .persist(&reminder, || validate_reminder(&reminder), self.policy())
                    .await?
                {
                    reminders.push(reminder);
                }
            }
        }
        Ok(StageOutput::Reminders(reminders))
    }
}
