//! Aggregate metrics derived from the users, workspaces, and tasks on hand.
//!
//! Produces one system-wide record, one record per workspace, and one record
//! per user who participates in at least one task. Every record covers the
//! thirty days up to the profile reference time.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fixture_data::validation::validate_analytics;
use fixture_data::{
    AnalyticsMetrics, AnalyticsRecord, AnalyticsScope, FixtureGenerator, SpaceRecord, TaskRecord,
    TaskStatus, UserRecord, WorkspaceRecord, shift_days,
};
use uuid::Uuid;

use super::as_progress;
use crate::error::SeedError;
use crate::pipeline::{FailurePolicy, Stage, StageContext, StageOutput, StepName};

const PERIOD_DAYS: i64 = 30;

/// Seeds analytics aggregates; any invalid aggregate aborts the run.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticsStage;

fn count(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

/// Population a metrics record is computed over.
struct Population<'a> {
    tasks: Vec<&'a TaskRecord>,
    total_users: u64,
    total_workspaces: u64,
}

fn metrics(scope: &Population<'_>, now: DateTime<Utc>) -> AnalyticsMetrics {
    let mut tasks_by_status = BTreeMap::new();
    let mut tasks_by_priority = BTreeMap::new();
    let mut active: HashSet<Uuid> = HashSet::new();
    let mut completed: u64 = 0;
    let mut overdue: u64 = 0;
    for task in &scope.tasks {
        let by_status: &mut u64 = tasks_by_status
            .entry(task.status.as_str().to_owned())
            .or_default();
        *by_status = by_status.saturating_add(1);
        let by_priority: &mut u64 = tasks_by_priority
            .entry(task.priority.as_str().to_owned())
            .or_default();
        *by_priority = by_priority.saturating_add(1);
        active.extend(task.participants());
        if task.status == TaskStatus::Done {
            completed = completed.saturating_add(1);
        } else if task.due_date.is_some_and(|due| due < now) {
            overdue = overdue.saturating_add(1);
        }
    }
    let total_tasks = count(scope.tasks.len());
    AnalyticsMetrics {
        total_tasks,
        completed_tasks: completed,
        overdue_tasks: overdue,
        tasks_by_status,
        tasks_by_priority,
        active_users: count(active.len()),
        total_users: scope.total_users,
        total_workspaces: scope.total_workspaces,
        completion_rate_percent: completed
            .saturating_mul(100)
            .checked_div(total_tasks)
            .unwrap_or(0),
    }
}

struct Inputs {
    users: Vec<UserRecord>,
    workspaces: Vec<WorkspaceRecord>,
    spaces: Vec<SpaceRecord>,
    tasks: Vec<TaskRecord>,
}

impl Inputs {
    fn system(&self) -> (Option<Uuid>, Population<'_>) {
        let scope = Population {
            tasks: self.tasks.iter().collect(),
            total_users: count(self.users.len()),
            total_workspaces: count(self.workspaces.len()),
        };
        (None, scope)
    }

    fn per_workspace(&self) -> Vec<(Option<Uuid>, Population<'_>)> {
        self.workspaces
            .iter()
            .map(|workspace| {
                let spaces: HashSet<Uuid> = self
                    .spaces
                    .iter()
                    .filter(|space| space.workspace == workspace.id)
                    .map(|space| space.id)
                    .collect();
                let scope = Population {
                    tasks: self
                        .tasks
                        .iter()
                        .filter(|task| spaces.contains(&task.space))
                        .collect(),
                    total_users: count(workspace.members.len()),
                    total_workspaces: 1,
                };
                (Some(workspace.id), scope)
            })
            .collect()
    }

    fn per_user(&self) -> Vec<(Option<Uuid>, Population<'_>)> {
        self.users
            .iter()
            .filter_map(|user| {
                let tasks: Vec<&TaskRecord> = self
                    .tasks
                    .iter()
                    .filter(|task| task.participants().any(|id| id == user.id))
                    .collect();
                if tasks.is_empty() {
                    return None;
                }
                let total_workspaces = self
                    .workspaces
                    .iter()
                    .filter(|workspace| workspace.member_ids().any(|id| id == user.id))
                    .count();
                let scope = Population {
                    tasks,
                    total_users: 1,
                    total_workspaces: count(total_workspaces),
                };
                Some((Some(user.id), scope))
            })
            .collect()
    }
}

fn build_record(
    generator: &mut FixtureGenerator,
    scope: AnalyticsScope,
    scope_ref: Option<Uuid>,
    population: &Population<'_>,
) -> Result<AnalyticsRecord, SeedError> {
    let period_end = generator.reference_time();
    Ok(AnalyticsRecord {
        id: generator.uuid(),
        scope,
        scope_ref,
        period_start: shift_days(period_end, PERIOD_DAYS.saturating_neg())?,
        period_end,
        metrics: metrics(population, period_end),
        generated_at: period_end,
    })
}

#[async_trait]
impl Stage for AnalyticsStage {
    fn name(&self) -> StepName {
        StepName::Analytics
    }

    fn reads(&self) -> &'static [StepName] {
        &[StepName::Users, StepName::Workspaces, StepName::Tasks]
    }

    fn policy(&self) -> FailurePolicy {
        FailurePolicy::Abort
    }

    async fn seed(&self, ctx: &mut StageContext<'_>) -> Result<StageOutput, SeedError> {
        let users = ctx.upstream::<UserRecord>().await?;
        if users.is_empty() {
            ctx.dependency_missing(StepName::Users);
            return Ok(StageOutput::empty(self.name()));
        }
        let inputs = Inputs {
            users,
            workspaces: ctx.upstream::<WorkspaceRecord>().await?,
            spaces: ctx.upstream::<SpaceRecord>().await?,
            tasks: ctx.upstream::<TaskRecord>().await?,
        };

        let mut planned = vec![(AnalyticsScope::System, inputs.system())];
        planned.extend(
            inputs
                .per_workspace()
                .into_iter()
                .map(|entry| (AnalyticsScope::Workspace, entry)),
        );
        planned.extend(
            inputs
                .per_user()
                .into_iter()
                .map(|entry| (AnalyticsScope::User, entry)),
        );
        ctx.progress().set_expected(as_progress(planned.len()));

        let mut records = Vec::with_capacity(planned.len());
        for (scope, (scope_ref, population)) in &planned {
            let record = build_record(ctx.generator(), *scope, *scope_ref, population)?;
            ctx.persist(&record, || validate_analytics(&record), self.policy())
                .await?;
            records.push(record);
        }
        Ok(StageOutput::Analytics(records))
    }
}
