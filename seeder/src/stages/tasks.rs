//! Tasks on every board, creating the default columns a board lacks.

use std::collections::HashSet;

use async_trait::async_trait;
use fixture_data::catalogue::DEFAULT_COLUMNS;
use fixture_data::validation::{validate_column, validate_task};
use fixture_data::{
    BoardRecord, ColumnRecord, FixtureGenerator, TagRecord, TagScope, TaskPriority, TaskRecord,
    TaskStatus,
};
use uuid::Uuid;

use super::{as_progress, pick_id};
use crate::error::SeedError;
use crate::pipeline::{FailurePolicy, Stage, StageContext, StageOutput, StepName};
use crate::store::Filter;

const PRIORITIES: &[TaskPriority] = &[
    TaskPriority::Low,
    TaskPriority::Medium,
    TaskPriority::Medium,
    TaskPriority::High,
    TaskPriority::Critical,
];
const MAX_ASSIGNEES: usize = 2;
const MAX_WATCHERS: usize = 2;
const MAX_TAGS: usize = 3;

/// Seeds tasks; column creation for bare boards always aborts on failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct TasksStage;

/// Whether `tag` may be applied to tasks on `board`.
fn applies_to(tag: &TagRecord, board: &BoardRecord) -> bool {
    match tag.scope {
        TagScope::Global => true,
        TagScope::Workspace => tag.scope_ref == Some(board.workspace),
        TagScope::Space => tag.scope_ref == Some(board.space),
        TagScope::Board => tag.scope_ref == Some(board.id),
    }
}

fn build_column(
    generator: &mut FixtureGenerator,
    board: &BoardRecord,
    position: u32,
    name: &str,
    color: &str,
) -> ColumnRecord {
    let in_flight = position > 0 && position.saturating_add(1) < column_count();
    ColumnRecord {
        id: generator.uuid(),
        board: board.id,
        name: name.to_owned(),
        position,
        color: color.to_owned(),
        wip_limit: in_flight.then(|| generator.between_u32(3, 8)),
        created_at: board.created_at,
    }
}

fn column_count() -> u32 {
    u32::try_from(DEFAULT_COLUMNS.len()).unwrap_or(u32::MAX)
}

fn build_task(
    generator: &mut FixtureGenerator,
    board: &BoardRecord,
    columns: &[ColumnRecord],
    tag_ids: &[Uuid],
    position: u32,
) -> Result<Option<TaskRecord>, SeedError> {
    let member_ids: Vec<Uuid> = board.member_ids().collect();
    let (Some(column), Some(reporter)) = (generator.pick(columns), pick_id(generator, &member_ids))
    else {
        return Ok(None);
    };
    let total_columns = u32::try_from(columns.len()).unwrap_or(u32::MAX);
    let assignees = generator.subset_excluding(&member_ids, &HashSet::new(), 0, MAX_ASSIGNEES);
    let watchers = generator.subset_excluding(
        &member_ids,
        &assignees.iter().copied().collect(),
        0,
        MAX_WATCHERS,
    );
    let created_at = generator.after(board.created_at, 30)?;
    let due_date = if generator.chance(2, 3) {
        Some(generator.after(created_at, 45)?)
    } else {
        None
    };

    Ok(Some(TaskRecord {
        id: generator.uuid(),
        title: generator.title(3, 7),
        description: generator.paragraph(),
        board: board.id,
        space: board.space,
        column: column.id,
        status: TaskStatus::for_column(column.position, total_columns),
        priority: generator
            .pick(PRIORITIES)
            .copied()
            .unwrap_or(TaskPriority::Medium),
        reporter,
        assignees,
        watchers,
        tags: generator.subset_excluding(tag_ids, &HashSet::new(), 0, MAX_TAGS),
        due_date,
        estimate_minutes: generator
            .chance(1, 2)
            .then(|| generator.between_u32(1, 16).saturating_mul(30)),
        position,
        created_at,
    }))
}

impl TasksStage {
    /// Columns of `board`, creating the default set when it has none.
    async fn columns_for(
        ctx: &mut StageContext<'_>,
        board: &BoardRecord,
        created: &mut Vec<ColumnRecord>,
    ) -> Result<Vec<ColumnRecord>, SeedError> {
        let mut existing = ctx
            .upstream_matching::<ColumnRecord>(&Filter::eq("board", board.id.to_string()))
            .await?;
        if !existing.is_empty() {
            existing.sort_by_key(|column| column.position);
            return Ok(existing);
        }

        ctx.progress()
            .add_expected(as_progress(DEFAULT_COLUMNS.len()));
        let mut columns = Vec::with_capacity(DEFAULT_COLUMNS.len());
        for (spec, position) in DEFAULT_COLUMNS.iter().zip(0_u32..) {
            let column = build_column(ctx.generator(), board, position, spec.name, spec.color);
            ctx.persist(
                &column,
                || validate_column(&column, board),
                FailurePolicy::Abort,
            )
            .await?;
            columns.push(column);
        }
        created.extend(columns.iter().cloned());
        Ok(columns)
    }

    async fn seed_board(
        &self,
        ctx: &mut StageContext<'_>,
        board: &BoardRecord,
        tags: &[TagRecord],
        created_columns: &mut Vec<ColumnRecord>,
    ) -> Result<Vec<TaskRecord>, SeedError> {
        let columns = Self::columns_for(ctx, board, created_columns).await?;
        let tag_ids: Vec<Uuid> = tags
            .iter()
            .filter(|tag| applies_to(tag, board))
            .map(|tag| tag.id)
            .collect();

        let counts = *ctx.counts();
        let wanted = ctx.generator().count(counts.tasks_per_board);
        ctx.progress().add_expected(as_progress(wanted));
        let mut tasks = Vec::with_capacity(wanted);
        for position in (0_u32..).take(wanted) {
            let Some(task) = build_task(ctx.generator(), board, &columns, &tag_ids, position)?
            else {
                continue;
            };
            let Some(column) = columns.iter().find(|column| column.id == task.column) else {
                continue;
            };
            if ctx
                .persist(&task, || validate_task(&task, board, column), self.policy())
                .await?
            {
                tasks.push(task);
            }
        }
        Ok(tasks)
    }
}

#[async_trait]
impl Stage for TasksStage {
    fn name(&self) -> StepName {
        StepName::Tasks
    }

    fn reads(&self) -> &'static [StepName] {
        &[StepName::Boards, StepName::Tags]
    }

    fn policy(&self) -> FailurePolicy {
        FailurePolicy::SkipRecord
    }

    async fn seed(&self, ctx: &mut StageContext<'_>) -> Result<StageOutput, SeedError> {
        let boards = ctx.upstream::<BoardRecord>().await?;
        if boards.is_empty() {
            ctx.dependency_missing(StepName::Boards);
            return Ok(StageOutput::empty(self.name()));
        }
        let tags = ctx.upstream::<TagRecord>().await?;
        ctx.progress().set_expected(0);

        let mut columns = Vec::new();
        let mut tasks = Vec::new();
        for board in &boards {
            let seeded = self.seed_board(ctx, board, &tags, &mut columns).await?;
            tasks.extend(seeded);
        }
        ctx.progress().log(&format!(
            "created {} tasks across {} boards",
            tasks.len(),
            boards.len()
        ));
        Ok(StageOutput::Tasks { columns, tasks })
    }
}
