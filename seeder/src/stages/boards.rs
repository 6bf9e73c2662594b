//! Boards inside spaces.

use std::collections::HashSet;

use async_trait::async_trait;
use fixture_data::validation::validate_board;
use fixture_data::{
    BoardMember, BoardRecord, BoardRole, BoardType, BoardVisibility, CountRange,
    FixtureGenerator, SpaceRecord,
};
use uuid::Uuid;

use super::{as_progress, pick_id};
use crate::error::SeedError;
use crate::pipeline::{FailurePolicy, Stage, StageContext, StageOutput, StepName};

const MEMBER_ROLES: &[BoardRole] = &[
    BoardRole::Admin,
    BoardRole::Member,
    BoardRole::Member,
    BoardRole::Viewer,
];
const VISIBILITIES: &[BoardVisibility] = &[
    BoardVisibility::Private,
    BoardVisibility::Workspace,
    BoardVisibility::Workspace,
    BoardVisibility::Public,
];
const BOARD_TYPES: &[BoardType] = &[
    BoardType::Kanban,
    BoardType::Kanban,
    BoardType::List,
    BoardType::Calendar,
    BoardType::Timeline,
];

/// Seeds boards for every space, with members drawn from the space.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoardsStage;

fn build_board(
    generator: &mut FixtureGenerator,
    space: &SpaceRecord,
    member_range: CountRange,
) -> Result<Option<BoardRecord>, SeedError> {
    let space_members: Vec<Uuid> = space.member_ids().collect();
    let Some(owner) = pick_id(generator, &space_members) else {
        return Ok(None);
    };
    let extra = generator.subset_excluding(
        &space_members,
        &HashSet::from([owner]),
        member_range.min(),
        member_range.max(),
    );
    let mut members = vec![BoardMember {
        user: owner,
        role: BoardRole::Owner,
    }];
    for user in extra {
        let role = generator
            .pick(MEMBER_ROLES)
            .copied()
            .unwrap_or(BoardRole::Member);
        members.push(BoardMember { user, role });
    }

    Ok(Some(BoardRecord {
        id: generator.uuid(),
        name: generator.title(1, 3),
        description: generator.sentence(),
        space: space.id,
        workspace: space.workspace,
        owner,
        visibility: generator
            .pick(VISIBILITIES)
            .copied()
            .unwrap_or(BoardVisibility::Workspace),
        board_type: generator
            .pick(BOARD_TYPES)
            .copied()
            .unwrap_or(BoardType::Kanban),
        members,
        created_at: generator.after(space.created_at, 30)?,
    }))
}

#[async_trait]
impl Stage for BoardsStage {
    fn name(&self) -> StepName {
        StepName::Boards
    }

    fn reads(&self) -> &'static [StepName] {
        &[StepName::Workspaces]
    }

    fn policy(&self) -> FailurePolicy {
        FailurePolicy::SkipRecord
    }

    async fn seed(&self, ctx: &mut StageContext<'_>) -> Result<StageOutput, SeedError> {
        let spaces = ctx.upstream::<SpaceRecord>().await?;
        if spaces.is_empty() {
            ctx.dependency_missing(StepName::Workspaces);
            return Ok(StageOutput::empty(self.name()));
        }
        let counts = *ctx.counts();
        ctx.progress().set_expected(0);

        let mut boards = Vec::new();
        for space in &spaces {
            let wanted = ctx.generator().count(counts.boards_per_space);
            ctx.progress().add_expected(as_progress(wanted));
            for _ in 0..wanted {
                let Some(board) = build_board(ctx.generator(), space, counts.board_members)?
                else {
                    continue;
                };
                if ctx
                    .persist(&board, || validate_board(&board, space), self.policy())
                    .await?
                {
                    boards.push(board);
                }
            }
        }
        Ok(StageOutput::Boards(boards))
    }
}
