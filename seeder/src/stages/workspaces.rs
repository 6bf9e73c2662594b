//! Workspaces and the spaces inside them.

use std::collections::HashSet;

use async_trait::async_trait;
use fixture_data::catalogue::SPACE_NAMES;
use fixture_data::validation::{validate_space, validate_workspace};
use fixture_data::{
    FixtureGenerator, ProfileCounts, SpaceMember, SpaceRecord, SpaceRole, UserRecord,
    WorkspaceMember, WorkspaceRecord, WorkspaceRole,
};
use uuid::Uuid;

use super::{as_progress, pick_id};
use crate::error::SeedError;
use crate::pipeline::{FailurePolicy, Stage, StageContext, StageOutput, StepName};

const MEMBER_ROLES: &[WorkspaceRole] = &[
    WorkspaceRole::Admin,
    WorkspaceRole::Member,
    WorkspaceRole::Member,
    WorkspaceRole::Guest,
];
const SPACE_MEMBER_ROLES: &[SpaceRole] = &[SpaceRole::Contributor, SpaceRole::Viewer];

/// Seeds workspaces owned by existing users, each with its spaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkspacesStage;

fn build_workspace(
    generator: &mut FixtureGenerator,
    user_ids: &[Uuid],
    counts: &ProfileCounts,
) -> Result<Option<WorkspaceRecord>, SeedError> {
    let Some(owner) = pick_id(generator, user_ids) else {
        return Ok(None);
    };
    let created_at = generator.past(180)?;
    let extra = generator.subset_excluding(
        user_ids,
        &HashSet::from([owner]),
        counts.workspace_members.min(),
        counts.workspace_members.max(),
    );

    let mut members = vec![WorkspaceMember {
        user: owner,
        role: WorkspaceRole::Owner,
        permissions: WorkspaceRole::Owner.default_permissions(),
        joined_at: created_at,
    }];
    for user in extra {
        let role = generator
            .pick(MEMBER_ROLES)
            .copied()
            .unwrap_or(WorkspaceRole::Member);
        members.push(WorkspaceMember {
            user,
            role,
            permissions: role.default_permissions(),
            joined_at: generator.after(created_at, 30)?,
        });
    }

    Ok(Some(WorkspaceRecord {
        id: generator.uuid(),
        name: generator.company_name(),
        description: generator.catch_phrase(),
        owner,
        members,
        is_archived: generator.chance(1, 20),
        created_at,
    }))
}

fn build_space(
    generator: &mut FixtureGenerator,
    workspace: &WorkspaceRecord,
) -> Result<Option<SpaceRecord>, SeedError> {
    let member_ids: Vec<Uuid> = workspace.member_ids().collect();
    let Some(owner) = pick_id(generator, &member_ids) else {
        return Ok(None);
    };
    let others = generator.subset_excluding(
        &member_ids,
        &HashSet::from([owner]),
        0,
        member_ids.len(),
    );

    let mut members = vec![SpaceMember {
        user: owner,
        role: SpaceRole::Admin,
        permissions: SpaceRole::Admin.default_permissions(),
    }];
    for user in others {
        let role = generator
            .pick(SPACE_MEMBER_ROLES)
            .copied()
            .unwrap_or(SpaceRole::Viewer);
        members.push(SpaceMember {
            user,
            role,
            permissions: role.default_permissions(),
        });
    }

    let name = match generator.pick(SPACE_NAMES) {
        Some(base) => (*base).to_owned(),
        None => generator.title(1, 2),
    };
    Ok(Some(SpaceRecord {
        id: generator.uuid(),
        name,
        description: generator.sentence(),
        workspace: workspace.id,
        owner,
        color: generator.hex_color(),
        members,
        is_archived: false,
        created_at: generator.after(workspace.created_at, 14)?,
    }))
}

impl WorkspacesStage {
    async fn seed_spaces(
        ctx: &mut StageContext<'_>,
        workspace: &WorkspaceRecord,
        spaces: &mut Vec<SpaceRecord>,
    ) -> Result<(), SeedError> {
        let counts = *ctx.counts();
        let wanted = ctx.generator().count(counts.spaces_per_workspace);
        ctx.progress().add_expected(as_progress(wanted));
        for _ in 0..wanted {
            let Some(space) = build_space(ctx.generator(), workspace)? else {
                continue;
            };
            let policy = FailurePolicy::SkipRecord;
            if ctx
                .persist(&space, || validate_space(&space, workspace), policy)
                .await?
            {
                spaces.push(space);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Stage for WorkspacesStage {
    fn name(&self) -> StepName {
        StepName::Workspaces
    }

    fn reads(&self) -> &'static [StepName] {
        &[StepName::Users]
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
        let user_ids: Vec<Uuid> = users.iter().map(|user| user.id).collect();

        let counts = *ctx.counts();
        let wanted = ctx.generator().count(counts.workspaces);
        ctx.progress().set_expected(as_progress(wanted));

        let mut workspaces = Vec::with_capacity(wanted);
        let mut spaces = Vec::new();
        for _ in 0..wanted {
            let Some(workspace) = build_workspace(ctx.generator(), &user_ids, &counts)? else {
                continue;
            };
            if !ctx
                .persist(&workspace, || validate_workspace(&workspace), self.policy())
                .await?
            {
                continue;
            }
            Self::seed_spaces(ctx, &workspace, &mut spaces).await?;
            workspaces.push(workspace);
        }
        Ok(StageOutput::Workspaces { workspaces, spaces })
    }
}
