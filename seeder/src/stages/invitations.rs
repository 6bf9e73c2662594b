//! Workspace invitations sent by workspace administrators.

use std::collections::HashSet;

use async_trait::async_trait;
use fixture_data::validation::validate_invitation;
use fixture_data::{
    FixtureGenerator, InvitationRecord, InvitationStatus, UserRecord, WorkspaceRecord,
    WorkspaceRole, shift_days,
};
use uuid::Uuid;

use super::{as_progress, pick_id};
use crate::error::SeedError;
use crate::pipeline::{FailurePolicy, Stage, StageContext, StageOutput, StepName};

/// Days an invitation stays valid.
const INVITATION_TTL_DAYS: i64 = 7;

const STATUSES: &[InvitationStatus] = &[
    InvitationStatus::Pending,
    InvitationStatus::Pending,
    InvitationStatus::Accepted,
    InvitationStatus::Declined,
    InvitationStatus::Expired,
];
const ROLES: &[WorkspaceRole] = &[
    WorkspaceRole::Admin,
    WorkspaceRole::Member,
    WorkspaceRole::Member,
    WorkspaceRole::Guest,
];

/// Seeds invitations for every workspace.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvitationsStage;

/// Picks the invitee: an existing non-member for accepted invitations,
/// otherwise a fresh address.
fn invitee(
    generator: &mut FixtureGenerator,
    status: InvitationStatus,
    workspace: &WorkspaceRecord,
    users: &[UserRecord],
) -> Result<(String, Option<Uuid>), SeedError> {
    if status == InvitationStatus::Accepted {
        let members: HashSet<Uuid> = workspace.member_ids().collect();
        let outsiders: Vec<Uuid> = users
            .iter()
            .map(|user| user.id)
            .filter(|id| !members.contains(id))
            .collect();
        let existing = pick_id(generator, &outsiders)
            .and_then(|id| users.iter().find(|user| user.id == id));
        if let Some(user) = existing {
            return Ok((user.email.clone(), Some(user.id)));
        }
    }
    let name = generator.person_name()?;
    Ok((generator.unique_email(&name)?, None))
}

fn build_invitation(
    generator: &mut FixtureGenerator,
    workspace: &WorkspaceRecord,
    users: &[UserRecord],
) -> Result<Option<InvitationRecord>, SeedError> {
    let admins: Vec<Uuid> = workspace
        .members
        .iter()
        .filter(|member| member.role.is_admin_equivalent())
        .map(|member| member.user)
        .collect();
    let Some(inviter) = pick_id(generator, &admins) else {
        return Ok(None);
    };
    let status = generator
        .pick(STATUSES)
        .copied()
        .unwrap_or(InvitationStatus::Pending);
    let (invitee_email, invitee_id) = invitee(generator, status, workspace, users)?;
    let created_at = generator.after(workspace.created_at, 30)?;
    Ok(Some(InvitationRecord {
        id: generator.uuid(),
        token: generator.token(),
        inviter,
        invitee_email,
        invitee: invitee_id,
        workspace: workspace.id,
        role: generator
            .pick(ROLES)
            .copied()
            .unwrap_or(WorkspaceRole::Member),
        status,
        expires_at: shift_days(created_at, INVITATION_TTL_DAYS)?,
        created_at,
    }))
}

#[async_trait]
impl Stage for InvitationsStage {
    fn name(&self) -> StepName {
        StepName::Invitations
    }

    fn reads(&self) -> &'static [StepName] {
        &[StepName::Users, StepName::Workspaces]
    }

    fn policy(&self) -> FailurePolicy {
        FailurePolicy::SkipRecord
    }

    async fn seed(&self, ctx: &mut StageContext<'_>) -> Result<StageOutput, SeedError> {
        let workspaces = ctx.upstream::<WorkspaceRecord>().await?;
        if workspaces.is_empty() {
            ctx.dependency_missing(StepName::Workspaces);
            return Ok(StageOutput::empty(self.name()));
        }
        let users = ctx.upstream::<UserRecord>().await?;
        let counts = *ctx.counts();
        ctx.progress().set_expected(0);

        let mut invitations = Vec::new();
        for workspace in &workspaces {
            let wanted = ctx.generator().count(counts.invitations_per_workspace);
            ctx.progress().add_expected(as_progress(wanted));
            for _ in 0..wanted {
                let Some(invitation) = build_invitation(ctx.generator(), workspace, &users)?
                else {
                    continue;
                };
                if ctx
                    .persist(
                        &invitation,
                        || validate_invitation(&invitation, workspace),
                        self.policy(),
                    )
                    .await?
                {
                    invitations.push(invitation);
                }
            }
        }
        Ok(StageOutput::Invitations(invitations))
    }
}
