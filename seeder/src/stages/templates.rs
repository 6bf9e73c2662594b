//! The board template catalogue.

use async_trait::async_trait;
use fixture_data::catalogue::{BOARD_TEMPLATES, TemplateSpec};
use fixture_data::validation::validate_board_template;
use fixture_data::{
    BoardTemplateRecord, FixtureGenerator, SystemRole, TemplateColumn, UserRolesRecord,
};
use uuid::Uuid;

use super::as_progress;
use crate::error::SeedError;
use crate::models::Entity;
use crate::pipeline::{FailurePolicy, Stage, StageContext, StageOutput, StepName};
use crate::store::Filter;

/// Publishes catalogue templates on behalf of an administrator.
///
/// Templates are independent of each other, so a template that fails to
/// validate or persist is logged and the rest are still written. A template
/// whose name is already published is left in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoardTemplatesStage;

fn build_template(
    generator: &mut FixtureGenerator,
    spec: &TemplateSpec,
    created_by: Uuid,
) -> Result<BoardTemplateRecord, SeedError> {
    let columns = spec
        .columns
        .iter()
        .enumerate()
        .map(|(index, column)| TemplateColumn {
            name: column.name.to_owned(),
            color: column.color.to_owned(),
            position: u32::try_from(index).unwrap_or(u32::MAX),
        })
        .collect();
    Ok(BoardTemplateRecord {
        id: generator.uuid(),
        name: spec.name.to_owned(),
        description: spec.description.to_owned(),
        category: spec.category.to_owned(),
        columns,
        created_by,
        is_public: true,
        created_at: generator.past(60)?,
    })
}

#[async_trait]
impl Stage for BoardTemplatesStage {
    fn name(&self) -> StepName {
        StepName::BoardTemplates
    }

    fn reads(&self) -> &'static [StepName] {
        &[StepName::Users]
    }

    fn policy(&self) -> FailurePolicy {
        FailurePolicy::CatchAndContinue
    }

    async fn seed(&self, ctx: &mut StageContext<'_>) -> Result<StageOutput, SeedError> {
        let admins = ctx
            .upstream_matching::<UserRolesRecord>(&Filter::eq("systemRole", "admin"))
            .await?;
        let Some(creator) = admins
            .iter()
            .find(|roles| roles.system_role == SystemRole::Admin)
            .map(|roles| roles.user)
        else {
            ctx.dependency_missing(StepName::Users);
            return Ok(StageOutput::empty(self.name()));
        };

        let counts = *ctx.counts();
        let wanted = ctx
            .generator()
            .count(counts.board_templates)
            .min(BOARD_TEMPLATES.len());
        ctx.progress().set_expected(as_progress(wanted));

        let mut templates = Vec::with_capacity(wanted);
        for spec in BOARD_TEMPLATES.iter().take(wanted) {
            let template = build_template(ctx.generator(), spec, creator)?;
            let by_name = Filter::eq("name", spec.name);
            if ctx
                .existing::<BoardTemplateRecord>(&by_name)
                .await?
                .is_some()
            {
                ctx.already_present(BoardTemplateRecord::COLLECTION, spec.name);
                continue;
            }
            if ctx
                .persist(
                    &template,
                    || validate_board_template(&template, true),
                    self.policy(),
                )
                .await?
            {
                templates.push(template);
            }
        }
        ctx.progress()
            .log(&format!("published {} board templates", templates.len()));
        Ok(StageOutput::BoardTemplates(templates))
    }
}
