//! Tags at global, workspace, space, and board scope.

use async_trait::async_trait;
use fixture_data::catalogue::{TAG_NAMES, TAG_PALETTE};
use fixture_data::validation::validate_tag;
use fixture_data::{
    BoardRecord, FixtureGenerator, SpaceRecord, TagRecord, TagScope, UserRecord, WorkspaceRecord,
};
use uuid::Uuid;

use super::{as_progress, pick_id};
use crate::error::SeedError;
use crate::pipeline::{FailurePolicy, Stage, StageContext, StageOutput, StepName};

/// Seeds tags, cycling through the catalogue names and colour palette.
#[derive(Debug, Clone, Default)]
pub struct TagsStage {
    palette: Option<Vec<String>>,
}

impl TagsStage {
    /// Uses `palette` instead of the catalogue colours.
    ///
    /// Colours are taken in order and reused once exhausted; they are not
    /// checked here, so invalid entries surface as validation failures.
    #[must_use]
    pub const fn with_palette(palette: Vec<String>) -> Self {
        Self {
            palette: Some(palette),
        }
    }

    fn color(&self, index: usize) -> String {
        let picked = match &self.palette {
            Some(palette) => cycle(palette, index).cloned(),
            None => cycle(TAG_PALETTE, index).map(|color| (*color).to_owned()),
        };
        picked.unwrap_or_else(|| "#64748b".to_owned())
    }
}

fn cycle<T>(items: &[T], index: usize) -> Option<&T> {
    index
        .checked_rem(items.len())
        .and_then(|position| items.get(position))
}

/// The catalogue name for `index`, suffixed with the round once the
/// catalogue wraps.
fn tag_name(index: usize) -> String {
    let base = cycle(TAG_NAMES, index).copied().unwrap_or("tag");
    match index.checked_div(TAG_NAMES.len()) {
        Some(round) if round > 0 => format!("{base}-{}", round.saturating_add(1)),
        _ => base.to_owned(),
    }
}

struct Containers {
    users: Vec<Uuid>,
    workspaces: Vec<Uuid>,
    spaces: Vec<Uuid>,
    boards: Vec<Uuid>,
}

impl Containers {
    fn scopes(&self) -> Vec<TagScope> {
        let mut scopes = vec![TagScope::Global];
        if !self.workspaces.is_empty() {
            scopes.push(TagScope::Workspace);
        }
        if !self.spaces.is_empty() {
            scopes.push(TagScope::Space);
        }
        if !self.boards.is_empty() {
            scopes.push(TagScope::Board);
        }
        scopes
    }

    fn pick_scope(&self, generator: &mut FixtureGenerator) -> (TagScope, Option<Uuid>) {
        let scope = generator
            .pick(&self.scopes())
            .copied()
            .unwrap_or(TagScope::Global);
        let scope_ref = match scope {
            TagScope::Global => None,
            TagScope::Workspace => pick_id(generator, &self.workspaces),
            TagScope::Space => pick_id(generator, &self.spaces),
            TagScope::Board => pick_id(generator, &self.boards),
        };
        (scope, scope_ref)
    }
}

fn ids<T>(records: &[T], id: impl Fn(&T) -> Uuid) -> Vec<Uuid> {
    records.iter().map(id).collect()
}

#[async_trait]
impl Stage for TagsStage {
    fn name(&self) -> StepName {
        StepName::Tags
    }

    fn reads(&self) -> &'static [StepName] {
        &[StepName::Users, StepName::Workspaces, StepName::Boards]
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
        let containers = Containers {
            users: ids(&users, |user| user.id),
            workspaces: ids(&ctx.upstream::<WorkspaceRecord>().await?, |w| w.id),
            spaces: ids(&ctx.upstream::<SpaceRecord>().await?, |s| s.id),
            boards: ids(&ctx.upstream::<BoardRecord>().await?, |b| b.id),
        };

        let counts = *ctx.counts();
        let wanted = ctx.generator().count(counts.tags);
        ctx.progress().set_expected(as_progress(wanted));

        let mut tags = Vec::with_capacity(wanted);
        for index in 0..wanted {
            let tag = {
                let generator = ctx.generator();
                let (scope, scope_ref) = containers.pick_scope(generator);
                TagRecord {
                    id: generator.uuid(),
                    name: tag_name(index),
                    color: self.color(index),
                    description: generator.chance(1, 2).then(|| generator.sentence()),
                    scope,
                    scope_ref,
                    created_by: pick_id(generator, &containers.users).unwrap_or_default(),
                    created_at: generator.past(90)?,
                }
            };
            if ctx
                .persist(&tag, || validate_tag(&tag), self.policy())
                .await?
            {
                tags.push(tag);
            }
        }
        Ok(StageOutput::Tags(tags))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rstest::rstest;

    use super::super::tests::{run_with, small_counts};
    use super::*;
    use crate::store::MemoryDocumentStore;

    #[rstest]
    #[case(0, 0, None)]
    #[case(15, 0, Some(2))]
    #[case(31, 1, Some(3))]
    fn names_are_suffixed_after_wrapping(
        #[case] index: usize,
        #[case] catalogue_position: usize,
        #[case] round: Option<usize>,
    ) {
        let base = TAG_NAMES.get(catalogue_position).expect("catalogue entry");
        let expected = round.map_or_else(|| (*base).to_owned(), |r| format!("{base}-{r}"));
        assert_eq!(tag_name(index), expected);
    }

    #[test]
    fn custom_palettes_cycle() {
        let stage = TagsStage::with_palette(vec!["#000000".to_owned(), "#ffffff".to_owned()]);
        assert_eq!(stage.color(0), "#000000");
        assert_eq!(stage.color(3), "#ffffff");
    }

    #[tokio::test]
    async fn scoped_tags_reference_existing_containers() {
        let store = Arc::new(MemoryDocumentStore::default());
        let run = run_with(
            store,
            small_counts(),
            &["users", "workspaces", "boards", "tags"],
        )
        .await;

        let tags = run.results.records::<TagRecord>();
        assert_eq!(tags.len(), 3);
        for tag in tags {
            let known = match tag.scope {
                TagScope::Global => tag.scope_ref.is_none(),
                TagScope::Workspace => run
                    .results
                    .records::<WorkspaceRecord>()
                    .iter()
                    .any(|w| Some(w.id) == tag.scope_ref),
                TagScope::Space => run
                    .results
                    .records::<SpaceRecord>()
                    .iter()
                    .any(|s| Some(s.id) == tag.scope_ref),
                TagScope::Board => run
                    .results
                    .records::<BoardRecord>()
                    .iter()
                    .any(|b| Some(b.id) == tag.scope_ref),
            };
            assert!(known, "tag {} has a dangling scope", tag.name);
        }
    }
}
