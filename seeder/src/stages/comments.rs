//! Comments written by task participants.

use std::collections::HashSet;

use async_trait::async_trait;
use fixture_data::validation::validate_comment;
use fixture_data::{CommentRecord, FixtureGenerator, TaskRecord};
use uuid::Uuid;

use super::{as_progress, pick_id};
use crate::error::SeedError;
use crate::pipeline::{
    FailurePolicy, Stage, StageContext, StageOutput, StepName, distinct_excluding,
};

const MAX_MENTIONS: usize = 2;

/// Seeds comments on every task.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommentsStage;

fn build_comment(
    generator: &mut FixtureGenerator,
    task: &TaskRecord,
) -> Result<Option<CommentRecord>, SeedError> {
    let participants = distinct_excluding(task.participants(), &HashSet::new());
    let Some(author) = pick_id(generator, &participants) else {
        return Ok(None);
    };
    let mentions: Vec<Uuid> =
        generator.subset_excluding(&participants, &HashSet::from([author]), 0, MAX_MENTIONS);
    Ok(Some(CommentRecord {
        id: generator.uuid(),
        task: task.id,
        author,
        content: generator.paragraph(),
        mentions,
        is_edited: generator.chance(1, 5),
        created_at: generator.after(task.created_at, 14)?,
    }))
}

#[async_trait]
impl Stage for CommentsStage {
    fn name(&self) -> StepName {
        StepName::Comments
    }

    fn reads(&self) -> &'static [StepName] {
        &[StepName::Tasks]
    }

    fn policy(&self) -> FailurePolicy {
        FailurePolicy::SkipRecord
    }

    async fn seed(&self, ctx: &mut StageContext<'_>) -> Result<StageOutput, SeedError> {
        let tasks = ctx.upstream::<TaskRecord>().await?;
        if tasks.is_empty() {
            ctx.dependency_missing(StepName::Tasks);
            return Ok(StageOutput::empty(self.name()));
        }
        let counts = *ctx.counts();
        ctx.progress().set_expected(0);

        let mut comments = Vec::new();
        for task in &tasks {
            let wanted = ctx.generator().count(counts.comments_per_task);
            ctx.progress().add_expected(as_progress(wanted));
            for _ in 0..wanted {
                let Some(comment) = build_comment(ctx.generator(), task)? else {
                    continue;
                };
                if ctx
                    .persist(&comment, || validate_comment(&comment, task), self.policy())
                    .await?
                {
                    comments.push(comment);
                }
            }
        }
        Ok(StageOutput::Comments(comments))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::tests::{run_with, small_counts};
    use super::*;
    use crate::store::MemoryDocumentStore;

    #[tokio::test]
    async fn authors_and_mentions_are_participants() {
        let store = Arc::new(MemoryDocumentStore::default());
        let run = run_with(store, small_counts(), &[]).await;

        let tasks = run.results.records::<TaskRecord>();
        let comments = run.results.records::<CommentRecord>();
        assert!(!comments.is_empty());
        for comment in comments {
            let task = tasks.iter().find(|t| t.id == comment.task).expect("task");
            let participants: HashSet<Uuid> = task.participants().collect();
            assert!(participants.contains(&comment.author));
            assert!(comment.mentions.iter().all(|id| participants.contains(id)));
            assert!(!comment.mentions.contains(&comment.author));
        }
    }
}
