//! File attachments with kind-specific metadata.

use async_trait::async_trait;
use fixture_data::catalogue::{FILE_TYPES, FileSpec};
use fixture_data::validation::validate_file;
use fixture_data::{FileKind, FileMetadata, FileRecord, FixtureGenerator, TaskRecord, UserRecord};
use uuid::Uuid;

use super::{as_progress, pick_id};
use crate::error::SeedError;
use crate::pipeline::{FailurePolicy, Stage, StageContext, StageOutput, StepName};

const FALLBACK: FileSpec = FileSpec {
    kind: FileKind::Document,
    mime_type: "text/plain",
    extension: "txt",
};

/// Seeds uploaded files, some attached to tasks.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilesStage;

fn metadata(generator: &mut FixtureGenerator, kind: FileKind) -> FileMetadata {
    match kind {
        FileKind::Image => FileMetadata::Image {
            width: generator.between_u32(320, 4096),
            height: generator.between_u32(240, 4096),
        },
        FileKind::Video => FileMetadata::Video {
            width: 1920,
            height: 1080,
            duration_secs: generator.between_u32(5, 900),
        },
        FileKind::Audio => FileMetadata::Audio {
            duration_secs: generator.between_u32(30, 3600),
        },
        FileKind::Document => FileMetadata::Document {
            page_count: generator.between_u32(1, 120),
        },
        FileKind::Archive => FileMetadata::Archive {
            entry_count: generator.between_u32(1, 500),
        },
    }
}

fn build_file(
    generator: &mut FixtureGenerator,
    user_ids: &[Uuid],
    tasks: &[TaskRecord],
) -> Result<FileRecord, SeedError> {
    let spec = generator.pick(FILE_TYPES).copied().unwrap_or(FALLBACK);
    let id = generator.uuid();
    let created_at = generator.past(60)?;
    let filename = format!("{}.{}", id.simple(), spec.extension);
    let task = if generator.chance(1, 2) {
        generator.pick(tasks).map(|t| t.id)
    } else {
        None
    };
    Ok(FileRecord {
        id,
        original_name: format!("{}.{}", generator.word(), spec.extension),
        mime_type: spec.mime_type.to_owned(),
        size_bytes: u64::from(generator.between_u32(1_024, 5_000_000)),
        kind: spec.kind,
        metadata: metadata(generator, spec.kind),
        uploaded_by: pick_id(generator, user_ids),
        task,
        storage_key: format!("uploads/{}/{filename}", created_at.format("%Y/%m")),
        filename,
        created_at,
    })
}

#[async_trait]
impl Stage for FilesStage {
    fn name(&self) -> StepName {
        StepName::Files
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
        let counts = *ctx.counts();
        let wanted = ctx.generator().count(counts.files);
        ctx.progress().set_expected(as_progress(wanted));

        let mut files = Vec::with_capacity(wanted);
        for _ in 0..wanted {
            let file = build_file(ctx.generator(), &user_ids, &tasks)?;
            if ctx
                .persist(&file, || validate_file(&file), self.policy())
                .await?
            {
                files.push(file);
            }
        }
        Ok(StageOutput::Files(files))
    }
}
