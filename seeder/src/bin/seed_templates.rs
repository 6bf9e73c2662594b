//! Publish the board template catalogue into an already seeded store.
//!
//! Templates are attributed to an existing administrator, found through the
//! `userroles` collection; no users are created and nothing is cleared.
//!
//! # Examples
//! ```sh
//! SEEDER_ENVIRONMENT=development cargo run -p seeder --bin seed-templates
//! ```
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::io::{self, Write};

use clap::Parser;
use color_eyre::eyre::{Context, Result, eyre};
use tokio::runtime::Builder;

use seeder::config::SeederSettings;
use seeder::pipeline::{
    RunOptions, SeedPipeline, SoftFailure, StepName, StepOutcome, StepReport,
};
use seeder::stages::BoardTemplatesStage;
use seeder::telemetry::init_tracing;

/// `seed-templates` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "seed-templates",
    about = "Publish catalogue board templates on behalf of an existing admin",
    version
)]
struct CliArgs {
    /// Do not back up the store first.
    #[arg(long)]
    skip_backup: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = CliArgs::parse();
    let settings = SeederSettings::from_environment()?;
    init_tracing(settings.log_json);

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("failed to create Tokio runtime")?;
    runtime.block_on(publish(args.skip_backup, &settings))
}

async fn publish(skip_backup: bool, settings: &SeederSettings) -> Result<()> {
    let profile = settings.load_profile()?;
    let store = settings.open_store()?;
    let mut builder = SeedPipeline::builder(store.clone(), profile)
        .with_stages(vec![Box::new(BoardTemplatesStage)])
        .with_progress(settings.progress_mode());
    if let Some(backups) = settings.open_backups(store)? {
        builder = builder.with_backups(backups);
    }
    let options = RunOptions {
        skip_backup,
        skip_validation: false,
        modules: vec![StepName::BoardTemplates.as_str().to_owned()],
    };

    let outcome = builder
        .build()?
        .run(&options)
        .await
        .wrap_err("publishing board templates failed")?;
    let Some(report) = outcome.report(StepName::BoardTemplates) else {
        return Err(eyre!("the active profile requests no board templates"));
    };
    let summary = summarize(report)?;
    writeln!(io::stdout().lock(), "{summary}")?;
    Ok(())
}

/// One-line result of a publish run.
///
/// A run that wrote nothing is an error unless every wanted template was
/// already in the store.
fn summarize(report: &StepReport) -> Result<String> {
    if report.outcome == StepOutcome::Skipped {
        return Err(eyre!(
            "no admin user found in the store; seed users before publishing templates"
        ));
    }
    let present = report
        .soft_failures
        .iter()
        .filter(|failure| matches!(failure, SoftFailure::AlreadyPresent { .. }))
        .count();
    let failed = report.skipped().saturating_sub(present);
    if report.processed > 0 {
        return Ok(format!(
            "published {} board templates ({present} already present, {failed} failed)",
            report.processed
        ));
    }
    if present > 0 && failed == 0 {
        return Ok(format!("board templates already published ({present} present)"));
    }
    Err(eyre!(
        "no board templates were published; {failed} failed, see the log for details"
    ))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rstest::rstest;
    use uuid::Uuid;

    use super::*;

    fn present(name: &str) -> SoftFailure {
        SoftFailure::AlreadyPresent {
            entity: "boardtemplates",
            key: name.to_owned(),
        }
    }

    fn lost() -> SoftFailure {
        SoftFailure::Persistence {
            entity: "boardtemplates",
            record: Uuid::nil(),
            message: "disk full".to_owned(),
        }
    }

    fn report(processed: u64, soft_failures: Vec<SoftFailure>) -> StepReport {
        StepReport {
            step: StepName::BoardTemplates,
            processed,
            expected: 2,
            soft_failures,
            elapsed: Duration::ZERO,
            outcome: StepOutcome::Completed,
        }
    }

    #[rstest]
    #[case(report(2, vec![]), "published 2 board templates (0 already present, 0 failed)")]
    #[case(report(1, vec![present("Kanban")]), "published 1 board templates (1 already present, 0 failed)")]
    #[case(report(0, vec![present("Kanban"), present("Scrum")]), "board templates already published (2 present)")]
    fn successful_runs_are_summarized(#[case] report: StepReport, #[case] expected: &str) {
        assert_eq!(summarize(&report).expect("summary"), expected);
    }

    #[rstest]
    #[case(report(0, vec![lost(), lost()]))]
    #[case(report(0, vec![present("Kanban"), lost()]))]
    #[case(report(0, vec![]))]
    fn runs_that_publish_nothing_fail(#[case] report: StepReport) {
        let err = summarize(&report).expect_err("nothing published");
        assert!(err.to_string().contains("no board templates were published"));
    }

    #[test]
    fn a_missing_admin_fails() {
        let missing = SoftFailure::DependencyMissing {
            dependency: StepName::Users,
        };
        let skipped = StepReport {
            outcome: StepOutcome::Skipped,
            ..report(0, vec![missing])
        };

        let err = summarize(&skipped).expect_err("no admin");
        assert!(err.to_string().contains("no admin user"));
    }
}
