//! Seed the task-board document store, and manage its backups.
//!
//! # Examples
//! ```sh
//! SEEDER_ENVIRONMENT=test cargo run -p seeder --bin seed -- run --module users
//! cargo run -p seeder --bin seed -- backups list
//! ```
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::io::{self, Write};

use chrono::TimeDelta;
use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Context, Result};
use tokio::runtime::Builder;

use seeder::backup::BackupManager;
use seeder::config::SeederSettings;
use seeder::error::ConfigurationError;
use seeder::pipeline::{RunOptions, SeedPipeline};
use seeder::telemetry::init_tracing;

/// `seed` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "seed",
    about = "Seed the task-board document store with deterministic fixtures",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Back up, clear, and seed the store.
    Run(RunArgs),
    /// List the steps a run would execute.
    Plan {
        /// Only steps whose name contains this text; repeatable.
        #[arg(long = "module", value_name = "name")]
        modules: Vec<String>,
    },
    /// Restore a backup, the newest by default.
    Rollback {
        /// Backup identifier.
        #[arg(long = "backup", value_name = "id")]
        backup: Option<String>,
    },
    /// Inspect and maintain backups.
    Backups {
        #[command(subcommand)]
        command: BackupCommand,
    },
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Do not back up the store first.
    #[arg(long)]
    skip_backup: bool,
    /// Persist records without validating them.
    #[arg(long)]
    skip_validation: bool,
    /// Only steps whose name contains this text; repeatable. Subset runs do
    /// not clear the store.
    #[arg(long = "module", value_name = "name")]
    modules: Vec<String>,
}

#[derive(Debug, Subcommand)]
enum BackupCommand {
    /// List backups, newest first.
    List,
    /// Show backup count, size, and age range.
    Stats,
    /// Take a backup now.
    Create {
        /// Reason recorded in the backup metadata.
        #[arg(long, default_value = "manual backup")]
        description: String,
    },
    /// Delete backups older than the given age.
    Cleanup {
        /// Maximum age to keep, in days.
        #[arg(long = "max-age-days", value_name = "days")]
        max_age_days: u32,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let settings = SeederSettings::from_environment()?;
    init_tracing(settings.log_json);

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("failed to create Tokio runtime")?;
    runtime.block_on(execute(cli.command, &settings))
}

async fn execute(command: Command, settings: &SeederSettings) -> Result<()> {
    match command {
        Command::Run(args) => run(args, settings).await,
        Command::Plan { modules } => plan(&modules, settings),
        Command::Rollback { backup } => rollback(backup.as_deref(), settings).await,
        Command::Backups { command } => manage_backups(command, settings).await,
    }
}

fn pipeline(settings: &SeederSettings) -> Result<SeedPipeline> {
    let profile = settings.load_profile()?;
    let store = settings.open_store()?;
    let mut builder = SeedPipeline::builder(store.clone(), profile)
        .with_progress(settings.progress_mode());
    if let Some(backups) = settings.open_backups(store)? {
        builder = builder.with_backups(backups);
    }
    Ok(builder.build()?)
}

async fn run(args: RunArgs, settings: &SeederSettings) -> Result<()> {
    let options = RunOptions {
        skip_backup: args.skip_backup,
        skip_validation: args.skip_validation,
        modules: args.modules,
    };
    let outcome = pipeline(settings)?
        .run(&options)
        .await
        .wrap_err("seed run failed; restore the pre-run backup with `seed rollback`")?;
    let mut out = io::stdout().lock();
    writeln!(out, "{outcome}")?;
    if outcome.soft_failure_count() > 0 {
        writeln!(
            out,
            "{} records were skipped; see the log for details",
            outcome.soft_failure_count()
        )?;
    }
    Ok(())
}

fn plan(modules: &[String], settings: &SeederSettings) -> Result<()> {
    let seeding = settings.planning_pipeline()?;
    let steps = seeding.plan(modules);
    let mut out = io::stdout().lock();
    if steps.is_empty() {
        writeln!(
            out,
            "profile '{}' plans no steps",
            seeding.profile().name()
        )?;
        return Ok(());
    }
    for (position, step) in steps.iter().enumerate() {
        writeln!(out, "{:>2}. {step}", position.saturating_add(1))?;
    }
    Ok(())
}

async fn rollback(backup: Option<&str>, settings: &SeederSettings) -> Result<()> {
    let summary = pipeline(settings)?.rollback(backup).await?;
    writeln!(
        io::stdout().lock(),
        "restored {}: {} collections, {} records ({} removed)",
        summary.backup_id,
        summary.collections,
        summary.restored,
        summary.cleared
    )?;
    Ok(())
}

fn backup_manager(settings: &SeederSettings) -> Result<BackupManager> {
    let store = settings.open_store()?;
    Ok(settings
        .open_backups(store)?
        .ok_or(ConfigurationError::BackupsDisabled)?)
}

async fn manage_backups(command: BackupCommand, settings: &SeederSettings) -> Result<()> {
    let backups = backup_manager(settings)?;
    let mut out = io::stdout().lock();
    match command {
        BackupCommand::List => {
            for backup in backups.list_backups()? {
                writeln!(
                    out,
                    "{}  {}  {:>7} records  {}",
                    backup.id,
                    backup.timestamp.to_rfc3339(),
                    backup.total_records,
                    backup.description
                )?;
            }
        }
        BackupCommand::Stats => {
            let stats = backups.backup_stats()?;
            writeln!(out, "backups: {}", stats.count)?;
            writeln!(out, "size: {} bytes", stats.total_bytes)?;
            writeln!(out, "records: {}", stats.total_records)?;
            if let (Some(oldest), Some(newest)) = (stats.oldest, stats.newest) {
                writeln!(out, "oldest: {}", oldest.to_rfc3339())?;
                writeln!(out, "newest: {}", newest.to_rfc3339())?;
            }
        }
        BackupCommand::Create { description } => {
            let metadata = backups.create_backup(&description).await?;
            writeln!(
                out,
                "created {} ({} records)",
                metadata.id, metadata.total_records
            )?;
        }
        BackupCommand::Cleanup { max_age_days } => {
            let removed = backups.cleanup_old_backups(TimeDelta::days(i64::from(max_age_days)))?;
            writeln!(out, "removed {removed} backups")?;
        }
    }
    Ok(())
}
