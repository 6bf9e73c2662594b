//! Nested progress reporting for seed runs.
//!
//! A run shows one overall bar counting steps plus a bar per active step.
//! Step bars redraw at most every [`DRAW_INTERVAL`]; log lines emitted
//! through a step suspend the bars so output does not interleave with them.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::{error, info, warn};

use crate::pipeline::StepName;

/// Minimum time between step bar redraws.
pub const DRAW_INTERVAL: Duration = Duration::from_millis(100);

const STEP_TEMPLATE: &str =
    "{prefix:>16.bold} [{bar:32.cyan/blue}] {pos:>5}/{len:5} {percent:>3}% eta {eta} {msg}";
const OVERALL_TEMPLATE: &str = "{prefix:>16.bold.green} [{bar:32.green}] {pos}/{len} steps";

/// Whether bars are drawn to the terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProgressMode {
    /// Draw to stderr.
    #[default]
    Visible,
    /// Track state without drawing; used by tests and quiet runs.
    Hidden,
}

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .map_or_else(|_| ProgressStyle::default_bar(), |style| style.progress_chars("=> "))
}

/// Progress for a whole run.
#[derive(Debug)]
pub struct PipelineProgress {
    multi: MultiProgress,
    overall: ProgressBar,
}

impl PipelineProgress {
    /// Starts tracking a run of `total_steps` steps.
    #[must_use]
    pub fn new(total_steps: usize, mode: ProgressMode) -> Self {
        let target = match mode {
            ProgressMode::Visible => ProgressDrawTarget::stderr(),
            ProgressMode::Hidden => ProgressDrawTarget::hidden(),
        };
        let multi = MultiProgress::with_draw_target(target);
        let overall = multi.add(ProgressBar::new(u64::try_from(total_steps).unwrap_or(u64::MAX)));
        overall.set_style(style(OVERALL_TEMPLATE));
        overall.set_prefix("seeding");
        Self { multi, overall }
    }

    /// Opens a bar for `step` expecting `expected` records.
    #[must_use]
    pub fn start_step(&self, step: StepName, expected: u64) -> StepProgress {
        let bar = self
            .multi
            .insert_before(&self.overall, ProgressBar::new(expected));
        bar.set_style(style(STEP_TEMPLATE));
        bar.set_prefix(step.as_str());
        StepProgress {
            multi: self.multi.clone(),
            bar,
            step,
            started: Instant::now(),
            processed: AtomicU64::new(0),
            expected: AtomicU64::new(expected),
            last_draw: Mutex::new(None),
        }
    }

    /// Marks one step as done on the overall bar.
    pub fn step_done(&self) {
        self.overall.inc(1);
    }

    /// Number of steps marked done.
    #[must_use]
    pub fn steps_done(&self) -> u64 {
        self.overall.position()
    }

    /// Logs a run-level message without tearing the bars.
    pub fn log(&self, message: &str) {
        self.multi.suspend(|| info!("{message}"));
    }

    /// Completes the overall bar.
    pub fn finish(&self) {
        self.overall.finish();
    }
}

/// Progress for one step.
#[derive(Debug)]
pub struct StepProgress {
    multi: MultiProgress,
    bar: ProgressBar,
    step: StepName,
    started: Instant,
    processed: AtomicU64,
    expected: AtomicU64,
    last_draw: Mutex<Option<Instant>>,
}

impl StepProgress {
    /// Counts `n` more processed records, redrawing if the interval elapsed.
    pub fn inc(&self, n: u64) {
        let processed = self
            .processed
            .fetch_add(n, Ordering::Relaxed)
            .saturating_add(n);
        let now = Instant::now();
        let Ok(mut last) = self.last_draw.lock() else {
            return;
        };
        let due = last.is_none_or(|drawn| now.duration_since(drawn) >= DRAW_INTERVAL);
        if due {
            self.bar.set_position(processed);
            *last = Some(now);
        }
    }

    /// Replaces the expected total once a stage knows its workload.
    pub fn set_expected(&self, expected: u64) {
        self.expected.store(expected, Ordering::Relaxed);
        self.bar.set_length(expected);
    }

    /// Adds to the expected total.
    pub fn add_expected(&self, more: u64) {
        let expected = self
            .expected
            .fetch_add(more, Ordering::Relaxed)
            .saturating_add(more);
        self.bar.set_length(expected);
    }

    /// Records processed so far.
    #[must_use]
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Current expected total.
    #[must_use]
    pub fn expected(&self) -> u64 {
        self.expected.load(Ordering::Relaxed)
    }

    /// Time since the step started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Whole-number completion percentage, capped at 100.
    #[must_use]
    pub fn percent(&self) -> u64 {
        let expected = self.expected();
        if expected == 0 {
            return 100;
        }
        self.processed()
            .saturating_mul(100)
            .checked_div(expected)
            .map_or(100, |percent| percent.min(100))
    }

    /// Remaining time extrapolated from the average rate so far.
    #[must_use]
    pub fn eta(&self) -> Option<Duration> {
        let processed = u128::from(self.processed());
        let remaining = u128::from(self.expected().saturating_sub(self.processed()));
        let nanos = self
            .elapsed()
            .as_nanos()
            .saturating_mul(remaining)
            .checked_div(processed)?;
        Some(Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX)))
    }

    /// Drawn bar position.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Drawn bar length.
    #[must_use]
    pub fn length(&self) -> Option<u64> {
        self.bar.length()
    }

    /// Emits an informational line.
    pub fn log(&self, message: &str) {
        self.multi
            .suspend(|| info!(step = %self.step, "{message}"));
    }

    /// Emits a warning line.
    pub fn warn(&self, message: &str) {
        self.multi
            .suspend(|| warn!(step = %self.step, "{message}"));
    }

    /// Emits an error line.
    pub fn error(&self, message: &str) {
        self.multi
            .suspend(|| error!(step = %self.step, "{message}"));
    }

    /// Emits a success line.
    pub fn success(&self, message: &str) {
        self.multi
            .suspend(|| info!(step = %self.step, outcome = "success", "{message}"));
    }

    /// Completes the bar, re-syncing it to the processed count so it ends at
    /// 100% even when the expected total was an estimate.
    pub fn finish(&self) -> u64 {
        let processed = self.processed();
        self.expected.store(processed, Ordering::Relaxed);
        self.bar.set_length(processed);
        self.bar.set_position(processed);
        self.bar.finish_with_message("done");
        processed
    }

    /// Abandons the bar with `message`, leaving it at its last position.
    pub fn fail(&self, message: &str) {
        self.bar.set_position(self.processed());
        self.bar.abandon_with_message(message.to_owned());
    }
}
