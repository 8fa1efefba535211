//! Progress bar reporting using indicatif
//!
//! [`IndicatifProgressReporter`] plugs a terminal progress bar into the
//! optimization loop's progress side channel. The bar counts samples; its
//! length is the most samples the run could take, so a run that terminates
//! early finishes short of the end.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

use crate::domain::models::TerminationReason;
use crate::domain::ports::{ProgressReporter, ProgressSnapshot};

const PROGRESS_TEMPLATE: &str = "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}";
const PROGRESS_CHARS: &str = "█▓▒░ ";

/// Create a sample-counting progress bar
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(PROGRESS_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars(PROGRESS_CHARS);
    pb.set_style(style);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Reports optimization progress on a terminal progress bar.
pub struct IndicatifProgressReporter {
    bar: ProgressBar,
}

impl IndicatifProgressReporter {
    /// Bar sized for `max_iterations * samples_per_iteration` samples.
    pub fn new(max_iterations: u32, samples_per_iteration: usize) -> Self {
        let total = u64::from(max_iterations).saturating_mul(samples_per_iteration as u64);
        Self {
            bar: create_progress_bar(total),
        }
    }

    /// A reporter that tracks progress without drawing (JSON mode, tests).
    pub fn hidden(max_iterations: u32, samples_per_iteration: usize) -> Self {
        let reporter = Self::new(max_iterations, samples_per_iteration);
        reporter.bar.set_draw_target(ProgressDrawTarget::hidden());
        reporter
    }

    pub fn bar(&self) -> &ProgressBar {
        &self.bar
    }
}

impl ProgressReporter for IndicatifProgressReporter {
    fn on_sample(&self, progress: &ProgressSnapshot) {
        self.bar.set_position(progress.total_samples);
        self.bar.set_message(progress_message(progress));
    }

    fn on_complete(&self, progress: &ProgressSnapshot, reason: &TerminationReason) {
        self.bar.set_position(progress.total_samples);
        let icon = if reason.is_failure() { "✗" } else { "✓" };
        self.bar
            .finish_with_message(format!("{icon} {}: {}", reason.cause(), reason.message()));
    }
}

fn progress_message(progress: &ProgressSnapshot) -> String {
    let best = progress
        .best_score
        .map_or_else(|| "-".to_string(), |s| format!("{s:.4}"));
    format!(
        "iteration {} ({}/{}) best {best}",
        progress.iteration, progress.samples_in_iteration, progress.samples_per_iteration
    )
}
