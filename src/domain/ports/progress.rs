//! Progress reporting port.
//!
//! A side channel for observability. Reporters are told about every sample
//! and about run completion; they have no say in control flow.

use serde::Serialize;
use uuid::Uuid;

use crate::domain::models::TerminationReason;

/// Point-in-time view of the loop's counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    pub run_id: Uuid,
    /// Zero-based number of the iteration being collected.
    pub iteration: u32,
    /// Samples accepted into the current iteration.
    pub samples_in_iteration: usize,
    pub samples_per_iteration: usize,
    /// Samples accepted over the whole run.
    pub total_samples: u64,
    pub best_score: Option<f64>,
}

pub trait ProgressReporter: Send + Sync {
    fn on_sample(&self, progress: &ProgressSnapshot);

    fn on_complete(&self, _progress: &ProgressSnapshot, _reason: &TerminationReason) {}
}

/// Discards all progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgressReporter;

impl ProgressReporter for NullProgressReporter {
    fn on_sample(&self, _progress: &ProgressSnapshot) {}
}
