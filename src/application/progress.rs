//! Run counters shared between the loop and its observers.

use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};

use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::models::TerminationReason;
use crate::domain::ports::{ProgressReporter, ProgressSnapshot};

const NO_SCORE: u64 = u64::MAX;

/// Lock-free counters for one run.
///
/// Only the loop writes them. Any number of observers may read them while
/// the run is in flight, e.g. a UI thread polling [`snapshot`](Self::snapshot).
#[derive(Debug)]
pub struct ProgressCounters {
    run_id: Uuid,
    samples_per_iteration: usize,
    iteration: AtomicU32,
    samples_in_iteration: AtomicUsize,
    total_samples: AtomicU64,
    best_score_bits: AtomicU64,
}

impl ProgressCounters {
    pub fn new(run_id: Uuid, samples_per_iteration: usize) -> Self {
        Self {
            run_id,
            samples_per_iteration,
            iteration: AtomicU32::new(0),
            samples_in_iteration: AtomicUsize::new(0),
            total_samples: AtomicU64::new(0),
            best_score_bits: AtomicU64::new(NO_SCORE),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn iteration(&self) -> u32 {
        self.iteration.load(Ordering::Acquire)
    }

    pub fn samples_in_iteration(&self) -> usize {
        self.samples_in_iteration.load(Ordering::Acquire)
    }

    pub fn total_samples(&self) -> u64 {
        self.total_samples.load(Ordering::Acquire)
    }

    pub fn best_score(&self) -> Option<f64> {
        match self.best_score_bits.load(Ordering::Acquire) {
            NO_SCORE => None,
            bits => Some(f64::from_bits(bits)),
        }
    }

    /// Count one accepted sample; returns the new per-iteration count.
    pub(crate) fn record_sample(&self) -> usize {
        self.total_samples.fetch_add(1, Ordering::AcqRel);
        self.samples_in_iteration.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub(crate) fn advance_iteration(&self, iteration: u32) {
        self.samples_in_iteration.store(0, Ordering::Release);
        self.iteration.store(iteration, Ordering::Release);
    }

    pub(crate) fn discard_iteration_samples(&self) {
        self.samples_in_iteration.store(0, Ordering::Release);
    }

    pub(crate) fn set_best_score(&self, score: Option<f64>) {
        let bits = score.map_or(NO_SCORE, f64::to_bits);
        self.best_score_bits.store(bits, Ordering::Release);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            run_id: self.run_id,
            iteration: self.iteration(),
            samples_in_iteration: self.samples_in_iteration(),
            samples_per_iteration: self.samples_per_iteration,
            total_samples: self.total_samples(),
            best_score: self.best_score(),
        }
    }
}

/// Writes the progress side channel to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgressReporter;

impl ProgressReporter for TracingProgressReporter {
    fn on_sample(&self, progress: &ProgressSnapshot) {
        debug!(
            run_id = %progress.run_id,
            iteration = progress.iteration,
            samples = progress.samples_in_iteration,
            target = progress.samples_per_iteration,
            total_samples = progress.total_samples,
            best_score = ?progress.best_score,
            "Sample accepted"
        );
    }

    fn on_complete(&self, progress: &ProgressSnapshot, reason: &TerminationReason) {
        info!(
            run_id = %progress.run_id,
            iterations = progress.iteration + 1,
            total_samples = progress.total_samples,
            best_score = ?progress.best_score,
            reason = reason.cause(),
            "Optimization run complete"
        );
    }
}
