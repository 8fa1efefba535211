//! Scorer port.

use crate::domain::errors::ScoringError;
use crate::domain::models::{FactorValue, IterationAggregate};

/// Reduces an iteration aggregate to a scalar score.
///
/// Scores should be normalized to `[0.0, 1.0]` with `1.0` best so that runs
/// can be compared. Whether higher or lower is better is decided by the
/// run's [`Objective`](crate::domain::models::Objective), not by the scorer.
///
/// Implementations must be deterministic and free of side effects.
pub trait Scorer<F: FactorValue>: Send + Sync {
    fn score(&self, aggregate: &IterationAggregate<F>) -> Result<f64, ScoringError>;

    /// Scores below this are recorded as `BELOW_THRESHOLD` instead of
    /// `SUCCESS`. `None` accepts every score.
    fn minimum_acceptance_threshold(&self) -> Option<f64> {
        None
    }

    /// Human-readable description for the audit report.
    fn description(&self) -> String;
}
