//! Termination policy port.

use crate::domain::models::{FactorValue, OptimizationHistory, TerminationReason};

/// Pure predicate over a (possibly partial) history.
pub trait TerminationPolicy<F: FactorValue>: Send + Sync {
    /// `Some(reason)` to stop after the latest iteration.
    fn should_terminate(&self, history: &OptimizationHistory<F>) -> Option<TerminationReason>;

    /// Human-readable description for the audit report.
    fn description(&self) -> String;
}
