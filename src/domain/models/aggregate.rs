//! The per-iteration aggregate handed to scorers.

use chrono::{DateTime, Duration, Utc};

use super::factor::{FactorSuit, FactorValue};
use super::statistics::IterationStatistics;
use crate::domain::errors::{OptimizationError, OptimizationResult};

/// Everything known about one iteration once its samples are in: the inputs
/// it ran with, the statistics of its samples, and when it ran.
///
/// Built once per iteration by the optimization loop and never modified.
#[derive(Debug, Clone)]
pub struct IterationAggregate<F> {
    iteration_number: u32,
    factor_suit: FactorSuit<F>,
    statistics: IterationStatistics,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
}

impl<F: FactorValue> IterationAggregate<F> {
    pub fn new(
        iteration_number: u32,
        factor_suit: FactorSuit<F>,
        statistics: IterationStatistics,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> OptimizationResult<Self> {
        if end_time < start_time {
            return Err(OptimizationError::InvalidAggregate(format!(
                "iteration {iteration_number} ends ({end_time}) before it starts ({start_time})"
            )));
        }
        Ok(Self {
            iteration_number,
            factor_suit,
            statistics,
            start_time,
            end_time,
        })
    }

    pub fn iteration_number(&self) -> u32 {
        self.iteration_number
    }

    pub fn factor_suit(&self) -> &FactorSuit<F> {
        &self.factor_suit
    }

    pub fn control_factor_name(&self) -> &str {
        self.factor_suit.control_name()
    }

    pub fn control_value(&self) -> &F {
        self.factor_suit.control_value()
    }

    pub fn statistics(&self) -> &IterationStatistics {
        &self.statistics
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }
}
