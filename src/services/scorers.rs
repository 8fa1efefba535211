//! Stock scorers.

use std::sync::Arc;

use crate::domain::errors::{OptimizationError, OptimizationResult, ScoringError};
use crate::domain::models::{FactorValue, IterationAggregate};
use crate::domain::ports::Scorer;

/// Score is the iteration's success rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SuccessRateScorer {
    threshold: Option<f64>,
}

impl SuccessRateScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterations scoring below `threshold` are recorded as below threshold.
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold: Some(threshold),
        }
    }
}

impl<F: FactorValue> Scorer<F> for SuccessRateScorer {
    fn score(&self, aggregate: &IterationAggregate<F>) -> Result<f64, ScoringError> {
        Ok(aggregate.statistics().success_rate())
    }

    fn minimum_acceptance_threshold(&self) -> Option<f64> {
        self.threshold
    }

    fn description(&self) -> String {
        match self.threshold {
            Some(threshold) => format!("success rate (minimum {threshold:.2})"),
            None => "success rate".to_string(),
        }
    }
}

/// Successes per thousand tokens: `success_rate * 1000 / total_tokens`.
///
/// Zero when no tokens were used. Unlike the other stock scorers this is not
/// bounded to `[0, 1]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CostEfficiencyScorer;

impl<F: FactorValue> Scorer<F> for CostEfficiencyScorer {
    fn score(&self, aggregate: &IterationAggregate<F>) -> Result<f64, ScoringError> {
        let statistics = aggregate.statistics();
        if statistics.total_tokens() == 0 {
            return Ok(0.0);
        }
        Ok(statistics.success_rate() * 1000.0 / statistics.total_tokens() as f64)
    }

    fn description(&self) -> String {
        "cost efficiency (success rate per 1000 tokens)".to_string()
    }
}

/// Weighted sum of sub-scorers with weights normalized to sum to one.
///
/// The first sub-scorer failure fails the whole score.
pub struct WeightedScorer<F> {
    components: Vec<(Arc<dyn Scorer<F>>, f64)>,
    threshold: Option<f64>,
}

impl<F: FactorValue> WeightedScorer<F> {
    pub fn new(components: Vec<(Arc<dyn Scorer<F>>, f64)>) -> OptimizationResult<Self> {
        if components.is_empty() {
            return Err(OptimizationError::InvalidConfiguration(
                "weighted scorer needs at least one component".to_string(),
            ));
        }
        if let Some((_, weight)) = components
            .iter()
            .find(|(_, w)| !w.is_finite() || *w < 0.0)
        {
            return Err(OptimizationError::InvalidConfiguration(format!(
                "weighted scorer weights must be finite and non-negative, got {weight}"
            )));
        }

        let total: f64 = components.iter().map(|(_, w)| w).sum();
        if total <= 0.0 {
            return Err(OptimizationError::InvalidConfiguration(
                "weighted scorer weights sum to zero".to_string(),
            ));
        }

        Ok(Self {
            components: components
                .into_iter()
                .map(|(scorer, weight)| (scorer, weight / total))
                .collect(),
            threshold: None,
        })
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Normalized weights, in component order.
    pub fn weights(&self) -> Vec<f64> {
        self.components.iter().map(|(_, w)| *w).collect()
    }
}

impl<F: FactorValue> Scorer<F> for WeightedScorer<F> {
    fn score(&self, aggregate: &IterationAggregate<F>) -> Result<f64, ScoringError> {
        self.components
            .iter()
            .try_fold(0.0, |acc, (scorer, weight)| {
                Ok(acc + scorer.score(aggregate)? * weight)
            })
    }

    fn minimum_acceptance_threshold(&self) -> Option<f64> {
        self.threshold
    }

    fn description(&self) -> String {
        let parts: Vec<String> = self
            .components
            .iter()
            .map(|(scorer, weight)| format!("{:.2} x {}", weight, scorer.description()))
            .collect();
        format!("weighted [{}]", parts.join(", "))
    }
}
