//! Statistics aggregation.
//!
//! Reduces the raw outcomes of one iteration into [`IterationStatistics`],
//! optionally attaching the bounded [`IterationFeedback`](crate::domain::models::IterationFeedback)
//! digest of why samples failed.

use crate::domain::errors::OptimizationResult;
use crate::domain::models::{FeedbackCollector, IterationStatistics, SampleOutcome};

/// Pure reduction of sample outcomes to statistics.
///
/// Calling [`aggregate`](Self::aggregate) twice on the same outcomes yields
/// identical statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatisticsAggregator {
    collect_feedback: bool,
}

impl StatisticsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregator that also digests postcondition failures, mismatches and
    /// failing inputs.
    pub fn with_feedback() -> Self {
        Self {
            collect_feedback: true,
        }
    }

    pub fn collects_feedback(&self) -> bool {
        self.collect_feedback
    }

    pub fn aggregate(&self, outcomes: &[SampleOutcome]) -> OptimizationResult<IterationStatistics> {
        if outcomes.is_empty() {
            return Ok(IterationStatistics::empty());
        }

        let mut success_count = 0_usize;
        let mut total_tokens = 0_u64;
        let mut total_latency_ms = 0.0_f64;
        let mut collector = self.collect_feedback.then(FeedbackCollector::new);

        for outcome in outcomes {
            if outcome.passed {
                success_count += 1;
            }
            total_tokens = total_tokens.saturating_add(outcome.tokens());
            total_latency_ms += outcome.latency_ms();
            if let Some(collector) = collector.as_mut() {
                collector.record(outcome);
            }
        }

        let mean_latency_ms = total_latency_ms / outcomes.len() as f64;
        let statistics = IterationStatistics::from_counts(
            outcomes.len(),
            success_count,
            total_tokens,
            mean_latency_ms,
        )?;

        Ok(match collector {
            Some(collector) => statistics.with_feedback(collector.finish()),
            None => statistics,
        })
    }
}
