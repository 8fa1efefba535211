//! Per-iteration statistical summary and optional failure feedback.
//!
//! [`IterationStatistics`] is the fixed-shape reduction of every sample in an
//! iteration. [`IterationFeedback`] is the richer, bounded digest of *why*
//! samples failed, kept small enough to hand to a mutator every iteration.

use serde::{Deserialize, Serialize};

use super::outcome::{Mismatch, SampleOutcome};
use crate::domain::errors::{OptimizationError, OptimizationResult};

/// Distinct messages kept per postcondition.
pub const MAX_MESSAGES_PER_POSTCONDITION: usize = 5;
/// Expected/actual mismatches kept per iteration.
pub const MAX_MISMATCHES: usize = 5;
/// Distinct failing inputs kept per iteration.
pub const MAX_FAILED_INPUTS: usize = 5;

/// Statistical summary of one iteration's samples.
///
/// Invariants: `success_count + failure_count == sample_count` and
/// `success_rate ∈ [0, 1]`. Both are enforced by the constructors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationStatistics {
    sample_count: usize,
    success_count: usize,
    failure_count: usize,
    success_rate: f64,
    total_tokens: u64,
    mean_latency_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    feedback: Option<IterationFeedback>,
}

impl IterationStatistics {
    /// Build from raw counts. `failure_count` and `success_rate` are derived.
    pub fn from_counts(
        sample_count: usize,
        success_count: usize,
        total_tokens: u64,
        mean_latency_ms: f64,
    ) -> OptimizationResult<Self> {
        if success_count > sample_count {
            return Err(OptimizationError::InvalidStatistics(format!(
                "success count {success_count} exceeds sample count {sample_count}"
            )));
        }
        if !mean_latency_ms.is_finite() || mean_latency_ms < 0.0 {
            return Err(OptimizationError::InvalidStatistics(format!(
                "mean latency must be a non-negative number, got {mean_latency_ms}"
            )));
        }

        let success_rate = if sample_count == 0 {
            0.0
        } else {
            success_count as f64 / sample_count as f64
        };

        Ok(Self {
            sample_count,
            success_count,
            failure_count: sample_count - success_count,
            success_rate,
            total_tokens,
            mean_latency_ms,
            feedback: None,
        })
    }

    /// Statistics for an iteration with no samples.
    pub fn empty() -> Self {
        Self {
            sample_count: 0,
            success_count: 0,
            failure_count: 0,
            success_rate: 0.0,
            total_tokens: 0,
            mean_latency_ms: 0.0,
            feedback: None,
        }
    }

    #[must_use]
    pub fn with_feedback(mut self, feedback: IterationFeedback) -> Self {
        self.feedback = Some(feedback);
        self
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn success_count(&self) -> usize {
        self.success_count
    }

    pub fn failure_count(&self) -> usize {
        self.failure_count
    }

    pub fn success_rate(&self) -> f64 {
        self.success_rate
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_tokens
    }

    pub fn mean_latency_ms(&self) -> f64 {
        self.mean_latency_ms
    }

    pub fn feedback(&self) -> Option<&IterationFeedback> {
        self.feedback.as_ref()
    }
}

/// Failures of one postcondition within an iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostconditionFeedback {
    pub description: String,
    /// Every failure counts, even when its message was not kept.
    pub failure_count: usize,
    /// Up to [`MAX_MESSAGES_PER_POSTCONDITION`] distinct messages.
    pub sample_messages: Vec<String>,
}

/// Bounded digest of an iteration's failures, for targeted mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationFeedback {
    /// In order of first appearance.
    pub postcondition_failures: Vec<PostconditionFeedback>,
    pub mismatches: Vec<Mismatch>,
    pub failed_inputs: Vec<String>,
}

impl IterationFeedback {
    pub fn is_empty(&self) -> bool {
        self.postcondition_failures.is_empty()
            && self.mismatches.is_empty()
            && self.failed_inputs.is_empty()
    }

    pub fn postcondition(&self, description: &str) -> Option<&PostconditionFeedback> {
        self.postcondition_failures
            .iter()
            .find(|p| p.description == description)
    }
}

/// Accumulates [`IterationFeedback`] from failing samples, honoring the caps.
#[derive(Debug, Default)]
pub struct FeedbackCollector {
    feedback: IterationFeedback,
}

impl FeedbackCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one failing sample in. Passing samples are ignored.
    pub fn record(&mut self, outcome: &SampleOutcome) {
        if outcome.passed {
            return;
        }

        for failure in &outcome.postcondition_failures {
            self.record_postcondition(&failure.description, &failure.message);
        }

        if let Some(mismatch) = &outcome.mismatch {
            if self.feedback.mismatches.len() < MAX_MISMATCHES {
                self.feedback.mismatches.push(mismatch.clone());
            }
        }

        if let Some(input) = &outcome.input {
            let inputs = &mut self.feedback.failed_inputs;
            if inputs.len() < MAX_FAILED_INPUTS && !inputs.contains(input) {
                inputs.push(input.clone());
            }
        }
    }

    fn record_postcondition(&mut self, description: &str, message: &str) {
        let groups = &mut self.feedback.postcondition_failures;
        let index = match groups.iter().position(|g| g.description == description) {
            Some(index) => index,
            None => {
                groups.push(PostconditionFeedback {
                    description: description.to_string(),
                    failure_count: 0,
                    sample_messages: Vec::new(),
                });
                groups.len() - 1
            }
        };

        let group = &mut groups[index];
        group.failure_count += 1;
        if group.sample_messages.len() < MAX_MESSAGES_PER_POSTCONDITION
            && !group.sample_messages.iter().any(|m| m == message)
        {
            group.sample_messages.push(message.to_string());
        }
    }

    pub fn finish(self) -> IterationFeedback {
        self.feedback
    }
}
