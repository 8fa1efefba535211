//! One entry of the optimization history.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::aggregate::IterationAggregate;
use super::factor::FactorValue;

/// How an iteration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IterationStatus {
    /// Scored, and the score met any acceptance threshold.
    Success,
    /// The executor could not produce outcomes.
    ExecutionFailed,
    /// The scorer failed on the aggregate.
    ScoringFailed,
    /// Scored, but below the scorer's minimum acceptance threshold.
    BelowThreshold,
}

impl IterationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IterationStatus::Success => "SUCCESS",
            IterationStatus::ExecutionFailed => "EXECUTION_FAILED",
            IterationStatus::ScoringFailed => "SCORING_FAILED",
            IterationStatus::BelowThreshold => "BELOW_THRESHOLD",
        }
    }
}

impl fmt::Display for IterationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An iteration's aggregate together with its score and status.
///
/// Only the named constructors create records, so `status == Success` holds
/// exactly when `failure_reason` is absent.
#[derive(Debug, Clone)]
pub struct IterationRecord<F> {
    aggregate: IterationAggregate<F>,
    score: Option<f64>,
    status: IterationStatus,
    failure_reason: Option<String>,
}

impl<F: FactorValue> IterationRecord<F> {
    pub fn success(aggregate: IterationAggregate<F>, score: f64) -> Self {
        Self {
            aggregate,
            score: Some(score),
            status: IterationStatus::Success,
            failure_reason: None,
        }
    }

    pub fn below_threshold(aggregate: IterationAggregate<F>, score: f64, threshold: f64) -> Self {
        Self {
            aggregate,
            score: Some(score),
            status: IterationStatus::BelowThreshold,
            failure_reason: Some(format!(
                "score {score:.4} is below the minimum acceptance threshold {threshold:.4}"
            )),
        }
    }

    pub fn execution_failed(aggregate: IterationAggregate<F>, reason: impl Into<String>) -> Self {
        Self {
            aggregate,
            score: None,
            status: IterationStatus::ExecutionFailed,
            failure_reason: Some(reason.into()),
        }
    }

    pub fn scoring_failed(aggregate: IterationAggregate<F>, reason: impl Into<String>) -> Self {
        Self {
            aggregate,
            score: None,
            status: IterationStatus::ScoringFailed,
            failure_reason: Some(reason.into()),
        }
    }

    pub fn aggregate(&self) -> &IterationAggregate<F> {
        &self.aggregate
    }

    pub fn iteration_number(&self) -> u32 {
        self.aggregate.iteration_number()
    }

    pub fn control_value(&self) -> &F {
        self.aggregate.control_value()
    }

    /// Present for `Success` and `BelowThreshold`.
    pub fn score(&self) -> Option<f64> {
        self.score
    }

    pub fn status(&self) -> IterationStatus {
        self.status
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn is_success(&self) -> bool {
        self.status == IterationStatus::Success
    }
}
