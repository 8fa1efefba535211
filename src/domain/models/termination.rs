//! Why an optimization run stopped.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The tagged cause for which the loop stopped.
///
/// Policy-driven reasons (`MaxIterations`, `NoImprovement`,
/// `TimeBudgetExhausted`, `Completed`) are graceful. The `*Failure` reasons
/// mean the run was forced to stop by a failing collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cause", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TerminationReason {
    MaxIterations { iterations: u32 },
    NoImprovement { window: u32 },
    TimeBudgetExhausted { budget_ms: u64 },
    MutationFailure { message: String },
    ScoringFailure { message: String },
    ExecutionFailure { message: String },
    /// The host stopped delivering samples before any policy fired.
    Cancelled { message: String },
    Completed,
}

impl TerminationReason {
    pub fn mutation_failure(message: impl Into<String>) -> Self {
        Self::MutationFailure {
            message: message.into(),
        }
    }

    pub fn scoring_failure(message: impl Into<String>) -> Self {
        Self::ScoringFailure {
            message: message.into(),
        }
    }

    pub fn execution_failure(message: impl Into<String>) -> Self {
        Self::ExecutionFailure {
            message: message.into(),
        }
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::Cancelled {
            message: message.into(),
        }
    }

    /// Stable upper-case code used in reports and logs.
    pub fn cause(&self) -> &'static str {
        match self {
            Self::MaxIterations { .. } => "MAX_ITERATIONS",
            Self::NoImprovement { .. } => "NO_IMPROVEMENT",
            Self::TimeBudgetExhausted { .. } => "TIME_BUDGET_EXHAUSTED",
            Self::MutationFailure { .. } => "MUTATION_FAILURE",
            Self::ScoringFailure { .. } => "SCORING_FAILURE",
            Self::ExecutionFailure { .. } => "EXECUTION_FAILURE",
            Self::Cancelled { .. } => "CANCELLED",
            Self::Completed => "COMPLETED",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::MaxIterations { iterations } => {
                format!("Reached maximum of {iterations} iterations")
            }
            Self::NoImprovement { window } => {
                format!("No improvement in the last {window} iterations")
            }
            Self::TimeBudgetExhausted { budget_ms } => {
                format!("Time budget of {budget_ms}ms exhausted")
            }
            Self::MutationFailure { message } => format!("Mutation failed: {message}"),
            Self::ScoringFailure { message } => format!("Scoring failed: {message}"),
            Self::ExecutionFailure { message } => format!("Sample execution failed: {message}"),
            Self::Cancelled { message } => format!("Cancelled: {message}"),
            Self::Completed => "Optimization completed".to_string(),
        }
    }

    /// Whether a failing collaborator forced the stop.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::MutationFailure { .. } | Self::ScoringFailure { .. } | Self::ExecutionFailure { .. }
        )
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.cause(), self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_reason_has_message() {
        let reasons = [
            TerminationReason::MaxIterations { iterations: 3 },
            TerminationReason::NoImprovement { window: 2 },
            TerminationReason::TimeBudgetExhausted { budget_ms: 500 },
            TerminationReason::mutation_failure("exhausted"),
            TerminationReason::scoring_failure("nan"),
            TerminationReason::execution_failure("runner down"),
            TerminationReason::cancelled("host stopped"),
            TerminationReason::Completed,
        ];
        for reason in &reasons {
            assert!(!reason.message().is_empty());
            assert!(reason.to_string().starts_with(reason.cause()));
        }
    }

    #[test]
    fn test_failure_classification() {
        assert!(TerminationReason::scoring_failure("x").is_failure());
        assert!(TerminationReason::execution_failure("x").is_failure());
        assert!(!TerminationReason::cancelled("x").is_failure());
        assert!(!TerminationReason::MaxIterations { iterations: 1 }.is_failure());
    }

    #[test]
    fn test_serde_tagging() {
        let json =
            serde_json::to_value(TerminationReason::NoImprovement { window: 4 }).unwrap();
        assert_eq!(json["cause"], "NO_IMPROVEMENT");
        assert_eq!(json["window"], 4);
    }
}
