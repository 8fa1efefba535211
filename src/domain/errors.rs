//! Domain errors for the factor tuner.
//!
//! Strategy failures (execution, scoring, mutation) each have their own error
//! type so that the optimization loop can map them onto distinct iteration
//! statuses and termination reasons. Run-level problems surface as
//! [`OptimizationError`].

use thiserror::Error;

/// The sample executor could not produce outcomes at all.
///
/// This is an infrastructure failure, not an individual sample failing its
/// pass criteria. Individual failures are folded into the statistics.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Sample execution failed: {0}")]
pub struct ExecutionError(pub String);

impl ExecutionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

/// A scorer failed on an otherwise valid aggregate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Scoring failed: {0}")]
pub struct ScoringError(pub String);

impl ScoringError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

/// A mutator could not produce, or refused to accept, the next factor value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MutationError {
    #[error("Mutation failed: {0}")]
    Failed(String),

    #[error("Mutated value rejected by validation: {0}")]
    Rejected(String),
}

impl MutationError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }

    /// The failure without the "Mutation failed" prefix, for termination
    /// reasons that carry their own.
    pub fn reason(&self) -> String {
        match self {
            Self::Failed(message) => message.clone(),
            Self::Rejected(message) => format!("rejected by validation: {message}"),
        }
    }
}

/// Run-level errors: misconfiguration and violated model invariants.
#[derive(Debug, Error)]
pub enum OptimizationError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Optimization history is missing required field: {0}")]
    MissingHistoryField(&'static str),

    #[error("Invalid iteration statistics: {0}")]
    InvalidStatistics(String),

    #[error("Invalid iteration aggregate: {0}")]
    InvalidAggregate(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Optimization session is closed")]
    SessionClosed,

    #[error("Optimization session task aborted: {0}")]
    SessionAborted(String),
}

pub type OptimizationResult<T> = Result<T, OptimizationError>;

impl From<serde_json::Error> for OptimizationError {
    fn from(err: serde_json::Error) -> Self {
        OptimizationError::Serialization(err.to_string())
    }
}

/// Errors raised while rendering or loading a persisted audit report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Only a finalized history can be rendered to a report")]
    NotFinal,

    #[error("Report has no contentFingerprint line")]
    FingerprintMissing,

    #[error("Report fingerprint mismatch: recorded {recorded}, computed {computed}")]
    FingerprintMismatch { recorded: String, computed: String },

    #[error("Report YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Report I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ExecutionError::new("runner crashed").to_string(),
            "Sample execution failed: runner crashed"
        );
        assert_eq!(
            ScoringError::new("no samples").to_string(),
            "Scoring failed: no samples"
        );
        assert_eq!(
            MutationError::rejected("too long").to_string(),
            "Mutated value rejected by validation: too long"
        );
        assert_eq!(
            MutationError::rejected("too long").reason(),
            "rejected by validation: too long"
        );
        assert_eq!(
            OptimizationError::MissingHistoryField("termination_reason").to_string(),
            "Optimization history is missing required field: termination_reason"
        );
    }

    #[test]
    fn test_fingerprint_mismatch_message() {
        let err = ReportError::FingerprintMismatch {
            recorded: "abc".to_string(),
            computed: "def".to_string(),
        };
        assert!(err.to_string().contains("recorded abc"));
        assert!(err.to_string().contains("computed def"));
    }
}
