//! Domain models for the optimization loop.

pub mod aggregate;
pub mod config;
pub mod factor;
pub mod history;
pub mod outcome;
pub mod record;
pub mod statistics;
pub mod termination;

pub use aggregate::IterationAggregate;
pub use config::{Config, LoggingConfig, OptimizationConfig, ReportConfig};
pub use factor::{FactorSuit, FactorValue, FixedFactors};
pub use history::{HistoryBuilder, Objective, OptimizationHistory};
pub use outcome::{Mismatch, PostconditionFailure, SampleOutcome, TOKEN_METADATA_KEYS};
pub use record::{IterationRecord, IterationStatus};
pub use statistics::{
    FeedbackCollector, IterationFeedback, IterationStatistics, PostconditionFeedback,
};
pub use termination::TerminationReason;
