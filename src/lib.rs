//! factor-tuner - iterative optimization of a single control factor
//!
//! factor-tuner improves one input (the *control factor*, e.g. a system
//! prompt) of a non-deterministic use case. Every iteration executes the use
//! case a fixed number of times, aggregates the sampled outcomes into
//! statistics, scores the aggregate, asks a mutator for the next value and
//! consults a termination policy. Every iteration is kept in an append-only
//! history, which is finally sealed into a fingerprinted audit report.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, errors and port traits
//! - **Service Layer** (`services`): stock scorers, mutators, termination
//!   policies, the statistics aggregator and the report codec
//! - **Application Layer** (`application`): the optimization state machine,
//!   the executor-driven orchestrator and the channel-fed session
//! - **Infrastructure Layer** (`infrastructure`): configuration, logging and
//!   report files
//! - **Adapters** (`adapters`): sample executors
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use factor_tuner::adapters::executors::MockExecutor;
//! use factor_tuner::application::{OptimizationSetup, Orchestrator};
//! use factor_tuner::domain::models::{FactorSuit, FixedFactors};
//! use factor_tuner::services::{MaxIterationsPolicy, NoOpMutator, SuccessRateScorer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let suit = FactorSuit::new("prompt", "Be brief.".to_string(), Arc::new(FixedFactors::new()))?;
//!     let setup = OptimizationSetup::new(
//!         "summarize",
//!         suit,
//!         Arc::new(SuccessRateScorer::new()),
//!         Arc::new(NoOpMutator),
//!         Arc::new(MaxIterationsPolicy::new(3)),
//!     );
//!     let history = Orchestrator::new(setup).run(&MockExecutor::new()).await?;
//!     println!("{:?}", history.termination_reason());
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{
    LoopStep, OptimizationLoop, OptimizationSession, OptimizationSetup, Orchestrator,
    SampleSink, SessionState,
};
pub use domain::errors::{
    ExecutionError, MutationError, OptimizationError, OptimizationResult, ReportError,
    ScoringError,
};
pub use domain::models::{
    Config, FactorSuit, FactorValue, FixedFactors, IterationAggregate, IterationRecord,
    IterationStatistics, IterationStatus, Objective, OptimizationHistory, SampleOutcome,
    TerminationReason,
};
pub use domain::ports::{Mutator, ProgressReporter, SampleExecutor, Scorer, TerminationPolicy};
pub use infrastructure::config::{ConfigError, ConfigLoader};
