//! Domain layer for factor-tuner
//!
//! Models, errors, and the port traits that strategies and executors implement.
//! Nothing here performs I/O.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{
    ExecutionError, MutationError, OptimizationError, OptimizationResult, ReportError,
    ScoringError,
};
