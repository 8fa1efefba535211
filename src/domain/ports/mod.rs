//! Port trait definitions (Hexagonal Architecture)
//!
//! The optimization loop talks to its collaborators only through these traits:
//! - SampleExecutor: runs the use case N times for a factor suit
//! - Scorer: reduces an iteration aggregate to a scalar score
//! - Mutator: proposes the next control factor value
//! - TerminationPolicy: decides when to stop
//! - ProgressReporter: side channel for observability

pub mod executor;
pub mod mutator;
pub mod progress;
pub mod scorer;
pub mod termination_policy;

pub use executor::SampleExecutor;
pub use mutator::Mutator;
pub use progress::{NullProgressReporter, ProgressReporter, ProgressSnapshot};
pub use scorer::Scorer;
pub use termination_policy::TerminationPolicy;
