//! Application layer: the optimization control loop and the two ways of
//! feeding it samples.
//!
//! - [`Orchestrator`] calls a [`SampleExecutor`](crate::domain::ports::SampleExecutor)
//!   itself, iteration by iteration.
//! - [`OptimizationSession`] accepts sample completions from a host runtime
//!   that executes samples on its own schedule.
//!
//! Both are thin drivers around the same [`OptimizationLoop`].

pub mod optimization_loop;
pub mod orchestrator;
pub mod progress;
pub mod session;

pub use optimization_loop::{LoopStep, OptimizationLoop, OptimizationSetup};
pub use orchestrator::Orchestrator;
pub use progress::{ProgressCounters, TracingProgressReporter};
pub use session::{OptimizationSession, SampleSink, SessionState};
