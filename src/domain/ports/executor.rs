//! Sample executor port - interface for running the use case.

use async_trait::async_trait;

use crate::domain::errors::ExecutionError;
use crate::domain::models::{FactorSuit, FactorValue, SampleOutcome};

/// Runs the use case under optimization.
///
/// Implementations decide whether samples run sequentially, concurrently, or
/// remotely. A sample that fails its pass criteria is a normal outcome with
/// `passed == false`; `Err` is reserved for the executor itself being unable
/// to produce outcomes.
#[async_trait]
pub trait SampleExecutor<F: FactorValue>: Send + Sync {
    /// Execute `samples` samples with `factors` held fixed.
    ///
    /// Returning fewer outcomes than requested is allowed; the caller asks
    /// again for the remainder.
    async fn execute(
        &self,
        factors: &FactorSuit<F>,
        samples: usize,
    ) -> Result<Vec<SampleOutcome>, ExecutionError>;
}
