//! Mutator port.

use async_trait::async_trait;

use crate::domain::errors::MutationError;
use crate::domain::models::{FactorValue, OptimizationHistory};

/// Proposes the next control factor value.
///
/// The history is a frozen snapshot of every committed iteration. Mutators
/// may call out to other systems (a generative model rewriting a prompt, for
/// instance), hence the async signature.
#[async_trait]
pub trait Mutator<F: FactorValue>: Send + Sync {
    async fn mutate(
        &self,
        current: &F,
        history: &OptimizationHistory<F>,
    ) -> Result<F, MutationError>;

    /// Domain checks run on every mutated value. A rejection ends the run
    /// exactly like a mutation failure.
    fn validate(&self, _value: &F) -> Result<(), MutationError> {
        Ok(())
    }

    /// Human-readable description for the audit report.
    fn description(&self) -> String;
}
