//! Executor-driven optimization runs.

use tracing::{instrument, warn};

use super::optimization_loop::{OptimizationLoop, OptimizationSetup};
use crate::domain::errors::{ExecutionError, OptimizationResult};
use crate::domain::models::{FactorValue, OptimizationHistory};
use crate::domain::ports::SampleExecutor;

/// Drives an [`OptimizationLoop`] by calling a [`SampleExecutor`] directly.
///
/// Each iteration asks the executor for the samples still missing until the
/// iteration is full. Strategy failures end the run but never surface as
/// `Err`: they are recorded in the returned history, which is always final.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use factor_tuner::application::{Orchestrator, OptimizationSetup};
/// use factor_tuner::adapters::executors::MockExecutor;
/// use factor_tuner::domain::models::{FactorSuit, FixedFactors};
/// use factor_tuner::services::{MaxIterationsPolicy, NoOpMutator, SuccessRateScorer};
///
/// # async fn example() -> anyhow::Result<()> {
/// let suit = FactorSuit::new("prompt", "Be brief.".to_string(), Arc::new(FixedFactors::new()))?;
/// let setup = OptimizationSetup::new(
///     "summarize",
///     suit,
///     Arc::new(SuccessRateScorer::new()),
///     Arc::new(NoOpMutator),
///     Arc::new(MaxIterationsPolicy::new(3)),
/// );
/// let history = Orchestrator::new(setup).run(&MockExecutor::new()).await?;
/// println!("best score: {:?}", history.best_score());
/// # Ok(())
/// # }
/// ```
pub struct Orchestrator<F: FactorValue> {
    setup: OptimizationSetup<F>,
}

impl<F: FactorValue> Orchestrator<F> {
    pub fn new(setup: OptimizationSetup<F>) -> Self {
        Self { setup }
    }

    /// Run to termination and return the finalized history.
    #[instrument(skip_all, fields(use_case = %self.setup.use_case_id))]
    pub async fn run<E>(self, executor: &E) -> OptimizationResult<OptimizationHistory<F>>
    where
        E: SampleExecutor<F> + ?Sized,
    {
        let mut optimization = OptimizationLoop::new(self.setup)?;

        while !optimization.is_terminated() {
            let needed = optimization.samples_needed();
            let suit = optimization.current_suit().clone();

            let outcomes = match executor.execute(&suit, needed).await {
                Ok(outcomes) if outcomes.is_empty() => {
                    optimization.record_execution_failure(&ExecutionError::new(format!(
                        "executor returned no outcomes for {needed} requested samples"
                    )))?;
                    continue;
                }
                Ok(outcomes) => outcomes,
                Err(err) => {
                    optimization.record_execution_failure(&err)?;
                    continue;
                }
            };

            if outcomes.len() > needed {
                warn!(
                    run_id = %optimization.run_id(),
                    iteration = optimization.current_iteration(),
                    requested = needed,
                    received = outcomes.len(),
                    "Executor returned surplus outcomes, discarding the excess"
                );
            }

            for outcome in outcomes.into_iter().take(needed) {
                optimization.record_sample(outcome).await?;
            }
        }

        optimization.finish()
    }
}
