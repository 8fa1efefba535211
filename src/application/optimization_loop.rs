//! The optimization state machine.
//!
//! [`OptimizationLoop`] owns everything that changes during a run: the
//! outcome buffer of the iteration being collected, the history builder and
//! the current factor suit. It is driven one event at a time by a single
//! owner (the [`Orchestrator`](super::Orchestrator) or the
//! [`OptimizationSession`](super::OptimizationSession) actor), so the
//! completion sequence
//!
//! ```text
//! aggregate -> score -> record -> check termination -> mutate -> advance
//! ```
//!
//! runs exactly once per iteration and never interleaves with sample intake.
//! Observers read progress through the shared [`ProgressCounters`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::progress::ProgressCounters;
use crate::domain::errors::{ExecutionError, OptimizationError, OptimizationResult};
use crate::domain::models::{
    FactorSuit, FactorValue, HistoryBuilder, IterationAggregate, IterationRecord, Objective,
    OptimizationConfig, OptimizationHistory, SampleOutcome, TerminationReason,
};
use crate::domain::ports::{
    Mutator, NullProgressReporter, ProgressReporter, Scorer, TerminationPolicy,
};
use crate::services::StatisticsAggregator;

/// Strategies and settings for one run.
pub struct OptimizationSetup<F: FactorValue> {
    pub use_case_id: String,
    pub initial_suit: FactorSuit<F>,
    pub samples_per_iteration: usize,
    pub objective: Objective,
    pub collect_feedback: bool,
    pub scorer: Arc<dyn Scorer<F>>,
    pub mutator: Arc<dyn Mutator<F>>,
    pub termination_policy: Arc<dyn TerminationPolicy<F>>,
    pub progress: Arc<dyn ProgressReporter>,
}

impl<F: FactorValue> OptimizationSetup<F> {
    pub fn new(
        use_case_id: impl Into<String>,
        initial_suit: FactorSuit<F>,
        scorer: Arc<dyn Scorer<F>>,
        mutator: Arc<dyn Mutator<F>>,
        termination_policy: Arc<dyn TerminationPolicy<F>>,
    ) -> Self {
        let defaults = OptimizationConfig::default();
        Self {
            use_case_id: use_case_id.into(),
            initial_suit,
            samples_per_iteration: defaults.samples_per_iteration,
            objective: defaults.objective,
            collect_feedback: defaults.collect_feedback,
            scorer,
            mutator,
            termination_policy,
            progress: Arc::new(NullProgressReporter),
        }
    }

    /// Take sample count, objective and feedback collection from `config`.
    #[must_use]
    pub fn with_config(mut self, config: &OptimizationConfig) -> Self {
        self.samples_per_iteration = config.samples_per_iteration;
        self.objective = config.objective;
        self.collect_feedback = config.collect_feedback;
        self
    }

    #[must_use]
    pub fn with_samples_per_iteration(mut self, samples: usize) -> Self {
        self.samples_per_iteration = samples;
        self
    }

    #[must_use]
    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    #[must_use]
    pub fn with_feedback(mut self, collect_feedback: bool) -> Self {
        self.collect_feedback = collect_feedback;
        self
    }

    #[must_use]
    pub fn with_progress_reporter(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    fn validate(&self) -> OptimizationResult<()> {
        if self.use_case_id.trim().is_empty() {
            return Err(OptimizationError::InvalidConfiguration(
                "use case id cannot be empty".to_string(),
            ));
        }
        if self.samples_per_iteration == 0 {
            return Err(OptimizationError::InvalidConfiguration(
                "samples_per_iteration must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// What a single event did to the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopStep {
    /// The sample was buffered; the iteration is still collecting.
    Accepted,
    /// An iteration completed and the loop moved on to `iteration`.
    Advanced { iteration: u32 },
    /// The run is over. Events after this point are ignored.
    Terminated,
}

enum Phase<F> {
    Collecting {
        iteration: u32,
        suit: FactorSuit<F>,
        started_at: DateTime<Utc>,
    },
    Terminated {
        last_suit: FactorSuit<F>,
    },
}

/// Single-writer state machine for one optimization run.
pub struct OptimizationLoop<F: FactorValue> {
    scorer: Arc<dyn Scorer<F>>,
    mutator: Arc<dyn Mutator<F>>,
    policy: Arc<dyn TerminationPolicy<F>>,
    progress: Arc<dyn ProgressReporter>,
    aggregator: StatisticsAggregator,
    samples_per_iteration: usize,
    builder: HistoryBuilder<F>,
    buffer: Vec<SampleOutcome>,
    phase: Phase<F>,
    counters: Arc<ProgressCounters>,
}

impl<F: FactorValue> OptimizationLoop<F> {
    pub fn new(setup: OptimizationSetup<F>) -> OptimizationResult<Self> {
        setup.validate()?;

        let builder = HistoryBuilder::new()
            .with_use_case_id(setup.use_case_id.clone())
            .with_control_factor_name(setup.initial_suit.control_name())
            .with_fixed_factors(Arc::new(setup.initial_suit.fixed().clone()))
            .with_objective(setup.objective)
            .with_samples_per_iteration(setup.samples_per_iteration)
            .with_descriptions(
                setup.scorer.description(),
                setup.mutator.description(),
                setup.termination_policy.description(),
            );

        let counters = Arc::new(ProgressCounters::new(
            builder.run_id(),
            setup.samples_per_iteration,
        ));
        let aggregator = if setup.collect_feedback {
            StatisticsAggregator::with_feedback()
        } else {
            StatisticsAggregator::new()
        };

        info!(
            run_id = %builder.run_id(),
            use_case = %setup.use_case_id,
            control_factor = %setup.initial_suit.control_name(),
            samples_per_iteration = setup.samples_per_iteration,
            objective = %setup.objective,
            "Optimization run started"
        );

        Ok(Self {
            scorer: setup.scorer,
            mutator: setup.mutator,
            policy: setup.termination_policy,
            progress: setup.progress,
            aggregator,
            samples_per_iteration: setup.samples_per_iteration,
            builder,
            buffer: Vec::with_capacity(setup.samples_per_iteration),
            phase: Phase::Collecting {
                iteration: 0,
                suit: setup.initial_suit,
                started_at: Utc::now(),
            },
            counters,
        })
    }

    pub fn run_id(&self) -> Uuid {
        self.builder.run_id()
    }

    pub fn counters(&self) -> Arc<ProgressCounters> {
        Arc::clone(&self.counters)
    }

    /// Iteration being collected, or the last one reached once terminated.
    pub fn current_iteration(&self) -> u32 {
        self.counters.iteration()
    }

    /// Factor suit samples must currently be executed with.
    pub fn current_suit(&self) -> &FactorSuit<F> {
        match &self.phase {
            Phase::Collecting { suit, .. } => suit,
            Phase::Terminated { last_suit } => last_suit,
        }
    }

    /// Samples still missing from the current iteration.
    pub fn samples_needed(&self) -> usize {
        match self.phase {
            Phase::Collecting { .. } => self.samples_per_iteration - self.buffer.len(),
            Phase::Terminated { .. } => 0,
        }
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.phase, Phase::Terminated { .. })
    }

    /// Read-only view of every committed iteration.
    pub fn snapshot(&self) -> OptimizationHistory<F> {
        self.builder.snapshot()
    }

    /// Buffer one outcome; the outcome that fills the iteration runs the
    /// completion sequence before this returns.
    pub async fn record_sample(&mut self, outcome: SampleOutcome) -> OptimizationResult<LoopStep> {
        if self.is_terminated() {
            debug!(run_id = %self.run_id(), "Ignoring sample after termination");
            return Ok(LoopStep::Terminated);
        }

        self.buffer.push(outcome);
        self.counters.record_sample();
        self.progress.on_sample(&self.counters.snapshot());

        if self.buffer.len() < self.samples_per_iteration {
            return Ok(LoopStep::Accepted);
        }
        self.complete_iteration().await
    }

    /// The executor could not produce outcomes for the current iteration.
    ///
    /// The samples buffered so far are aggregated into an `EXECUTION_FAILED`
    /// record and the run terminates without scoring.
    pub fn record_execution_failure(
        &mut self,
        error: &ExecutionError,
    ) -> OptimizationResult<LoopStep> {
        let Phase::Collecting {
            iteration,
            suit,
            started_at,
        } = &self.phase
        else {
            return Ok(LoopStep::Terminated);
        };

        let outcomes = std::mem::take(&mut self.buffer);
        let statistics = self.aggregator.aggregate(&outcomes)?;
        let aggregate = IterationAggregate::new(
            *iteration,
            suit.clone(),
            statistics,
            *started_at,
            Utc::now().max(*started_at),
        )?;

        warn!(
            run_id = %self.run_id(),
            iteration = *iteration,
            collected = outcomes.len(),
            error = %error.message(),
            "Sample execution failed"
        );

        self.builder.append(IterationRecord::execution_failed(
            aggregate,
            error.message(),
        ));
        self.terminate(TerminationReason::execution_failure(error.message()));
        Ok(LoopStep::Terminated)
    }

    /// Stop at the host's request. The partially collected iteration, if
    /// any, is discarded.
    pub fn cancel(&mut self, message: impl Into<String>) {
        if self.is_terminated() {
            return;
        }
        if !self.buffer.is_empty() {
            warn!(
                run_id = %self.run_id(),
                iteration = self.current_iteration(),
                discarded = self.buffer.len(),
                "Discarding partially collected iteration"
            );
            self.buffer.clear();
            self.counters.discard_iteration_samples();
        }
        self.terminate(TerminationReason::cancelled(message));
    }

    /// Freeze the history. A loop that never terminated is cancelled first.
    pub fn finish(mut self) -> OptimizationResult<OptimizationHistory<F>> {
        if !self.is_terminated() {
            self.cancel("run finished before any termination condition fired");
        }
        self.builder.build()
    }

    async fn complete_iteration(&mut self) -> OptimizationResult<LoopStep> {
        let Phase::Collecting {
            iteration,
            suit,
            started_at,
        } = &self.phase
        else {
            return Ok(LoopStep::Terminated);
        };
        let iteration = *iteration;
        let current_value = suit.control_value().clone();

        let outcomes = std::mem::take(&mut self.buffer);
        let statistics = self.aggregator.aggregate(&outcomes)?;
        let aggregate = IterationAggregate::new(
            iteration,
            suit.clone(),
            statistics,
            *started_at,
            Utc::now().max(*started_at),
        )?;

        let score = match self.scorer.score(&aggregate) {
            Ok(score) if score.is_finite() => score,
            Ok(score) => {
                return Ok(self.fail_scoring(
                    aggregate,
                    format!("scorer returned a non-finite score ({score})"),
                ));
            }
            Err(err) => return Ok(self.fail_scoring(aggregate, err.message().to_string())),
        };

        let record = match self.scorer.minimum_acceptance_threshold() {
            Some(threshold) if score < threshold => {
                IterationRecord::below_threshold(aggregate, score, threshold)
            }
            _ => IterationRecord::success(aggregate, score),
        };
        let status = record.status();
        self.builder.append(record);

        let history = self.builder.snapshot();
        self.counters.set_best_score(history.best_score());

        info!(
            run_id = %self.run_id(),
            iteration,
            score,
            status = %status,
            success_rate = ?history
                .last_iteration()
                .map(|r| r.aggregate().statistics().success_rate()),
            value = %current_value.display_value(),
            "Iteration complete"
        );

        if let Some(reason) = self.policy.should_terminate(&history) {
            self.terminate(reason);
            return Ok(LoopStep::Terminated);
        }

        let next_value = match self.mutator.mutate(&current_value, &history).await {
            Ok(value) => value,
            Err(err) => {
                warn!(run_id = %self.run_id(), iteration, error = %err, "Mutation failed");
                self.terminate(TerminationReason::mutation_failure(err.reason()));
                return Ok(LoopStep::Terminated);
            }
        };
        if let Err(err) = self.mutator.validate(&next_value) {
            warn!(run_id = %self.run_id(), iteration, error = %err, "Mutated value rejected");
            self.terminate(TerminationReason::mutation_failure(err.reason()));
            return Ok(LoopStep::Terminated);
        }

        let next_iteration = iteration + 1;
        let next_suit = self.current_suit().with_control_value(next_value);
        debug!(
            run_id = %self.run_id(),
            iteration = next_iteration,
            value = %next_suit.control_value().display_value(),
            "Advancing to next iteration"
        );
        self.phase = Phase::Collecting {
            iteration: next_iteration,
            suit: next_suit,
            started_at: Utc::now(),
        };
        self.counters.advance_iteration(next_iteration);
        Ok(LoopStep::Advanced {
            iteration: next_iteration,
        })
    }

    fn fail_scoring(&mut self, aggregate: IterationAggregate<F>, message: String) -> LoopStep {
        warn!(
            run_id = %self.run_id(),
            iteration = aggregate.iteration_number(),
            error = %message,
            "Scoring failed"
        );
        self.builder
            .append(IterationRecord::scoring_failed(aggregate, message.clone()));
        self.terminate(TerminationReason::scoring_failure(message));
        LoopStep::Terminated
    }

    fn terminate(&mut self, reason: TerminationReason) {
        let last_suit = self.current_suit().clone();
        info!(
            run_id = %self.run_id(),
            iterations = self.builder.iteration_count(),
            reason = reason.cause(),
            message = %reason.message(),
            "Optimization run terminated"
        );
        self.progress.on_complete(&self.counters.snapshot(), &reason);
        self.builder.set_termination_reason(reason);
        self.builder.set_end_time(Utc::now());
        self.phase = Phase::Terminated { last_suit };
    }
}
