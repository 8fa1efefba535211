//! The append-only audit trail of an optimization run.
//!
//! [`HistoryBuilder`] is the mutable accumulator owned by the optimization
//! loop. Everyone else only ever sees an [`OptimizationHistory`]: either a
//! partial snapshot taken mid-run (handed to mutators and termination
//! policies) or the final, validated history. `OptimizationHistory` exposes
//! no mutating methods, so a policy cannot alter what it was only meant to
//! read.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::factor::{FactorValue, FixedFactors};
use super::record::IterationRecord;
use super::termination::TerminationReason;
use crate::domain::errors::{OptimizationError, OptimizationResult};

/// Direction of optimization, applied to scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Objective {
    #[default]
    Maximize,
    Minimize,
}

impl Objective {
    /// Ordering of `candidate` relative to `incumbent`, where `Greater`
    /// means the candidate is better.
    pub fn compare(&self, candidate: f64, incumbent: f64) -> Ordering {
        match self {
            Objective::Maximize => candidate.total_cmp(&incumbent),
            Objective::Minimize => incumbent.total_cmp(&candidate),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Objective::Maximize => "maximize",
            Objective::Minimize => "minimize",
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view of an optimization run.
#[derive(Debug, Clone)]
pub struct OptimizationHistory<F> {
    run_id: Uuid,
    use_case_id: String,
    control_factor_name: String,
    fixed_factors: Arc<FixedFactors>,
    objective: Objective,
    samples_per_iteration: usize,
    scorer_description: String,
    mutator_description: String,
    termination_policy_description: String,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    termination_reason: Option<TerminationReason>,
    iterations: Vec<IterationRecord<F>>,
}

impl<F: FactorValue> OptimizationHistory<F> {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn use_case_id(&self) -> &str {
        &self.use_case_id
    }

    pub fn control_factor_name(&self) -> &str {
        &self.control_factor_name
    }

    pub fn fixed_factors(&self) -> &FixedFactors {
        &self.fixed_factors
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    pub fn samples_per_iteration(&self) -> usize {
        self.samples_per_iteration
    }

    pub fn scorer_description(&self) -> &str {
        &self.scorer_description
    }

    pub fn mutator_description(&self) -> &str {
        &self.mutator_description
    }

    pub fn termination_policy_description(&self) -> &str {
        &self.termination_policy_description
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// `None` on a partial snapshot.
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    /// `None` on a partial snapshot.
    pub fn termination_reason(&self) -> Option<&TerminationReason> {
        self.termination_reason.as_ref()
    }

    /// Whether this is the frozen history of a finished run.
    pub fn is_final(&self) -> bool {
        self.termination_reason.is_some()
    }

    pub fn iterations(&self) -> &[IterationRecord<F>] {
        &self.iterations
    }

    pub fn iteration_count(&self) -> usize {
        self.iterations.len()
    }

    pub fn last_iteration(&self) -> Option<&IterationRecord<F>> {
        self.iterations.last()
    }

    /// Successful iterations paired with their scores, in order.
    pub fn successful_iterations(&self) -> impl Iterator<Item = (&IterationRecord<F>, f64)> {
        self.iterations
            .iter()
            .filter(|r| r.is_success())
            .filter_map(|r| r.score().map(|score| (r, score)))
    }

    /// Best successful iteration under the objective.
    ///
    /// Equal scores are broken in favor of the shorter factor value; for
    /// non-textual factors every length is `0` and the earliest one wins.
    pub fn best_iteration(&self) -> Option<&IterationRecord<F>> {
        self.best_with_score().map(|(record, _)| record)
    }

    pub fn best_score(&self) -> Option<f64> {
        self.best_with_score().map(|(_, score)| score)
    }

    fn best_with_score(&self) -> Option<(&IterationRecord<F>, f64)> {
        self.successful_iterations()
            .fold(None, |best, (candidate, score)| match best {
                None => Some((candidate, score)),
                Some((incumbent, best_score)) => {
                    let better = match self.objective.compare(score, best_score) {
                        Ordering::Greater => true,
                        Ordering::Less => false,
                        Ordering::Equal => {
                            candidate.control_value().tie_break_len()
                                < incumbent.control_value().tie_break_len()
                        }
                    };
                    if better {
                        Some((candidate, score))
                    } else {
                        Some((incumbent, best_score))
                    }
                }
            })
    }

    /// Score of the first successful iteration, which is not necessarily
    /// iteration 0.
    pub fn initial_score(&self) -> Option<f64> {
        self.successful_iterations().next().map(|(_, score)| score)
    }

    /// `best - initial`, or `0.0` when either is absent.
    pub fn score_improvement(&self) -> f64 {
        match (self.best_score(), self.initial_score()) {
            (Some(best), Some(initial)) => best - initial,
            _ => 0.0,
        }
    }

    /// Improvement relative to `|initial|`, in percent. `0.0` when the initial
    /// score is absent or exactly zero.
    pub fn score_improvement_percent(&self) -> f64 {
        match self.initial_score() {
            Some(initial) if initial != 0.0 => self.score_improvement() / initial.abs() * 100.0,
            _ => 0.0,
        }
    }

    /// Tokens across every iteration, whatever its status.
    pub fn total_tokens(&self) -> u64 {
        self.iterations
            .iter()
            .map(|r| r.aggregate().statistics().total_tokens())
            .sum()
    }

    /// Wall-clock time from run start to `end_time`, or to `now` for a
    /// snapshot.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        self.end_time.unwrap_or(now) - self.start_time
    }
}

/// Mutable accumulator for an [`OptimizationHistory`].
#[derive(Debug, Clone)]
pub struct HistoryBuilder<F> {
    run_id: Uuid,
    use_case_id: Option<String>,
    control_factor_name: Option<String>,
    fixed_factors: Arc<FixedFactors>,
    objective: Objective,
    samples_per_iteration: usize,
    scorer_description: String,
    mutator_description: String,
    termination_policy_description: String,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    termination_reason: Option<TerminationReason>,
    iterations: Vec<IterationRecord<F>>,
}

impl<F: FactorValue> Default for HistoryBuilder<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FactorValue> HistoryBuilder<F> {
    /// Start a new history; the start time is now.
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            use_case_id: None,
            control_factor_name: None,
            fixed_factors: Arc::new(FixedFactors::new()),
            objective: Objective::default(),
            samples_per_iteration: 0,
            scorer_description: String::new(),
            mutator_description: String::new(),
            termination_policy_description: String::new(),
            start_time: Utc::now(),
            end_time: None,
            termination_reason: None,
            iterations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = run_id;
        self
    }

    #[must_use]
    pub fn with_use_case_id(mut self, use_case_id: impl Into<String>) -> Self {
        self.use_case_id = Some(use_case_id.into());
        self
    }

    #[must_use]
    pub fn with_control_factor_name(mut self, name: impl Into<String>) -> Self {
        self.control_factor_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_fixed_factors(mut self, fixed_factors: Arc<FixedFactors>) -> Self {
        self.fixed_factors = fixed_factors;
        self
    }

    #[must_use]
    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    #[must_use]
    pub fn with_samples_per_iteration(mut self, samples: usize) -> Self {
        self.samples_per_iteration = samples;
        self
    }

    #[must_use]
    pub fn with_descriptions(
        mut self,
        scorer: impl Into<String>,
        mutator: impl Into<String>,
        termination_policy: impl Into<String>,
    ) -> Self {
        self.scorer_description = scorer.into();
        self.mutator_description = mutator.into();
        self.termination_policy_description = termination_policy.into();
        self
    }

    #[must_use]
    pub fn with_start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = start_time;
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn iteration_count(&self) -> usize {
        self.iterations.len()
    }

    pub fn append(&mut self, record: IterationRecord<F>) -> &mut Self {
        self.iterations.push(record);
        self
    }

    pub fn set_termination_reason(&mut self, reason: TerminationReason) -> &mut Self {
        self.termination_reason = Some(reason);
        self
    }

    pub fn set_end_time(&mut self, end_time: DateTime<Utc>) -> &mut Self {
        self.end_time = Some(end_time);
        self
    }

    /// Frozen copy of everything committed so far. Termination reason and
    /// end time stay unset until [`build`](Self::build).
    pub fn snapshot(&self) -> OptimizationHistory<F> {
        OptimizationHistory {
            run_id: self.run_id,
            use_case_id: self.use_case_id.clone().unwrap_or_default(),
            control_factor_name: self.control_factor_name.clone().unwrap_or_default(),
            fixed_factors: Arc::clone(&self.fixed_factors),
            objective: self.objective,
            samples_per_iteration: self.samples_per_iteration,
            scorer_description: self.scorer_description.clone(),
            mutator_description: self.mutator_description.clone(),
            termination_policy_description: self.termination_policy_description.clone(),
            start_time: self.start_time,
            end_time: None,
            termination_reason: None,
            iterations: self.iterations.clone(),
        }
    }

    /// Validate required fields and freeze. The end time defaults to now.
    pub fn build(self) -> OptimizationResult<OptimizationHistory<F>> {
        let use_case_id = self
            .use_case_id
            .ok_or(OptimizationError::MissingHistoryField("use_case_id"))?;
        let control_factor_name = self
            .control_factor_name
            .ok_or(OptimizationError::MissingHistoryField("control_factor_name"))?;
        let termination_reason = self
            .termination_reason
            .ok_or(OptimizationError::MissingHistoryField("termination_reason"))?;

        let end_time = self.end_time.unwrap_or_else(Utc::now).max(self.start_time);

        Ok(OptimizationHistory {
            run_id: self.run_id,
            use_case_id,
            control_factor_name,
            fixed_factors: self.fixed_factors,
            objective: self.objective,
            samples_per_iteration: self.samples_per_iteration,
            scorer_description: self.scorer_description,
            mutator_description: self.mutator_description,
            termination_policy_description: self.termination_policy_description,
            start_time: self.start_time,
            end_time: Some(end_time),
            termination_reason: Some(termination_reason),
            iterations: self.iterations,
        })
    }
}
