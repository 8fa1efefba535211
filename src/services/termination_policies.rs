//! Stock termination policies and their OR-composite.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::domain::models::{
    FactorValue, OptimizationConfig, OptimizationHistory, TerminationReason,
};
use crate::domain::ports::TerminationPolicy;

/// Fires once `max_iterations` iterations are recorded.
#[derive(Debug, Clone, Copy)]
pub struct MaxIterationsPolicy {
    max_iterations: u32,
}

impl MaxIterationsPolicy {
    pub fn new(max_iterations: u32) -> Self {
        Self { max_iterations }
    }
}

impl<F: FactorValue> TerminationPolicy<F> for MaxIterationsPolicy {
    fn should_terminate(&self, history: &OptimizationHistory<F>) -> Option<TerminationReason> {
        (history.iteration_count() >= self.max_iterations as usize).then_some(
            TerminationReason::MaxIterations {
                iterations: self.max_iterations,
            },
        )
    }

    fn description(&self) -> String {
        format!("max iterations ({})", self.max_iterations)
    }
}

/// Fires when the best successful iteration is more than `window`
/// iterations behind the latest one.
///
/// Needs at least `window + 1` iterations, and never fires while there is no
/// successful iteration to compare against.
#[derive(Debug, Clone, Copy)]
pub struct NoImprovementPolicy {
    window: u32,
}

impl NoImprovementPolicy {
    pub fn new(window: u32) -> Self {
        Self { window }
    }
}

impl<F: FactorValue> TerminationPolicy<F> for NoImprovementPolicy {
    fn should_terminate(&self, history: &OptimizationHistory<F>) -> Option<TerminationReason> {
        let window = self.window as usize;
        let count = history.iteration_count();
        if count < window + 1 {
            return None;
        }

        let best = history.best_iteration()?;
        let best_index = history
            .iterations()
            .iter()
            .position(|r| std::ptr::eq(r, best))?;
        let latest_index = count - 1;

        (latest_index - best_index >= window)
            .then_some(TerminationReason::NoImprovement { window: self.window })
    }

    fn description(&self) -> String {
        format!("no improvement ({} iteration window)", self.window)
    }
}

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Fires once the wall-clock time since run start reaches the budget.
pub struct TimeBudgetPolicy {
    budget: Duration,
    clock: Clock,
}

impl TimeBudgetPolicy {
    pub fn new(budget: Duration) -> Self {
        Self {
            budget,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the wall clock, for deterministic tests.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    fn budget_ms(&self) -> u64 {
        u64::try_from(self.budget.as_millis()).unwrap_or(u64::MAX)
    }
}

impl<F: FactorValue> TerminationPolicy<F> for TimeBudgetPolicy {
    fn should_terminate(&self, history: &OptimizationHistory<F>) -> Option<TerminationReason> {
        let elapsed = (self.clock)() - history.start_time();
        let elapsed = elapsed.to_std().unwrap_or(Duration::ZERO);
        (elapsed >= self.budget).then(|| TerminationReason::TimeBudgetExhausted {
            budget_ms: self.budget_ms(),
        })
    }

    fn description(&self) -> String {
        format!("time budget ({}ms)", self.budget_ms())
    }
}

/// Logical OR over sub-policies.
///
/// Sub-policies are evaluated in declared order and the first reason wins;
/// order only decides which reason is reported when several would fire.
pub struct CompositeTerminationPolicy<F> {
    policies: Vec<Arc<dyn TerminationPolicy<F>>>,
}

impl<F: FactorValue> CompositeTerminationPolicy<F> {
    pub fn new(policies: Vec<Arc<dyn TerminationPolicy<F>>>) -> Self {
        Self { policies }
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl<F: FactorValue> TerminationPolicy<F> for CompositeTerminationPolicy<F> {
    fn should_terminate(&self, history: &OptimizationHistory<F>) -> Option<TerminationReason> {
        self.policies
            .iter()
            .find_map(|policy| policy.should_terminate(history))
    }

    fn description(&self) -> String {
        let parts: Vec<String> = self.policies.iter().map(|p| p.description()).collect();
        format!("any of [{}]", parts.join(", "))
    }
}

/// Policy from configuration: max iterations, then no-improvement and time
/// budget when configured.
pub fn termination_policy_from_config<F: FactorValue>(
    config: &OptimizationConfig,
) -> CompositeTerminationPolicy<F> {
    let mut policies: Vec<Arc<dyn TerminationPolicy<F>>> =
        vec![Arc::new(MaxIterationsPolicy::new(config.max_iterations))];

    if let Some(window) = config.no_improvement_window {
        policies.push(Arc::new(NoImprovementPolicy::new(window)));
    }
    if let Some(budget_ms) = config.time_budget_ms {
        policies.push(Arc::new(TimeBudgetPolicy::new(Duration::from_millis(
            budget_ms,
        ))));
    }

    CompositeTerminationPolicy::new(policies)
}
