//! Common test utilities for integration tests
//!
//! Shared fixtures and scripted strategies used across the integration test
//! files. Not every file uses every helper.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use factor_tuner::application::OptimizationSetup;
use factor_tuner::domain::errors::{MutationError, ScoringError};
use factor_tuner::domain::models::{
    FactorSuit, FixedFactors, IterationAggregate, OptimizationHistory, SampleOutcome,
};
use factor_tuner::domain::ports::{Mutator, Scorer};
use factor_tuner::services::{MaxIterationsPolicy, NoOpMutator, SuccessRateScorer};
use tempfile::TempDir;

/// Create a temporary directory for test isolation
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Setup test logging
///
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn suit(value: &str) -> FactorSuit<String> {
    let fixed = FixedFactors::new()
        .with("model", "small-1")
        .with("temperature", 0.2);
    FactorSuit::new("system_prompt", value.to_string(), Arc::new(fixed))
        .expect("control factor does not collide with fixed factors")
}

pub fn pass() -> SampleOutcome {
    SampleOutcome::pass(Duration::from_millis(5)).with_tokens(10)
}

pub fn fail() -> SampleOutcome {
    SampleOutcome::fail(Duration::from_millis(5)).with_tokens(10)
}

/// Success-rate scoring, no mutation, stop after `max_iterations`.
pub fn basic_setup(max_iterations: u32, samples: usize) -> OptimizationSetup<String> {
    OptimizationSetup::new(
        "summarize-ticket",
        suit("v0"),
        Arc::new(SuccessRateScorer::new()),
        Arc::new(NoOpMutator),
        Arc::new(MaxIterationsPolicy::new(max_iterations)),
    )
    .with_samples_per_iteration(samples)
}

/// Appends the iteration number to the value: `v0`, `v1`, `v2`, ...
///
/// Fails on the call numbered `fail_on_call` (zero-based), if set.
pub struct CountingMutator {
    calls: AtomicUsize,
    fail_on_call: Option<usize>,
}

impl CountingMutator {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on_call: None,
        }
    }

    pub fn failing_on_call(call: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on_call: Some(call),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Mutator<String> for CountingMutator {
    async fn mutate(
        &self,
        _current: &String,
        history: &OptimizationHistory<String>,
    ) -> Result<String, MutationError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on_call == Some(call) {
            return Err(MutationError::failed(format!("mutator gave up on call {call}")));
        }
        Ok(format!("v{}", history.iteration_count()))
    }

    fn description(&self) -> String {
        "counting".to_string()
    }
}

/// Scores from a table keyed by control value; unknown values fail.
pub struct TableScorer {
    scores: HashMap<String, f64>,
    scored: Mutex<Vec<String>>,
}

impl TableScorer {
    pub fn new(scores: &[(&str, f64)]) -> Self {
        Self {
            scores: scores
                .iter()
                .map(|(value, score)| ((*value).to_string(), *score))
                .collect(),
            scored: Mutex::new(Vec::new()),
        }
    }

    pub fn scored(&self) -> Vec<String> {
        self.scored.lock().expect("scorer lock poisoned").clone()
    }
}

impl Scorer<String> for TableScorer {
    fn score(&self, aggregate: &IterationAggregate<String>) -> Result<f64, ScoringError> {
        let value = aggregate.control_value();
        self.scored
            .lock()
            .expect("scorer lock poisoned")
            .push(value.clone());
        self.scores
            .get(value)
            .copied()
            .ok_or_else(|| ScoringError::new(format!("no score for {value}")))
    }

    fn description(&self) -> String {
        "table".to_string()
    }
}
