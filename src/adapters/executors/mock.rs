//! Mock sample executor for testing and dry runs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::domain::errors::ExecutionError;
use crate::domain::models::{FactorSuit, FactorValue, SampleOutcome};
use crate::domain::ports::SampleExecutor;

/// Scripted behavior for one control value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockProfile {
    /// Fraction of samples that pass, in `[0, 1]`
    pub pass_rate: f64,
    /// Tokens reported per sample
    pub tokens: u64,
    /// Latency reported per sample
    pub latency_ms: u64,
    /// Postcondition reported by failing samples
    pub postcondition: String,
    /// Fail the whole execution instead of producing outcomes
    pub fail: bool,
    pub error_message: Option<String>,
}

impl Default for MockProfile {
    fn default() -> Self {
        Self {
            pass_rate: 1.0,
            tokens: 100,
            latency_ms: 10,
            postcondition: "output is acceptable".to_string(),
            fail: false,
            error_message: None,
        }
    }
}

impl MockProfile {
    pub fn passing(pass_rate: f64) -> Self {
        Self {
            pass_rate: pass_rate.clamp(0.0, 1.0),
            ..Default::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            fail: true,
            error_message: Some(error.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_tokens(mut self, tokens: u64) -> Self {
        self.tokens = tokens;
        self
    }

    #[must_use]
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Whether the `index`-th sample for this value passes.
    ///
    /// Passes are spread evenly, so any `n` consecutive samples starting at
    /// zero contain `floor(n * pass_rate)` passes.
    fn passes(&self, index: u64) -> bool {
        let rate = self.pass_rate.clamp(0.0, 1.0);
        let before = (index as f64 * rate).floor();
        let after = ((index + 1) as f64 * rate).floor();
        after > before
    }
}

/// Deterministic executor whose outcomes are scripted per control value.
///
/// Values are matched by their display form. Values without a profile use
/// the default one.
pub struct MockExecutor {
    default_profile: MockProfile,
    profiles: Arc<RwLock<HashMap<String, MockProfile>>>,
    sample_counters: Arc<RwLock<HashMap<String, u64>>>,
    fail_on_call: Option<usize>,
    calls: AtomicUsize,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::with_default_profile(MockProfile::default())
    }

    pub fn with_default_profile(profile: MockProfile) -> Self {
        Self {
            default_profile: profile,
            profiles: Arc::new(RwLock::new(HashMap::new())),
            sample_counters: Arc::new(RwLock::new(HashMap::new())),
            fail_on_call: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail the `call`-th execution (zero-based), whatever the profile says.
    #[must_use]
    pub fn with_failure_on_call(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    pub async fn set_profile(&self, value: impl Into<String>, profile: MockProfile) {
        let mut profiles = self.profiles.write().await;
        profiles.insert(value.into(), profile);
    }

    /// Number of `execute` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Samples produced so far for `value`.
    pub async fn samples_for(&self, value: &str) -> u64 {
        let counters = self.sample_counters.read().await;
        counters.get(value).copied().unwrap_or(0)
    }

    async fn profile_for(&self, value: &str) -> MockProfile {
        let profiles = self.profiles.read().await;
        profiles
            .get(value)
            .cloned()
            .unwrap_or_else(|| self.default_profile.clone())
    }
}

impl Default for MockExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<F: FactorValue> SampleExecutor<F> for MockExecutor {
    async fn execute(
        &self,
        factors: &FactorSuit<F>,
        samples: usize,
    ) -> Result<Vec<SampleOutcome>, ExecutionError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on_call == Some(call) {
            return Err(ExecutionError::new(format!("injected failure on call {call}")));
        }

        let value = factors.control_value().display_value();
        let profile = self.profile_for(&value).await;
        if profile.fail {
            return Err(ExecutionError::new(
                profile
                    .error_message
                    .unwrap_or_else(|| "mock execution failure".to_string()),
            ));
        }

        let mut counters = self.sample_counters.write().await;
        let counter = counters.entry(value).or_insert(0);
        let latency = Duration::from_millis(profile.latency_ms);

        let outcomes = (0..samples)
            .map(|_| {
                let index = *counter;
                *counter += 1;
                let input = format!("sample-{index}");
                if profile.passes(index) {
                    SampleOutcome::pass(latency)
                        .with_tokens(profile.tokens)
                        .with_input(input)
                } else {
                    SampleOutcome::fail(latency)
                        .with_tokens(profile.tokens)
                        .with_input(input)
                        .with_postcondition_failure(
                            profile.postcondition.clone(),
                            format!("sample {index} did not satisfy the postcondition"),
                        )
                }
            })
            .collect();

        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::FixedFactors;

    fn suit(value: &str) -> FactorSuit<String> {
        FactorSuit::new("prompt", value.to_string(), Arc::new(FixedFactors::new())).unwrap()
    }

    #[test]
    fn test_pass_pattern_matches_rate() {
        let profile = MockProfile::passing(0.3);
        let passes = (0..10).filter(|i| profile.passes(*i)).count();
        assert_eq!(passes, 3);

        assert!((0..5).all(|i| MockProfile::passing(1.0).passes(i)));
        assert!(!(0..5).any(|i| MockProfile::passing(0.0).passes(i)));
    }

    #[tokio::test]
    async fn test_profiles_are_matched_by_value() {
        let executor = MockExecutor::new();
        executor
            .set_profile("weak", MockProfile::passing(0.5).with_tokens(7))
            .await;

        let strong = executor.execute(&suit("strong"), 4).await.unwrap();
        assert!(strong.iter().all(|o| o.passed));

        let weak = executor.execute(&suit("weak"), 4).await.unwrap();
        assert_eq!(weak.iter().filter(|o| o.passed).count(), 2);
        assert!(weak.iter().all(|o| o.tokens() == 7));
        assert!(weak
            .iter()
            .filter(|o| !o.passed)
            .all(|o| o.postcondition_failures.len() == 1));
        assert_eq!(executor.samples_for("weak").await, 4);
    }

    #[tokio::test]
    async fn test_failure_profile_and_injection() {
        let executor = MockExecutor::new().with_failure_on_call(1);
        executor
            .set_profile("broken", MockProfile::failure("no GPU"))
            .await;

        let err = executor.execute(&suit("broken"), 1).await.unwrap_err();
        assert_eq!(err.message(), "no GPU");

        let injected = executor.execute(&suit("fine"), 1).await.unwrap_err();
        assert!(injected.message().contains("call 1"));

        assert!(executor.execute(&suit("fine"), 1).await.is_ok());
        assert_eq!(executor.calls(), 3);
    }

    #[test]
    fn test_profile_deserializes_with_defaults() {
        let profile: MockProfile = serde_yaml::from_str("pass_rate: 0.25\n").unwrap();
        assert!((profile.pass_rate - 0.25).abs() < f64::EPSILON);
        assert_eq!(profile.tokens, 100);
        assert!(!profile.fail);
    }
}
