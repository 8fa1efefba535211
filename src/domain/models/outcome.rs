//! Result of executing the use case once.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata keys that may carry the token count of a sample, checked in order.
pub const TOKEN_METADATA_KEYS: [&str; 3] = ["tokens", "total_tokens", "tokenCount"];

/// A postcondition that did not hold for a sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostconditionFailure {
    /// Which postcondition failed (the grouping key for feedback).
    pub description: String,
    /// Why it failed for this particular sample.
    pub message: String,
}

/// Expected vs. actual value for a sample whose output did not match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mismatch {
    pub input: Option<String>,
    pub expected: String,
    pub actual: String,
}

/// Outcome of one sample execution, as reported by the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleOutcome {
    /// Whether the sample met its pass criteria.
    pub passed: bool,

    /// Wall-clock time the sample took.
    pub latency: Duration,

    /// Free-form metadata. Token usage lives here under [`TOKEN_METADATA_KEYS`].
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,

    #[serde(default)]
    pub postcondition_failures: Vec<PostconditionFailure>,

    #[serde(default)]
    pub mismatch: Option<Mismatch>,

    /// The raw input fed to the use case, if the executor exposes it.
    #[serde(default)]
    pub input: Option<String>,
}

impl SampleOutcome {
    pub fn new(passed: bool, latency: Duration) -> Self {
        Self {
            passed,
            latency,
            metadata: BTreeMap::new(),
            postcondition_failures: Vec::new(),
            mismatch: None,
            input: None,
        }
    }

    pub fn pass(latency: Duration) -> Self {
        Self::new(true, latency)
    }

    pub fn fail(latency: Duration) -> Self {
        Self::new(false, latency)
    }

    #[must_use]
    pub fn with_tokens(self, tokens: u64) -> Self {
        self.with_metadata(TOKEN_METADATA_KEYS[0], tokens)
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_postcondition_failure(
        mut self,
        description: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.postcondition_failures.push(PostconditionFailure {
            description: description.into(),
            message: message.into(),
        });
        self
    }

    #[must_use]
    pub fn with_mismatch(mut self, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        self.mismatch = Some(Mismatch {
            input: self.input.clone(),
            expected: expected.into(),
            actual: actual.into(),
        });
        self
    }

    #[must_use]
    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        let input = input.into();
        if let Some(mismatch) = self.mismatch.as_mut() {
            mismatch.input = Some(input.clone());
        }
        self.input = Some(input);
        self
    }

    /// Token count from the first known metadata key holding a non-negative
    /// integer. Absent or malformed values count as zero.
    pub fn tokens(&self) -> u64 {
        TOKEN_METADATA_KEYS
            .iter()
            .find_map(|key| self.metadata.get(*key).and_then(Value::as_u64))
            .unwrap_or(0)
    }

    pub fn latency_ms(&self) -> f64 {
        self.latency.as_secs_f64() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_default_to_zero() {
        let outcome = SampleOutcome::pass(Duration::from_millis(5));
        assert_eq!(outcome.tokens(), 0);
    }

    #[test]
    fn test_tokens_read_from_alternate_keys() {
        let outcome =
            SampleOutcome::pass(Duration::from_millis(5)).with_metadata("tokenCount", 17);
        assert_eq!(outcome.tokens(), 17);

        let malformed =
            SampleOutcome::pass(Duration::from_millis(5)).with_metadata("tokens", "many");
        assert_eq!(malformed.tokens(), 0);
    }

    #[test]
    fn test_mismatch_picks_up_input_in_either_order() {
        let a = SampleOutcome::fail(Duration::ZERO)
            .with_input("2+2")
            .with_mismatch("4", "5");
        let b = SampleOutcome::fail(Duration::ZERO)
            .with_mismatch("4", "5")
            .with_input("2+2");
        assert_eq!(a.mismatch, b.mismatch);
        assert_eq!(
            a.mismatch.and_then(|m| m.input),
            Some("2+2".to_string())
        );
    }

    #[test]
    fn test_latency_ms() {
        let outcome = SampleOutcome::pass(Duration::from_micros(2500));
        assert!((outcome.latency_ms() - 2.5).abs() < 1e-9);
    }
}
