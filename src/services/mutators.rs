//! Stock mutators.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::errors::MutationError;
use crate::domain::models::{FactorValue, OptimizationHistory};
use crate::domain::ports::Mutator;

/// Returns the current value unchanged. For exercising the loop in isolation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMutator;

#[async_trait]
impl<F: FactorValue> Mutator<F> for NoOpMutator {
    async fn mutate(
        &self,
        current: &F,
        _history: &OptimizationHistory<F>,
    ) -> Result<F, MutationError> {
        Ok(current.clone())
    }

    fn description(&self) -> String {
        "no-op".to_string()
    }
}

/// Walks a fixed list of candidate values, one per iteration.
///
/// The position is derived from the history: after `n` recorded iterations
/// the next value is `candidates[n - 1]`. Running past the end of the list is
/// a mutation failure.
#[derive(Debug, Clone)]
pub struct CandidateListMutator<F> {
    candidates: Vec<F>,
}

impl<F: FactorValue> CandidateListMutator<F> {
    pub fn new(candidates: Vec<F>) -> Self {
        Self { candidates }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[async_trait]
impl<F: FactorValue> Mutator<F> for CandidateListMutator<F> {
    async fn mutate(
        &self,
        _current: &F,
        history: &OptimizationHistory<F>,
    ) -> Result<F, MutationError> {
        let index = history.iteration_count().saturating_sub(1);
        self.candidates.get(index).cloned().ok_or_else(|| {
            MutationError::failed(format!(
                "candidate list exhausted after {} candidates",
                self.candidates.len()
            ))
        })
    }

    fn description(&self) -> String {
        format!("candidate list ({} candidates)", self.candidates.len())
    }
}

/// Wraps another mutator and rejects values whose display form is longer
/// than `max_chars`.
pub struct LengthLimitedMutator<F> {
    inner: Arc<dyn Mutator<F>>,
    max_chars: usize,
}

impl<F: FactorValue> LengthLimitedMutator<F> {
    pub fn new(inner: Arc<dyn Mutator<F>>, max_chars: usize) -> Self {
        Self { inner, max_chars }
    }
}

#[async_trait]
impl<F: FactorValue> Mutator<F> for LengthLimitedMutator<F> {
    async fn mutate(
        &self,
        current: &F,
        history: &OptimizationHistory<F>,
    ) -> Result<F, MutationError> {
        self.inner.mutate(current, history).await
    }

    fn validate(&self, value: &F) -> Result<(), MutationError> {
        self.inner.validate(value)?;
        let len = value.display_value().chars().count();
        if len > self.max_chars {
            return Err(MutationError::rejected(format!(
                "value is {len} characters, limit is {}",
                self.max_chars
            )));
        }
        Ok(())
    }

    fn description(&self) -> String {
        format!(
            "{} (max {} characters)",
            self.inner.description(),
            self.max_chars
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::history::test_support::{history_of_scores, record, builder};
    use crate::domain::models::Objective;

    #[tokio::test]
    async fn test_noop_returns_input() {
        let history = history_of_scores(Objective::Maximize, &[0.5]);
        let next = NoOpMutator
            .mutate(&"same".to_string(), &history)
            .await
            .unwrap();
        assert_eq!(next, "same");
    }

    #[tokio::test]
    async fn test_candidate_list_follows_history_length() {
        let mutator = CandidateListMutator::new(vec!["b".to_string(), "c".to_string()]);

        let after_one = history_of_scores(Objective::Maximize, &[0.1]);
        assert_eq!(
            mutator.mutate(&"a".to_string(), &after_one).await.unwrap(),
            "b"
        );

        let after_two = history_of_scores(Objective::Maximize, &[0.1, 0.2]);
        assert_eq!(
            mutator.mutate(&"b".to_string(), &after_two).await.unwrap(),
            "c"
        );

        let after_three = history_of_scores(Objective::Maximize, &[0.1, 0.2, 0.3]);
        let err = mutator
            .mutate(&"c".to_string(), &after_three)
            .await
            .unwrap_err();
        assert!(matches!(err, MutationError::Failed(_)));
    }

    #[tokio::test]
    async fn test_length_limit_rejects_long_values() {
        let inner: Arc<dyn Mutator<String>> =
            Arc::new(CandidateListMutator::new(vec!["x".repeat(20)]));
        let mutator = LengthLimitedMutator::new(inner, 10);

        let mut builder = builder::<String>(Objective::Maximize);
        builder.append(record(0, "short".to_string(), 0.5));
        let next = mutator
            .mutate(&"short".to_string(), &builder.snapshot())
            .await
            .unwrap();

        assert!(matches!(
            mutator.validate(&next),
            Err(MutationError::Rejected(_))
        ));
        assert!(mutator.validate(&"fits".to_string()).is_ok());
        assert!(mutator.description().contains("max 10 characters"));
    }
}
