//! Property tests for aggregation and history queries.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use factor_tuner::domain::models::{
    FactorSuit, FixedFactors, HistoryBuilder, IterationAggregate, IterationRecord,
    IterationStatistics, Objective, SampleOutcome,
};
use factor_tuner::services::StatisticsAggregator;
use proptest::prelude::*;

fn outcome_strategy() -> impl Strategy<Value = SampleOutcome> {
    (any::<bool>(), 0u64..5_000, 0u64..2_000).prop_map(|(passed, tokens, latency_ms)| {
        let outcome = SampleOutcome::new(passed, Duration::from_millis(latency_ms)).with_tokens(tokens);
        if passed {
            outcome
        } else {
            outcome.with_postcondition_failure("mentions the ticket id", "no id in output")
        }
    })
}

fn record(iteration: u32, value: String, score: f64) -> IterationRecord<String> {
    let suit = FactorSuit::new("prompt", value, Arc::new(FixedFactors::new())).unwrap();
    let now = Utc::now();
    let aggregate =
        IterationAggregate::new(iteration, suit, IterationStatistics::empty(), now, now).unwrap();
    IterationRecord::success(aggregate, score)
}

fn builder(objective: Objective) -> HistoryBuilder<String> {
    HistoryBuilder::new()
        .with_use_case_id("summarize-ticket")
        .with_control_factor_name("prompt")
        .with_objective(objective)
        .with_samples_per_iteration(1)
}

proptest! {
    /// Property: counts, rate and tokens are consistent with the outcomes
    #[test]
    fn prop_statistics_match_outcomes(
        outcomes in prop::collection::vec(outcome_strategy(), 1..64)
    ) {
        let stats = StatisticsAggregator::with_feedback().aggregate(&outcomes).unwrap();

        let passed = outcomes.iter().filter(|o| o.passed).count();
        prop_assert_eq!(stats.sample_count(), outcomes.len());
        prop_assert_eq!(stats.success_count(), passed);
        prop_assert_eq!(stats.success_count() + stats.failure_count(), stats.sample_count());
        prop_assert!((0.0..=1.0).contains(&stats.success_rate()));
        prop_assert!((stats.success_rate() - passed as f64 / outcomes.len() as f64).abs() < 1e-12);
        prop_assert_eq!(
            stats.total_tokens(),
            outcomes.iter().map(SampleOutcome::tokens).sum::<u64>()
        );
        prop_assert!(stats.mean_latency_ms() >= 0.0);

        let feedback = stats.feedback().unwrap();
        let failures = outcomes.len() - passed;
        match feedback.postcondition("mentions the ticket id") {
            Some(entry) => prop_assert_eq!(entry.failure_count, failures),
            None => prop_assert_eq!(failures, 0),
        }
    }

    /// Property: aggregation is a pure function of its input
    #[test]
    fn prop_aggregation_is_idempotent(
        outcomes in prop::collection::vec(outcome_strategy(), 0..32)
    ) {
        let aggregator = StatisticsAggregator::with_feedback();
        prop_assert_eq!(
            aggregator.aggregate(&outcomes).unwrap(),
            aggregator.aggregate(&outcomes).unwrap()
        );
    }

    /// Property: the best score never gets worse as iterations are appended
    #[test]
    fn prop_best_score_is_monotonic(
        scores in prop::collection::vec(0.0f64..1.0, 1..20),
        minimize in any::<bool>()
    ) {
        let objective = if minimize { Objective::Minimize } else { Objective::Maximize };
        let mut history = builder(objective);
        let mut previous: Option<f64> = None;

        for (i, score) in scores.iter().enumerate() {
            history.append(record(i as u32, format!("v{i}"), *score));
            let best = history.snapshot().best_score().unwrap();
            if let Some(previous) = previous {
                prop_assert_ne!(objective.compare(best, previous), std::cmp::Ordering::Less);
            }
            previous = Some(best);
        }

        let expected = if minimize {
            scores.iter().copied().fold(f64::INFINITY, f64::min)
        } else {
            scores.iter().copied().fold(f64::NEG_INFINITY, f64::max)
        };
        prop_assert_eq!(previous, Some(expected));
    }

    /// Property: ties go to the shortest value, then to the earliest
    #[test]
    fn prop_ties_break_deterministically(
        lengths in prop::collection::vec(1usize..12, 1..12)
    ) {
        let mut history = builder(Objective::Maximize);
        for (i, len) in lengths.iter().enumerate() {
            history.append(record(i as u32, "x".repeat(*len), 0.5));
        }
        let snapshot = history.snapshot();

        let shortest = *lengths.iter().min().unwrap();
        let first_shortest = lengths.iter().position(|l| *l == shortest).unwrap();
        let best = snapshot.best_iteration().unwrap();
        prop_assert_eq!(best.iteration_number(), first_shortest as u32);
        prop_assert_eq!(
            snapshot.best_iteration().unwrap().iteration_number(),
            best.iteration_number()
        );
    }
}
