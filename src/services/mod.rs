//! Stock strategies, the statistics aggregator and the report codec.

pub mod aggregator;
pub mod mutators;
pub mod report;
pub mod scorers;
pub mod termination_policies;

pub use aggregator::StatisticsAggregator;
pub use mutators::{CandidateListMutator, LengthLimitedMutator, NoOpMutator};
pub use report::{
    content_fingerprint, parse_report, render_report, ReportDocument, VerifiedReport,
    REPORT_SCHEMA_VERSION,
};
pub use scorers::{CostEfficiencyScorer, SuccessRateScorer, WeightedScorer};
pub use termination_policies::{
    termination_policy_from_config, CompositeTerminationPolicy, MaxIterationsPolicy,
    NoImprovementPolicy, TimeBudgetPolicy,
};
