//! Audit report codec.
//!
//! Renders a finalized [`OptimizationHistory`] to a YAML document and seals
//! it with a trailing `contentFingerprint` line: the hex SHA-256 of every byte
//! that precedes that line. [`parse_report`] recomputes the hash and refuses
//! documents whose content no longer matches.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::errors::ReportError;
use crate::domain::models::{
    FactorValue, IterationFeedback, IterationRecord, OptimizationHistory,
};

pub const REPORT_SCHEMA_VERSION: &str = "1";

const FINGERPRINT_KEY: &str = "contentFingerprint:";

/// The persisted audit document, minus its fingerprint line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocument {
    pub schema_version: String,
    pub run: RunSection,
    pub factor: FactorSection,
    pub fixed_factors: BTreeMap<String, Value>,
    pub strategies: StrategySection,
    pub timing: TimingSection,
    pub best_iteration: Option<BestIterationSection>,
    pub summary: SummarySection,
    pub termination: TerminationSection,
    pub iterations: Vec<IterationEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSection {
    pub run_id: Uuid,
    pub use_case_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorSection {
    pub name: String,
    pub objective: String,
    pub samples_per_iteration: usize,
    pub initial_value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategySection {
    pub scorer: String,
    pub mutator: String,
    pub termination_policy: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingSection {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestIterationSection {
    pub iteration: u32,
    pub factor_value: Value,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarySection {
    pub total_iterations: usize,
    pub initial_score: Option<f64>,
    pub best_score: Option<f64>,
    pub score_improvement: f64,
    pub score_improvement_percent: f64,
    pub total_tokens: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminationSection {
    pub cause: String,
    pub message: String,
    pub graceful: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationEntry {
    pub iteration: u32,
    pub factor_value: Value,
    pub status: String,
    pub score: Option<f64>,
    pub statistics: StatisticsEntry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsEntry {
    pub sample_count: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub success_rate: f64,
    pub total_tokens: u64,
    pub mean_latency_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<IterationFeedback>,
}

/// A loaded report whose fingerprint has been checked.
#[derive(Debug, Clone)]
pub struct VerifiedReport {
    pub document: ReportDocument,
    pub fingerprint: String,
}

impl ReportDocument {
    pub fn from_history<F: FactorValue>(
        history: &OptimizationHistory<F>,
    ) -> Result<Self, ReportError> {
        let (Some(reason), Some(end_time)) = (history.termination_reason(), history.end_time())
        else {
            return Err(ReportError::NotFinal);
        };

        let best_iteration = match (history.best_iteration(), history.best_score()) {
            (Some(record), Some(score)) => Some(BestIterationSection {
                iteration: record.iteration_number(),
                factor_value: serde_yaml::to_value(record.control_value())?,
                score,
            }),
            _ => None,
        };

        let initial_value = history
            .iterations()
            .first()
            .map(|r| serde_yaml::to_value(r.control_value()))
            .transpose()?;

        let fixed_factors = history
            .fixed_factors()
            .iter()
            .map(|(name, value)| Ok((name.clone(), serde_yaml::to_value(value)?)))
            .collect::<Result<BTreeMap<_, _>, ReportError>>()?;

        let iterations = history
            .iterations()
            .iter()
            .map(IterationEntry::from_record)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            schema_version: REPORT_SCHEMA_VERSION.to_string(),
            run: RunSection {
                run_id: history.run_id(),
                use_case_id: history.use_case_id().to_string(),
            },
            factor: FactorSection {
                name: history.control_factor_name().to_string(),
                objective: history.objective().to_string(),
                samples_per_iteration: history.samples_per_iteration(),
                initial_value,
            },
            fixed_factors,
            strategies: StrategySection {
                scorer: history.scorer_description().to_string(),
                mutator: history.mutator_description().to_string(),
                termination_policy: history.termination_policy_description().to_string(),
            },
            timing: TimingSection {
                start_time: history.start_time(),
                end_time,
                duration_ms: (end_time - history.start_time()).num_milliseconds(),
            },
            best_iteration,
            summary: SummarySection {
                total_iterations: history.iteration_count(),
                initial_score: history.initial_score(),
                best_score: history.best_score(),
                score_improvement: history.score_improvement(),
                score_improvement_percent: history.score_improvement_percent(),
                total_tokens: history.total_tokens(),
            },
            termination: TerminationSection {
                cause: reason.cause().to_string(),
                message: reason.message(),
                graceful: !reason.is_failure(),
            },
            iterations,
        })
    }
}

impl IterationEntry {
    fn from_record<F: FactorValue>(record: &IterationRecord<F>) -> Result<Self, ReportError> {
        let aggregate = record.aggregate();
        let stats = aggregate.statistics();
        Ok(Self {
            iteration: record.iteration_number(),
            factor_value: serde_yaml::to_value(record.control_value())?,
            status: record.status().to_string(),
            score: record.score(),
            statistics: StatisticsEntry {
                sample_count: stats.sample_count(),
                success_count: stats.success_count(),
                failure_count: stats.failure_count(),
                success_rate: stats.success_rate(),
                total_tokens: stats.total_tokens(),
                mean_latency_ms: stats.mean_latency_ms(),
                feedback: stats.feedback().filter(|f| !f.is_empty()).cloned(),
            },
            failure_reason: record.failure_reason().map(str::to_string),
            start_time: aggregate.start_time(),
            end_time: aggregate.end_time(),
        })
    }
}

/// Hex SHA-256 of `content`.
pub fn content_fingerprint(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Render a finalized history to the sealed YAML report.
pub fn render_report<F: FactorValue>(
    history: &OptimizationHistory<F>,
) -> Result<String, ReportError> {
    let document = ReportDocument::from_history(history)?;
    let mut body = serde_yaml::to_string(&document)?;
    if !body.ends_with('\n') {
        body.push('\n');
    }
    let fingerprint = content_fingerprint(&body);
    body.push_str(FINGERPRINT_KEY);
    body.push(' ');
    body.push_str(&fingerprint);
    body.push('\n');
    Ok(body)
}

/// Split off and check the fingerprint line, then parse the body.
pub fn parse_report(text: &str) -> Result<VerifiedReport, ReportError> {
    let (body, recorded) = split_fingerprint(text)?;
    let computed = content_fingerprint(body);
    if computed != recorded {
        return Err(ReportError::FingerprintMismatch {
            recorded: recorded.to_string(),
            computed,
        });
    }

    let document: ReportDocument = serde_yaml::from_str(body)?;
    Ok(VerifiedReport {
        document,
        fingerprint: computed,
    })
}

fn split_fingerprint(text: &str) -> Result<(&str, &str), ReportError> {
    let trimmed = text.trim_end_matches(['\n', '\r']);
    let line_start = trimmed.rfind('\n').map_or(0, |i| i + 1);
    let last_line = &trimmed[line_start..];

    let recorded = last_line
        .strip_prefix(FINGERPRINT_KEY)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(ReportError::FingerprintMissing)?;

    Ok((&trimmed[..line_start], recorded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::history::test_support::{aggregate, builder, record};
    use crate::domain::models::{FixedFactors, Objective, TerminationReason};
    use std::sync::Arc;

    fn finished_history() -> OptimizationHistory<String> {
        let mut builder = builder::<String>(Objective::Maximize)
            .with_fixed_factors(Arc::new(FixedFactors::new().with("model", "small")))
            .with_samples_per_iteration(1)
            .with_descriptions("success rate", "candidate list (1 candidates)", "max iterations (3)");
        builder.append(record(0, "Answer briefly.".to_string(), 0.5));
        builder.append(record(1, "Answer briefly and cite.".to_string(), 0.75));
        builder.append(IterationRecord::scoring_failed(
            aggregate(2, "Cite.".to_string(), 3),
            "judge unavailable",
        ));
        builder.set_termination_reason(TerminationReason::scoring_failure("judge unavailable"));
        builder.build().unwrap()
    }

    #[test]
    fn test_render_then_parse_verifies() {
        let history = finished_history();
        let text = render_report(&history).unwrap();
        assert!(text.starts_with("schemaVersion:"));
        assert!(text.lines().last().unwrap().starts_with("contentFingerprint: "));

        let verified = parse_report(&text).unwrap();
        let doc = verified.document;
        assert_eq!(doc.run.run_id, history.run_id());
        assert_eq!(doc.summary.total_iterations, 3);
        assert_eq!(doc.summary.best_score, Some(0.75));
        assert!((doc.summary.score_improvement_percent - 50.0).abs() < 1e-9);
        assert_eq!(doc.best_iteration.unwrap().iteration, 1);
        assert_eq!(doc.termination.cause, "SCORING_FAILURE");
        assert!(!doc.termination.graceful);
        assert_eq!(doc.iterations[2].status, "SCORING_FAILED");
        assert_eq!(
            doc.iterations[2].failure_reason.as_deref(),
            Some("judge unavailable")
        );
        assert_eq!(
            doc.fixed_factors.get("model"),
            Some(&Value::String("small".to_string()))
        );
    }

    #[test]
    fn test_tampered_body_is_rejected() {
        let text = render_report(&finished_history()).unwrap();
        let tampered = text.replace("score: 0.75", "score: 0.95");
        assert_ne!(tampered, text);
        assert!(matches!(
            parse_report(&tampered),
            Err(ReportError::FingerprintMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_fingerprint_is_rejected() {
        let text = render_report(&finished_history()).unwrap();
        let body: String = text
            .lines()
            .filter(|l| !l.starts_with("contentFingerprint"))
            .map(|l| format!("{l}\n"))
            .collect();
        assert!(matches!(
            parse_report(&body),
            Err(ReportError::FingerprintMissing)
        ));
    }

    #[test]
    fn test_partial_history_cannot_be_rendered() {
        let mut builder = builder::<String>(Objective::Maximize);
        builder.append(record(0, "a".to_string(), 0.1));
        assert!(matches!(
            render_report(&builder.snapshot()),
            Err(ReportError::NotFinal)
        ));
    }

    #[test]
    fn test_fingerprint_is_sha256_hex() {
        assert_eq!(
            content_fingerprint(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
