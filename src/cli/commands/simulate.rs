//! Implementation of the `factor-tuner simulate` command.
//!
//! Runs a full optimization against the mock executor. The plan lists
//! candidate control values with scripted outcome profiles: the first
//! candidate is the initial value, the rest are proposed in order.
//!
//! ```yaml
//! use_case: summarize-ticket
//! factor: system_prompt
//! fixed_factors:
//!   model: small-1
//! scorer:
//!   kind: success_rate
//!   threshold: 0.5
//! candidates:
//!   - value: "Summarize."
//!     pass_rate: 0.4
//!   - value: "Summarize in one sentence."
//!     pass_rate: 0.8
//!     tokens: 120
//! ```

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::adapters::executors::{MockExecutor, MockProfile};
use crate::application::{OptimizationSetup, Orchestrator};
use crate::cli::output::{output, CommandOutput, IndicatifProgressReporter};
use crate::domain::models::{Config, FactorSuit, FixedFactors, Objective};
use crate::domain::ports::{Mutator, Scorer};
use crate::infrastructure::report::ReportWriter;
use crate::services::{
    termination_policy_from_config, CandidateListMutator, CostEfficiencyScorer,
    LengthLimitedMutator, SuccessRateScorer, WeightedScorer,
};

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Simulation plan (YAML)
    pub plan: PathBuf,

    /// Override optimization.max_iterations
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Override report.output_dir
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Do not draw a progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Scorer selection in a simulation plan.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScorerPlan {
    SuccessRate {
        #[serde(default)]
        threshold: Option<f64>,
    },
    CostEfficiency,
    Weighted {
        success_weight: f64,
        cost_weight: f64,
        #[serde(default)]
        threshold: Option<f64>,
    },
}

impl Default for ScorerPlan {
    fn default() -> Self {
        ScorerPlan::SuccessRate { threshold: None }
    }
}

impl ScorerPlan {
    fn build(&self) -> Result<Arc<dyn Scorer<String>>> {
        let scorer: Arc<dyn Scorer<String>> = match *self {
            ScorerPlan::SuccessRate { threshold: None } => Arc::new(SuccessRateScorer::new()),
            ScorerPlan::SuccessRate {
                threshold: Some(threshold),
            } => Arc::new(SuccessRateScorer::with_threshold(threshold)),
            ScorerPlan::CostEfficiency => Arc::new(CostEfficiencyScorer),
            ScorerPlan::Weighted {
                success_weight,
                cost_weight,
                threshold,
            } => {
                let weighted = WeightedScorer::new(vec![
                    (
                        Arc::new(SuccessRateScorer::new()) as Arc<dyn Scorer<String>>,
                        success_weight,
                    ),
                    (
                        Arc::new(CostEfficiencyScorer) as Arc<dyn Scorer<String>>,
                        cost_weight,
                    ),
                ])?;
                match threshold {
                    Some(threshold) => Arc::new(weighted.with_threshold(threshold)),
                    None => Arc::new(weighted),
                }
            }
        };
        Ok(scorer)
    }
}

/// One scripted control value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CandidatePlan {
    pub value: String,
    #[serde(flatten)]
    pub profile: MockProfile,
}

/// A dry-run description: what to optimize and how each candidate behaves.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationPlan {
    pub use_case: String,
    pub factor: String,
    #[serde(default)]
    pub fixed_factors: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub samples: Option<usize>,
    #[serde(default)]
    pub objective: Option<Objective>,
    #[serde(default)]
    pub scorer: ScorerPlan,
    /// Longest value the mutator may propose, in characters
    #[serde(default)]
    pub max_length: Option<usize>,
    pub candidates: Vec<CandidatePlan>,
}

impl SimulationPlan {
    pub fn from_yaml(text: &str) -> Result<Self> {
        let plan: Self = serde_yaml::from_str(text).context("Invalid simulation plan")?;
        if plan.candidates.is_empty() {
            bail!("Simulation plan must list at least one candidate");
        }
        Ok(plan)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read simulation plan {}", path.display()))?;
        Self::from_yaml(&text)
    }

    fn fixed_factors(&self) -> FixedFactors {
        self.fixed_factors
            .iter()
            .fold(FixedFactors::new(), |fixed, (name, value)| {
                fixed.with(name.clone(), value.clone())
            })
    }

    async fn executor(&self) -> MockExecutor {
        let executor = MockExecutor::new();
        for candidate in &self.candidates {
            executor
                .set_profile(candidate.value.clone(), candidate.profile.clone())
                .await;
        }
        executor
    }
}

#[derive(Debug, serde::Serialize)]
pub struct SimulateOutput {
    pub run_id: String,
    pub use_case_id: String,
    pub iterations: usize,
    pub best_value: Option<String>,
    pub best_score: Option<f64>,
    pub termination_cause: String,
    pub termination_message: String,
    pub report_path: PathBuf,
}

impl CommandOutput for SimulateOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!(
            "Simulated {} iteration(s) of {}",
            self.iterations, self.use_case_id
        )];
        match (&self.best_value, self.best_score) {
            (Some(value), Some(score)) => {
                lines.push(format!("  Best score:  {score:.4}"));
                lines.push(format!(
                    "  Best value:  {}",
                    crate::cli::output::truncate(value, 60)
                ));
            }
            _ => lines.push("  No iteration was scored".to_string()),
        }
        lines.push(format!(
            "  Termination: {} ({})",
            self.termination_cause, self.termination_message
        ));
        lines.push(format!("  Report:      {}", self.report_path.display()));
        lines.join("\n")
    }
}

pub async fn execute(args: SimulateArgs, mut config: Config, json_mode: bool) -> Result<()> {
    let plan = SimulationPlan::from_file(&args.plan)?;

    if let Some(max_iterations) = args.max_iterations {
        config.optimization.max_iterations = max_iterations;
    }
    if let Some(ref output_dir) = args.output_dir {
        config.report.output_dir = output_dir.display().to_string();
    }

    let output_data = simulate(&plan, &config, !(json_mode || args.no_progress)).await?;
    output(&output_data, json_mode);
    Ok(())
}

/// Run `plan` to termination and write its audit report.
pub async fn simulate(
    plan: &SimulationPlan,
    config: &Config,
    show_progress: bool,
) -> Result<SimulateOutput> {
    let (initial, proposals) = plan
        .candidates
        .split_first()
        .context("Simulation plan must list at least one candidate")?;

    let suit = FactorSuit::new(
        plan.factor.clone(),
        initial.value.clone(),
        Arc::new(plan.fixed_factors()),
    )?;

    let mut mutator: Arc<dyn Mutator<String>> = Arc::new(CandidateListMutator::new(
        proposals.iter().map(|c| c.value.clone()).collect(),
    ));
    if let Some(max_length) = plan.max_length {
        mutator = Arc::new(LengthLimitedMutator::new(mutator, max_length));
    }

    let mut setup = OptimizationSetup::new(
        plan.use_case.clone(),
        suit,
        plan.scorer.build()?,
        mutator,
        Arc::new(termination_policy_from_config(&config.optimization)),
    )
    .with_config(&config.optimization);
    if let Some(samples) = plan.samples {
        setup = setup.with_samples_per_iteration(samples);
    }
    if let Some(objective) = plan.objective {
        setup = setup.with_objective(objective);
    }

    let progress = if show_progress {
        IndicatifProgressReporter::new(config.optimization.max_iterations, setup.samples_per_iteration)
    } else {
        IndicatifProgressReporter::hidden(
            config.optimization.max_iterations,
            setup.samples_per_iteration,
        )
    };
    let setup = setup.with_progress_reporter(Arc::new(progress));

    let executor = plan.executor().await;
    let history = Orchestrator::new(setup)
        .run(&executor)
        .await
        .context("Simulation failed")?;

    let report_path = ReportWriter::from_config(&config.report)
        .write(&history)
        .context("Failed to write audit report")?;

    let best = history.best_iteration();
    let (cause, message) = history
        .termination_reason()
        .map(|r| (r.cause().to_string(), r.message()))
        .unwrap_or_default();

    Ok(SimulateOutput {
        run_id: history.run_id().to_string(),
        use_case_id: history.use_case_id().to_string(),
        iterations: history.iteration_count(),
        best_value: best.map(|r| r.aggregate().factor_suit().control_value().clone()),
        best_score: history.best_score(),
        termination_cause: cause,
        termination_message: message,
        report_path,
    })
}
