use serde::{Deserialize, Serialize};

use super::history::Objective;

/// Main configuration structure for factor-tuner
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Optimization loop settings
    #[serde(default)]
    pub optimization: OptimizationConfig,

    /// Audit report output
    #[serde(default)]
    pub report: ReportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Optimization loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OptimizationConfig {
    /// Samples executed per iteration
    #[serde(default = "default_samples_per_iteration")]
    pub samples_per_iteration: usize,

    /// Hard cap on iterations
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Stop when the best iteration is this many iterations old
    #[serde(default = "default_no_improvement_window")]
    pub no_improvement_window: Option<u32>,

    /// Wall-clock budget for the whole run
    #[serde(default)]
    pub time_budget_ms: Option<u64>,

    /// Whether scores are maximized or minimized
    #[serde(default)]
    pub objective: Objective,

    /// Collect postcondition/mismatch feedback for mutators
    #[serde(default = "default_true")]
    pub collect_feedback: bool,

    /// Buffer size of the session's sample channel
    #[serde(default = "default_session_channel_capacity")]
    pub session_channel_capacity: usize,
}

const fn default_samples_per_iteration() -> usize {
    10
}

const fn default_max_iterations() -> u32 {
    10
}

#[allow(clippy::unnecessary_wraps)]
const fn default_no_improvement_window() -> Option<u32> {
    Some(3)
}

const fn default_true() -> bool {
    true
}

const fn default_session_channel_capacity() -> usize {
    256
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            samples_per_iteration: default_samples_per_iteration(),
            max_iterations: default_max_iterations(),
            no_improvement_window: default_no_improvement_window(),
            time_budget_ms: None,
            objective: Objective::default(),
            collect_feedback: default_true(),
            session_channel_capacity: default_session_channel_capacity(),
        }
    }
}

/// Audit report configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReportConfig {
    /// Directory reports are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_output_dir() -> String {
    ".factor-tuner/reports".to_string()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stdout only when unset
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}
