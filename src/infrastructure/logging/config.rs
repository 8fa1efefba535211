use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::models::LoggingConfig;

/// Resolved logging settings handed to [`LoggerImpl`](super::LoggerImpl).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Console output format
    #[serde(default)]
    pub format: LogFormat,

    /// Directory for rolling log files; console only when unset
    pub log_dir: Option<PathBuf>,

    /// Emit to stderr
    #[serde(default = "default_true")]
    pub enable_console: bool,

    #[serde(default)]
    pub rotation: RotationPolicy,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl LogFormat {
    /// Unknown names fall back to pretty output.
    pub fn parse(name: &str) -> Self {
        if name.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    #[default]
    Daily,
    Hourly,
    Never,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            log_dir: None,
            enable_console: true,
            rotation: RotationPolicy::default(),
        }
    }
}

impl From<&LoggingConfig> for LogConfig {
    fn from(config: &LoggingConfig) -> Self {
        Self {
            level: config.level.clone(),
            format: LogFormat::parse(&config.format),
            log_dir: config.log_dir.as_ref().map(PathBuf::from),
            ..Self::default()
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
