use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Directory holding project configuration, relative to the working directory.
pub const CONFIG_DIR: &str = ".factor-tuner";

/// Prefix of environment variable overrides.
pub const ENV_PREFIX: &str = "FACTOR_TUNER_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid samples_per_iteration: {0}. Must be at least 1")]
    InvalidSamplesPerIteration(usize),

    #[error("Invalid max_iterations: {0}. Must be at least 1")]
    InvalidMaxIterations(u32),

    #[error("Invalid no_improvement_window: {0}. Must be at least 1")]
    InvalidNoImprovementWindow(u32),

    #[error("Invalid time_budget_ms: {0}. Must be positive")]
    InvalidTimeBudget(u64),

    #[error("Invalid session_channel_capacity: {0}. Must be at least 1")]
    InvalidChannelCapacity(usize),

    #[error("Report output_dir cannot be empty")]
    EmptyOutputDir,

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .factor-tuner/config.yaml (project config)
    /// 3. .factor-tuner/local.yaml (project local overrides, optional)
    /// 4. Environment variables (FACTOR_TUNER_* prefix, `__` for nesting)
    pub fn load() -> Result<Config> {
        Self::load_from_dir(".")
    }

    /// Same layering as [`load`](Self::load), rooted at `base_dir` instead
    /// of the working directory.
    pub fn load_from_dir(base_dir: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Self::figment(base_dir.as_ref())
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn figment(base_dir: &Path) -> Figment {
        let config_dir = base_dir.join(CONFIG_DIR);
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(config_dir.join("config.yaml")))
            .merge(Yaml::file(config_dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let optimization = &config.optimization;

        if optimization.samples_per_iteration == 0 {
            return Err(ConfigError::InvalidSamplesPerIteration(
                optimization.samples_per_iteration,
            ));
        }

        if optimization.max_iterations == 0 {
            return Err(ConfigError::InvalidMaxIterations(optimization.max_iterations));
        }

        if let Some(window) = optimization.no_improvement_window {
            if window == 0 {
                return Err(ConfigError::InvalidNoImprovementWindow(window));
            }
        }

        if let Some(budget_ms) = optimization.time_budget_ms {
            if budget_ms == 0 {
                return Err(ConfigError::InvalidTimeBudget(budget_ms));
            }
        }

        if optimization.session_channel_capacity == 0 {
            return Err(ConfigError::InvalidChannelCapacity(
                optimization.session_channel_capacity,
            ));
        }

        if config.report.output_dir.trim().is_empty() {
            return Err(ConfigError::EmptyOutputDir);
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Objective;
    use std::fs;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn project_dir(config: &str, local: Option<&str>) -> TempDir {
        let dir = TempDir::new().unwrap();
        let config_dir = dir.path().join(CONFIG_DIR);
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join("config.yaml"), config).unwrap();
        if let Some(local) = local {
            fs::write(config_dir.join("local.yaml"), local).unwrap();
        }
        dir
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.optimization.samples_per_iteration, 10);
        assert_eq!(config.optimization.max_iterations, 10);
        assert_eq!(config.optimization.no_improvement_window, Some(3));
        assert_eq!(config.optimization.time_budget_ms, None);
        assert_eq!(config.optimization.objective, Objective::Maximize);
        assert_eq!(config.report.output_dir, ".factor-tuner/reports");
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
optimization:
  samples_per_iteration: 25
  max_iterations: 8
  no_improvement_window: null
  time_budget_ms: 120000
  objective: minimize
report:
  output_dir: /tmp/reports
logging:
  level: debug
  format: json
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.optimization.samples_per_iteration, 25);
        assert_eq!(config.optimization.max_iterations, 8);
        assert_eq!(config.optimization.no_improvement_window, None);
        assert_eq!(config.optimization.time_budget_ms, Some(120_000));
        assert_eq!(config.optimization.objective, Objective::Minimize);
        assert!(config.optimization.collect_feedback);
        assert_eq!(config.report.output_dir, "/tmp/reports");
        assert_eq!(config.logging.format, "json");

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_zero_samples() {
        let mut config = Config::default();
        config.optimization.samples_per_iteration = 0;

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidSamplesPerIteration(0))
        ));
    }

    #[test]
    fn test_validate_zero_max_iterations() {
        let mut config = Config::default();
        config.optimization.max_iterations = 0;

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxIterations(0))
        ));
    }

    #[test]
    fn test_validate_zero_window_and_budget() {
        let mut config = Config::default();
        config.optimization.no_improvement_window = Some(0);
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidNoImprovementWindow(0))
        ));

        let mut config = Config::default();
        config.optimization.time_budget_ms = Some(0);
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidTimeBudget(0))
        ));
    }

    #[test]
    fn test_validate_zero_channel_capacity() {
        let mut config = Config::default();
        config.optimization.session_channel_capacity = 0;

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidChannelCapacity(0))
        ));
    }

    #[test]
    fn test_validate_empty_output_dir() {
        let mut config = Config::default();
        config.report.output_dir = "  ".to_string();

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptyOutputDir)
        ));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();

        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "invalid"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();

        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogFormat(format) => assert_eq!(format, "xml"),
            other => panic!("Expected InvalidLogFormat error, got {other:?}"),
        }
    }

    #[test]
    fn test_hierarchical_merging() {
        let dir = project_dir(
            "optimization:\n  samples_per_iteration: 5\n  max_iterations: 4\nlogging:\n  level: info\n  format: json\n",
            Some("optimization:\n  samples_per_iteration: 15\nlogging:\n  level: debug\n"),
        );

        let config = temp_env::with_vars_unset(
            [
                "FACTOR_TUNER_OPTIMIZATION__SAMPLES_PER_ITERATION",
                "FACTOR_TUNER_LOGGING__LEVEL",
            ],
            || ConfigLoader::load_from_dir(dir.path()).unwrap(),
        );

        assert_eq!(
            config.optimization.samples_per_iteration, 15,
            "Local override should win"
        );
        assert_eq!(
            config.optimization.max_iterations, 4,
            "Base value should persist when not overridden"
        );
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_env_override() {
        let dir = project_dir("optimization:\n  max_iterations: 4\n", None);

        let config = temp_env::with_vars(
            [
                ("FACTOR_TUNER_OPTIMIZATION__MAX_ITERATIONS", Some("25")),
                ("FACTOR_TUNER_OPTIMIZATION__OBJECTIVE", Some("minimize")),
                ("FACTOR_TUNER_LOGGING__LEVEL", Some("warn")),
            ],
            || ConfigLoader::load_from_dir(dir.path()).unwrap(),
        );

        assert_eq!(config.optimization.max_iterations, 25);
        assert_eq!(config.optimization.objective, Objective::Minimize);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_env_override_is_validated() {
        let dir = project_dir("{}\n", None);

        let result = temp_env::with_var(
            "FACTOR_TUNER_OPTIMIZATION__SAMPLES_PER_ITERATION",
            Some("0"),
            || ConfigLoader::load_from_dir(dir.path()),
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_missing_files_fall_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let config = temp_env::with_vars_unset(
            [
                "FACTOR_TUNER_OPTIMIZATION__MAX_ITERATIONS",
                "FACTOR_TUNER_OPTIMIZATION__SAMPLES_PER_ITERATION",
                "FACTOR_TUNER_LOGGING__LEVEL",
            ],
            || ConfigLoader::load_from_dir(dir.path()).unwrap(),
        );
        assert_eq!(config.optimization.max_iterations, 10);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "optimization:\n  max_iterations: 7\nreport:\n  output_dir: out").unwrap();
        file.flush().unwrap();

        let config = ConfigLoader::load_from_file(file.path()).unwrap();
        assert_eq!(config.optimization.max_iterations, 7);
        assert_eq!(config.report.output_dir, "out");
        assert_eq!(config.optimization.samples_per_iteration, 10);
    }
}
