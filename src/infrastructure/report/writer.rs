use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::errors::ReportError;
use crate::domain::models::{FactorValue, OptimizationHistory, ReportConfig};
use crate::services::report::{parse_report, render_report, VerifiedReport};

/// Writes sealed audit reports to, and loads them back from, disk.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn from_config(config: &ReportConfig) -> Self {
        Self::new(&config.output_dir)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `<output_dir>/<use case>-<run id>.yaml`, with path-unsafe characters
    /// of the use case replaced.
    pub fn report_path<F: FactorValue>(&self, history: &OptimizationHistory<F>) -> PathBuf {
        let use_case: String = history
            .use_case_id()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.output_dir
            .join(format!("{use_case}-{}.yaml", history.run_id()))
    }

    /// Render and write the report; returns the file written.
    pub fn write<F: FactorValue>(
        &self,
        history: &OptimizationHistory<F>,
    ) -> Result<PathBuf, ReportError> {
        let text = render_report(history)?;
        fs::create_dir_all(&self.output_dir)?;
        let path = self.report_path(history);
        fs::write(&path, text)?;

        info!(
            run_id = %history.run_id(),
            path = %path.display(),
            "Audit report written"
        );
        Ok(path)
    }

    /// Read a report and verify its fingerprint.
    pub fn load(path: impl AsRef<Path>) -> Result<VerifiedReport, ReportError> {
        let text = fs::read_to_string(path.as_ref())?;
        parse_report(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::history::test_support::{builder, record};
    use crate::domain::models::{Objective, TerminationReason};
    use tempfile::TempDir;

    fn history(use_case: &str) -> OptimizationHistory<String> {
        let mut builder = builder::<String>(Objective::Maximize).with_use_case_id(use_case);
        builder.append(record(0, "a".to_string(), 0.4));
        builder.set_termination_reason(TerminationReason::MaxIterations { iterations: 1 });
        builder.build().unwrap()
    }

    #[test]
    fn test_write_then_load() {
        let dir = TempDir::new().unwrap();
        let writer = ReportWriter::new(dir.path().join("reports"));
        let history = history("summarize");

        let path = writer.write(&history).unwrap();
        assert!(path.starts_with(dir.path().join("reports")));
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("summarize-"));

        let report = ReportWriter::load(&path).unwrap();
        assert_eq!(report.document.run.run_id, history.run_id());
    }

    #[test]
    fn test_use_case_is_sanitized_in_file_name() {
        let writer = ReportWriter::new("out");
        let path = writer.report_path(&history("tickets/triage v2"));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("tickets_triage_v2-"));
        assert_eq!(path.parent(), Some(Path::new("out")));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            ReportWriter::load(dir.path().join("absent.yaml")),
            Err(ReportError::Io(_))
        ));
    }
}
