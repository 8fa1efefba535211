//! Implementation of the `factor-tuner verify` command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::report::ReportWriter;

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Audit report to check
    pub report: PathBuf,
}

#[derive(Debug, serde::Serialize)]
pub struct VerifyOutput {
    pub valid: bool,
    pub path: PathBuf,
    pub fingerprint: String,
    pub run_id: String,
    pub use_case_id: String,
    pub termination_cause: String,
}

impl CommandOutput for VerifyOutput {
    fn to_human(&self) -> String {
        format!(
            "Report verified: {}\n  Run:         {}\n  Use case:    {}\n  Termination: {}\n  Fingerprint: {}",
            self.path.display(),
            self.run_id,
            self.use_case_id,
            self.termination_cause,
            self.fingerprint
        )
    }
}

/// Succeeds only when the report's fingerprint matches its content.
pub async fn execute(args: VerifyArgs, json_mode: bool) -> Result<()> {
    let verified = ReportWriter::load(&args.report)
        .with_context(|| format!("Failed to verify report {}", args.report.display()))?;

    let document = verified.document;
    let output_data = VerifyOutput {
        valid: true,
        path: args.report,
        fingerprint: verified.fingerprint,
        run_id: document.run.run_id.to_string(),
        use_case_id: document.run.use_case_id,
        termination_cause: document.termination.cause,
    };
    output(&output_data, json_mode);
    Ok(())
}
