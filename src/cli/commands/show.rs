//! Implementation of the `factor-tuner show` command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::infrastructure::report::ReportWriter;
use crate::services::ReportDocument;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Audit report to summarize
    pub report: PathBuf,

    /// Only print the summary, not the iteration table
    #[arg(long)]
    pub summary_only: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct ShowOutput {
    #[serde(flatten)]
    pub document: ReportDocument,
    #[serde(skip)]
    pub summary_only: bool,
}

impl CommandOutput for ShowOutput {
    fn to_human(&self) -> String {
        let formatter = TableFormatter::new();
        let mut sections = vec![formatter.format_summary(&self.document)];

        if !self.summary_only {
            if self.document.iterations.is_empty() {
                sections.push("No iterations were recorded.".to_string());
            } else {
                let best = self.document.best_iteration.as_ref().map(|b| b.iteration);
                sections.push(formatter.format_iterations(&self.document.iterations, best));
            }
        }
        sections.join("\n\n")
    }
}

pub async fn execute(args: ShowArgs, json_mode: bool) -> Result<()> {
    let verified = ReportWriter::load(&args.report)
        .with_context(|| format!("Failed to load report {}", args.report.display()))?;

    let output_data = ShowOutput {
        document: verified.document,
        summary_only: args.summary_only,
    };
    output(&output_data, json_mode);
    Ok(())
}
