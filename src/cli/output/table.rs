//! Table output formatting for CLI commands
//!
//! Renders audit report iterations with comfy-table. Colors are dropped when
//! the terminal does not support them and status icons are used instead.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use serde_yaml::Value;
use std::env;

use crate::services::report::{IterationEntry, ReportDocument};

/// Table formatter for CLI output
pub struct TableFormatter {
    /// Whether to use colors in output
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<u16>,
}

impl TableFormatter {
    /// Create a new table formatter
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    /// Create a new table formatter with custom settings
    pub fn with_config(use_colors: bool, max_width: Option<u16>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// Format report iterations, marking the best one.
    pub fn format_iterations(&self, iterations: &[IterationEntry], best: Option<u32>) -> String {
        let mut table = self.create_base_table();

        table.set_header(vec![
            Cell::new("#").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
            Cell::new("Score").add_attribute(Attribute::Bold),
            Cell::new("Pass").add_attribute(Attribute::Bold),
            Cell::new("Tokens").add_attribute(Attribute::Bold),
            Cell::new("Latency (ms)").add_attribute(Attribute::Bold),
        ]);

        for entry in iterations {
            let marker = if best == Some(entry.iteration) { " *" } else { "" };

            let status_cell = if self.use_colors {
                Cell::new(&entry.status).fg(status_color(&entry.status))
            } else {
                Cell::new(format!("{} {}", status_icon(&entry.status), entry.status))
            };

            let score = entry
                .score
                .map_or_else(|| "-".to_string(), |s| format!("{s:.4}"));
            let stats = &entry.statistics;

            table.add_row(vec![
                Cell::new(format!("{}{marker}", entry.iteration)),
                Cell::new(truncate_text(&value_text(&entry.factor_value), 48)),
                status_cell,
                Cell::new(score),
                Cell::new(format!("{}/{}", stats.success_count, stats.sample_count)),
                Cell::new(stats.total_tokens.to_string()),
                Cell::new(format!("{:.1}", stats.mean_latency_ms)),
            ]);
        }

        table.to_string()
    }

    /// Format the run summary as a two-column table
    pub fn format_summary(&self, document: &ReportDocument) -> String {
        let mut table = self.create_base_table();
        let summary = &document.summary;
        let optional = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |s| format!("{s:.4}"));

        let rows = [
            ("Run", document.run.run_id.to_string()),
            ("Use case", document.run.use_case_id.clone()),
            ("Factor", document.factor.name.clone()),
            ("Objective", document.factor.objective.clone()),
            ("Scorer", document.strategies.scorer.clone()),
            ("Mutator", document.strategies.mutator.clone()),
            ("Termination policy", document.strategies.termination_policy.clone()),
            ("Iterations", summary.total_iterations.to_string()),
            ("Initial score", optional(summary.initial_score)),
            ("Best score", optional(summary.best_score)),
            (
                "Improvement",
                format!(
                    "{:+.4} ({:+.1}%)",
                    summary.score_improvement, summary.score_improvement_percent
                ),
            ),
            ("Tokens", summary.total_tokens.to_string()),
            ("Duration (ms)", document.timing.duration_ms.to_string()),
            (
                "Termination",
                format!(
                    "{}: {}",
                    document.termination.cause, document.termination.message
                ),
            ),
        ];

        for (label, value) in rows {
            table.add_row(vec![
                Cell::new(label).add_attribute(Attribute::Bold),
                Cell::new(value),
            ]);
        }

        table.to_string()
    }

    /// Create a base table with common settings
    fn create_base_table(&self) -> Table {
        let mut table = Table::new();

        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(width);
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if color output is supported
fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }

    if let Ok(term) = env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    true
}

fn status_color(status: &str) -> Color {
    match status {
        "SUCCESS" => Color::Green,
        "BELOW_THRESHOLD" => Color::Yellow,
        _ => Color::Red,
    }
}

fn status_icon(status: &str) -> &'static str {
    match status {
        "SUCCESS" => "✓",
        "BELOW_THRESHOLD" => "!",
        _ => "✗",
    }
}

/// Plain text for a factor value; strings are shown unquoted.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// Truncate text to max length with ellipsis, flattening newlines
fn truncate_text(text: &str, max_len: usize) -> String {
    super::truncate(&text.replace('\n', " "), max_len)
}
