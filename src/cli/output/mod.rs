//! CLI output formatting module
//!
//! Commands produce a value implementing [`CommandOutput`]; [`output`] renders
//! it as human text or JSON depending on the global `--json` flag.

pub mod progress;
pub mod table;

use serde::Serialize;

pub use progress::IndicatifProgressReporter;
pub use table::TableFormatter;

/// Output that can be rendered for humans or machines
pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Print command output in the selected format
pub fn output<T: CommandOutput>(value: &T, json_mode: bool) {
    if json_mode {
        println!("{}", value.to_json());
    } else {
        println!("{}", value.to_human());
    }
}

/// Truncate to at most `max_len` characters, ending with `...` when cut.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let keep = max_len.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out
}
