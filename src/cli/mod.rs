//! Command-line interface for factor-tuner

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::{config::ConfigArgs, show::ShowArgs, simulate::SimulateArgs, verify::VerifyArgs};

#[derive(Parser)]
#[command(name = "factor-tuner")]
#[command(about = "Sampled, iterative optimization of a single control factor", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output results as JSON
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Read configuration from this file instead of .factor-tuner/
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check the content fingerprint of an audit report
    Verify(VerifyArgs),
    /// Summarize an audit report
    Show(ShowArgs),
    /// Print the effective configuration
    Config(ConfigArgs),
    /// Dry-run an optimization against scripted outcomes
    Simulate(SimulateArgs),
}

/// Print `err` in the requested format and exit with status 1.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({ "error": format!("{err:#}") });
        println!("{body}");
    } else {
        eprintln!("{} {err:#}", console::style("Error:").red().bold());
    }
    std::process::exit(1)
}
