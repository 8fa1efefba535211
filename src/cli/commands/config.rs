//! Implementation of the `factor-tuner config` command.

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;

#[derive(Args, Debug)]
pub struct ConfigArgs {}

#[derive(Debug, serde::Serialize)]
pub struct ConfigOutput {
    #[serde(flatten)]
    pub config: Config,
    #[serde(skip)]
    rendered: String,
}

impl CommandOutput for ConfigOutput {
    fn to_human(&self) -> String {
        self.rendered.trim_end().to_string()
    }
}

/// Print the configuration after defaults, files and environment are merged.
pub async fn execute(_args: ConfigArgs, config: Config, json_mode: bool) -> Result<()> {
    let rendered = serde_yaml::to_string(&config).context("Failed to render configuration")?;
    output(&ConfigOutput { config, rendered }, json_mode);
    Ok(())
}
