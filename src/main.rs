//! factor-tuner CLI entry point.

use anyhow::Result;
use clap::Parser;

use factor_tuner::cli::{commands, Cli, Commands};
use factor_tuner::domain::models::Config;
use factor_tuner::infrastructure::config::ConfigLoader;
use factor_tuner::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = run(cli).await {
        factor_tuner::cli::handle_error(err, json);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let _logger = LoggerImpl::init(&LogConfig::from(&config.logging))?;

    match cli.command {
        Commands::Verify(args) => commands::verify::execute(args, cli.json).await,
        Commands::Show(args) => commands::show::execute(args, cli.json).await,
        Commands::Config(args) => commands::config::execute(args, config, cli.json).await,
        Commands::Simulate(args) => commands::simulate::execute(args, config, cli.json).await,
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    match cli.config {
        Some(ref path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}
