//! Promptvault CLI entry point.

use anyhow::Result;
use clap::Parser;
use std::path::Path;

use promptvault::cli::commands;
use promptvault::cli::{handle_error, Cli, Commands};
use promptvault::infrastructure::logging::LoggerImpl;
use promptvault::{Config, ConfigLoader};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.json;

    if let Err(err) = run(cli).await {
        handle_error(err, json_mode);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Missing config files fall back to defaults, so this also works before `init`.
    let config = load_config(cli.config.as_deref())?;
    let _logger = LoggerImpl::init(&config.logging)?;

    match cli.command {
        Commands::Init(args) => commands::init::execute(args, cli.json).await,
        Commands::Kv(args) => commands::kv::execute(args, &config, cli.json).await,
        Commands::Render(args) => commands::render::execute(args, &config, cli.json).await,
        Commands::Agent(args) => commands::agent::execute(args, &config, cli.json).await,
        Commands::Parse(args) => commands::parse::execute(args, cli.json).await,
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}
