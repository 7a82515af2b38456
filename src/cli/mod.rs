//! Command-line interface.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use console::style;
use std::path::PathBuf;

use commands::agent::AgentArgs;
use commands::init::InitArgs;
use commands::kv::KvArgs;
use commands::parse::ParseArgs;
use commands::render::RenderArgs;

#[derive(Parser, Debug)]
#[command(name = "promptvault")]
#[command(about = "Versioned prompt templates rendered from a key-value store", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Config file to load instead of .promptvault/config.yaml
    #[arg(long, global = true, env = "PROMPTVAULT_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize configuration and database
    Init(InitArgs),

    /// Inspect and edit stored prompt entries
    Kv(KvArgs),

    /// Render one template slot
    Render(RenderArgs),

    /// Agent resolution
    Agent(AgentArgs),

    /// Run a response parser over stdin
    Parse(ParseArgs),
}

/// Print `err` once and exit with status 1.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({ "success": false, "error": format!("{err:#}") });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("{} {err:#}", style("Error:").red().bold());
    }
    std::process::exit(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "promptvault",
            "render",
            "prompt",
            "--version",
            "fo-08",
            "--json",
            "--config",
            "custom.yaml",
        ])
        .unwrap();

        assert!(cli.json);
        assert_eq!(cli.config, Some(PathBuf::from("custom.yaml")));
        assert!(matches!(cli.command, Commands::Render(_)));
    }
}
