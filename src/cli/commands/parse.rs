//! `promptvault parse`: run a response parser over text from stdin.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde_json::{Map, Value};
use tokio::io::AsyncReadExt;

use crate::cli::output::{output, CommandOutput};
use crate::services::{JsonObjectParser, ResponseParser, StringListParser};

#[derive(Args, Debug)]
pub struct ParseArgs {
    #[command(subcommand)]
    pub command: ParseCommands,
}

#[derive(Subcommand, Debug)]
pub enum ParseCommands {
    /// Extract a list of strings
    List {
        /// Shortest quoted string accepted by the fallback heuristic
        #[arg(long, default_value_t = 5)]
        min_len: usize,
        /// Longest quoted string accepted by the fallback heuristic
        #[arg(long, default_value_t = 200)]
        max_len: usize,
    },
    /// Extract a JSON object
    Object {
        /// Field that must be present, repeatable
        #[arg(long = "require", value_name = "FIELD")]
        required: Vec<String>,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct ParseListOutput {
    pub items: Vec<String>,
    pub total: usize,
}

impl CommandOutput for ParseListOutput {
    fn to_human(&self) -> String {
        if self.items.is_empty() {
            return "Nothing usable found.".to_string();
        }
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| format!("{}. {item}", i + 1))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, serde::Serialize)]
pub struct ParseObjectOutput {
    pub object: Map<String, Value>,
}

impl CommandOutput for ParseObjectOutput {
    fn to_human(&self) -> String {
        if self.object.is_empty() {
            return "Nothing usable found.".to_string();
        }
        serde_json::to_string_pretty(&self.object).unwrap_or_default()
    }
}

pub async fn execute(args: ParseArgs, json_mode: bool) -> Result<()> {
    let mut text = String::new();
    tokio::io::stdin()
        .read_to_string(&mut text)
        .await
        .context("Failed to read stdin")?;

    match args.command {
        ParseCommands::List { min_len, max_len } => {
            let parser = StringListParser::new().with_length_window(min_len, max_len);
            let items = parser.parse(&text);
            output(
                &ParseListOutput {
                    total: items.len(),
                    items,
                },
                json_mode,
            );
        }
        ParseCommands::Object { required } => {
            let parser = required
                .into_iter()
                .fold(JsonObjectParser::new(), JsonObjectParser::require);
            output(
                &ParseObjectOutput {
                    object: parser.parse(&text),
                },
                json_mode,
            );
        }
    }

    Ok(())
}
