//! KV entry commands: the admin path for reading and seeding prompt rows.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use comfy_table::Cell;
use serde_json::Value;
use std::path::PathBuf;

use crate::adapters::memory::parse_seed_yaml;
use crate::cli::commands::open_store;
use crate::cli::output::{list_table, output, render_list, truncate, CommandOutput};
use crate::domain::models::{Config, KvEntry, KvValue, TemplateKey, KEY_NAMESPACE};
use crate::domain::ports::{KvAdmin, KvStore};

#[derive(Args, Debug)]
pub struct KvArgs {
    #[command(subcommand)]
    pub command: KvCommands,
}

#[derive(Subcommand, Debug)]
pub enum KvCommands {
    /// Show one entry
    Get {
        key: String,
    },
    /// List entries under a key prefix
    List {
        #[arg(short, long, default_value = "")]
        prefix: String,
    },
    /// Create or replace an entry
    Set {
        key: String,
        /// Text content, stored as {"text": ...}
        #[arg(required_unless_present = "raw")]
        text: Option<String>,
        /// Store this JSON value as-is
        #[arg(long, conflicts_with = "text")]
        raw: Option<String>,
    },
    /// Delete an entry
    Delete {
        key: String,
    },
    /// Upsert every entry from a YAML map of key to value
    Import {
        file: PathBuf,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct KvEntryOutput {
    pub key: String,
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl From<&KvEntry> for KvEntryOutput {
    fn from(entry: &KvEntry) -> Self {
        Self {
            key: entry.key.clone(),
            value: entry.value.to_json(),
            updated_at: None,
        }
    }
}

impl CommandOutput for KvEntryOutput {
    fn to_human(&self) -> String {
        match self.value.get("text").and_then(Value::as_str) {
            Some(text) => text.to_string(),
            None => serde_json::to_string_pretty(&self.value).unwrap_or_default(),
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct KvListOutput {
    pub entries: Vec<KvEntryOutput>,
    pub total: usize,
}

impl CommandOutput for KvListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["key", "value"]);
        for entry in &self.entries {
            let preview = match entry.value.get("text").and_then(Value::as_str) {
                Some(text) => text.replace('\n', " "),
                None => entry.value.to_string(),
            };
            table.add_row(vec![Cell::new(&entry.key), Cell::new(truncate(&preview, 60))]);
        }
        render_list("entry", "entries", &table, self.total)
    }
}

#[derive(Debug, serde::Serialize)]
pub struct KvWriteOutput {
    pub success: bool,
    pub action: String,
    pub keys: Vec<String>,
}

impl CommandOutput for KvWriteOutput {
    fn to_human(&self) -> String {
        match self.keys.as_slice() {
            [key] => format!("{} {key}", self.action),
            keys => format!("{} {} entries", self.action, keys.len()),
        }
    }
}

pub async fn execute(args: KvArgs, config: &Config, json_mode: bool) -> Result<()> {
    let store = open_store(config).await?;

    match args.command {
        KvCommands::Get { key } => {
            let value = store
                .get_value(&key)
                .await?
                .with_context(|| format!("Key not found: {key}"))?;
            let updated_at = store.updated_at(&key).await?;
            let mut out = KvEntryOutput::from(&KvEntry::new(key, value));
            out.updated_at = updated_at.map(|ts| ts.to_rfc3339());
            output(&out, json_mode);
        }
        KvCommands::List { prefix } => {
            let entries = store.list(&prefix).await?;
            let out = KvListOutput {
                total: entries.len(),
                entries: entries.iter().map(KvEntryOutput::from).collect(),
            };
            output(&out, json_mode);
        }
        KvCommands::Set { key, text, raw } => {
            let entry = build_entry(key, text, raw.as_deref())?;
            store.put(&entry).await?;
            output(
                &KvWriteOutput {
                    success: true,
                    action: "Stored".to_string(),
                    keys: vec![entry.key],
                },
                json_mode,
            );
        }
        KvCommands::Delete { key } => {
            if !store.delete(&key).await? {
                anyhow::bail!("Key not found: {key}");
            }
            output(
                &KvWriteOutput {
                    success: true,
                    action: "Deleted".to_string(),
                    keys: vec![key],
                },
                json_mode,
            );
        }
        KvCommands::Import { file } => {
            let yaml = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let entries = parse_seed_yaml(&yaml)?;
            for entry in &entries {
                validate_key(&entry.key)?;
            }
            for entry in &entries {
                store.put(entry).await?;
            }
            output(
                &KvWriteOutput {
                    success: true,
                    action: "Imported".to_string(),
                    keys: entries.into_iter().map(|e| e.key).collect(),
                },
                json_mode,
            );
        }
    }

    Ok(())
}

fn build_entry(key: String, text: Option<String>, raw: Option<&str>) -> Result<KvEntry> {
    validate_key(&key)?;
    let value = match (text, raw) {
        (Some(text), None) => KvValue::text(text),
        (None, Some(raw)) => {
            let json: Value = serde_json::from_str(raw).context("--raw is not valid JSON")?;
            KvValue::from(json)
        }
        _ => anyhow::bail!("Provide either <TEXT> or --raw <JSON>"),
    };
    Ok(KvEntry::new(key, value))
}

/// Keys in the `versions` namespace must have the full four-part shape.
fn validate_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        anyhow::bail!("Key cannot be empty");
    }
    if key.starts_with(&format!("{KEY_NAMESPACE}.")) {
        key.parse::<TemplateKey>()?;
    }
    Ok(())
}
