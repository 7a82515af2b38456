pub mod agent;
pub mod init;
pub mod kv;
pub mod parse;
pub mod render;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::adapters::sqlite::{initialize_database, PoolConfig, SqliteKvStore};
use crate::domain::models::Config;

/// Open (and migrate) the configured database.
pub(crate) async fn open_store(config: &Config) -> Result<Arc<SqliteKvStore>> {
    let pool = initialize_database(
        &config.database.url(),
        Some(PoolConfig::from(&config.database)),
    )
    .await
    .with_context(|| format!("Failed to open database at {}", config.database.path))?;
    Ok(Arc::new(SqliteKvStore::new(pool)))
}

/// Parse a `name=value` pair for `--var`.
pub(crate) fn parse_var(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("variable name is empty in '{s}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

/// Merge `--vars-json` and `--var` flags; individual `--var` flags win.
pub(crate) fn collect_variables(
    vars_json: Option<&str>,
    vars: &[(String, String)],
) -> Result<Map<String, Value>> {
    let mut variables = match vars_json {
        Some(raw) => match serde_json::from_str::<Value>(raw).context("--vars-json is not valid JSON")? {
            Value::Object(map) => map,
            _ => anyhow::bail!("--vars-json must be a JSON object"),
        },
        None => Map::new(),
    };
    for (name, value) in vars {
        variables.insert(name.clone(), Value::from(value.as_str()));
    }
    Ok(variables)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var() {
        assert_eq!(parse_var("name=Ada").unwrap(), ("name".to_string(), "Ada".to_string()));
        assert_eq!(parse_var("eq=a=b").unwrap(), ("eq".to_string(), "a=b".to_string()));
        assert_eq!(parse_var("empty=").unwrap(), ("empty".to_string(), String::new()));
        assert!(parse_var("novalue").is_err());
        assert!(parse_var("=x").is_err());
    }

    #[test]
    fn test_collect_variables_flag_wins() {
        let vars = vec![("tone".to_string(), "bold".to_string())];
        let merged = collect_variables(Some(r#"{"tone": "soft", "count": 3}"#), &vars).unwrap();
        assert_eq!(merged["tone"], "bold");
        assert_eq!(merged["count"], 3);
    }

    #[test]
    fn test_collect_variables_rejects_non_object() {
        assert!(collect_variables(Some("[1, 2]"), &[]).is_err());
        assert!(collect_variables(Some("{oops"), &[]).is_err());
        assert!(collect_variables(None, &[]).unwrap().is_empty());
    }
}
