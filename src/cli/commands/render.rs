//! `promptvault render`: render one slot of a version/implementation scope.

use anyhow::Result;
use clap::Args;
use serde_json::{Map, Value};

use crate::cli::commands::{collect_variables, open_store, parse_var};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, RenderRequest, RenderResult};
use crate::services::TemplateEngine;

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Slot to render, e.g. `system` or `prompt`
    pub key: String,

    /// Version (agent id) the slot belongs to
    #[arg(long = "version", value_name = "VERSION")]
    pub template_version: String,

    /// Implementation (defaults to templates.default_implementation)
    #[arg(short, long)]
    pub implementation: Option<String>,

    /// Caller variable, repeatable; shadows stored values of the same name
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,

    /// Caller variables as a JSON object
    #[arg(long)]
    pub vars_json: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct RenderOutput {
    pub key: String,
    pub version: String,
    pub implementation: String,
    pub output: String,
    pub passes: usize,
    pub variables: Map<String, Value>,
}

impl RenderOutput {
    fn new(request: &RenderRequest, result: RenderResult) -> Self {
        Self {
            key: request.key.clone(),
            version: request.version.clone(),
            implementation: request.implementation.clone(),
            output: result.output,
            passes: result.passes,
            variables: result.variables,
        }
    }
}

impl CommandOutput for RenderOutput {
    fn to_human(&self) -> String {
        self.output.clone()
    }
}

pub async fn execute(args: RenderArgs, config: &Config, json_mode: bool) -> Result<()> {
    let variables = collect_variables(args.vars_json.as_deref(), &args.vars)?;
    let implementation = args
        .implementation
        .unwrap_or_else(|| config.templates.default_implementation.clone());

    let request = RenderRequest::new(args.key, args.template_version)
        .with_implementation(implementation)
        .with_variables(variables);

    let store = open_store(config).await?;
    let engine = TemplateEngine::from_config(store, &config.templates);
    let result = engine.render(request.clone()).await?;

    output(&RenderOutput::new(&request, result), json_mode);
    Ok(())
}
