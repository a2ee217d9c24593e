//! CLI command implementations.

use std::path::Path;

use serde_json::json;

use crate::config::GatewayConfig;

use super::args::Command;
use super::errors::CliResult;

pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Start { config } => start(&config),
        Command::ConfigCheck { config } => config_check(&config),
    }
}

fn start(config_path: &Path) -> CliResult<()> {
    let config = GatewayConfig::load(config_path)?;
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| super::errors::CliError::config_error(format!("failed to start async runtime: {e}")))?;
    let exit_code = runtime.block_on(crate::lifecycle::run(config));
    std::process::exit(exit_code);
}

fn config_check(config_path: &Path) -> CliResult<()> {
    let config = GatewayConfig::load(config_path)?;
    let mut value = serde_json::to_value(&config).map_err(|e| super::errors::CliError::config_error(e.to_string()))?;
    if let Some(obj) = value.as_object_mut() {
        if obj.get("githubToken").is_some() {
            obj.insert("githubToken".to_string(), json!("<redacted>"));
        }
        if obj.get("webhookSecret").is_some() {
            obj.insert("webhookSecret".to_string(), json!("<redacted>"));
        }
    }
    println!("{}", serde_json::to_string_pretty(&value).unwrap());
    Ok(())
}
