//! Config command handlers

use anyhow::{bail, Context, Result};

use drift_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(output: &Output) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "agent_script": config.agent_script,
                    "agent_scope": config.agent_scope,
                    "sync_tag": config.sync_tag,
                    "sync_enabled": config.sync_enabled
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", Config::config_file_path().display());
        }
        OutputFormat::Human => {
            println!("Configuration:");
            println!("  agent_script: {}", config.agent_script);
            println!("  agent_scope:  {}", config.agent_scope);
            println!("  sync_tag:     {}", config.sync_tag);
            println!("  sync_enabled: {}", config.sync_enabled);
            println!();
            println!("Config file: {}", Config::config_file_path().display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(key: String, value: String, output: &Output) -> Result<()> {
    let mut config = Config::load().context("Failed to load configuration")?;

    match key.as_str() {
        "agent_script" => {
            config.agent_script = value.clone();
        }
        "agent_scope" => {
            config.agent_scope = value.clone();
        }
        "sync_tag" => {
            config.sync_tag = value.clone();
        }
        "sync_enabled" => {
            config.sync_enabled = value
                .parse()
                .context("Invalid value for sync_enabled. Use 'true' or 'false'.")?;
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: agent_script, agent_scope, sync_tag, sync_enabled",
                key
            );
        }
    }

    config.save().context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}
