//! Status command handler

use anyhow::{Context, Result};

use drift_core::Config;

use crate::output::{Output, OutputFormat};

/// Show configuration and sync status
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
                    "sync_enabled": config.sync_enabled,
                    "config_file": Config::config_file_path()
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", if config.sync_enabled { "enabled" } else { "disabled" });
        }
        OutputFormat::Human => {
            println!("Drift Status");
            println!("============");
            println!();
            println!("Agent:");
            println!("  Script: {}", config.agent_script);
            println!("  Scope:  {}", config.agent_scope);
            println!();
            println!("Sync:");
            println!(
                "  Status: {}",
                if config.sync_enabled {
                    "enabled"
                } else {
                    "disabled"
                }
            );
            println!("  Task:   {}", config.sync_tag);
            println!();
            println!("Config file: {}", Config::config_file_path().display());
        }
    }

    Ok(())
}
