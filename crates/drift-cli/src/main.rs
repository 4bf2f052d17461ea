//! Drift CLI
//!
//! Command-line interface for Drift - offline sync inspection and demos.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "drift")]
#[command(about = "Drift - optimistic mutations and offline sync coordination")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show configuration and sync status
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Exercise the coordinator against the simulated host runtime
    Run {
        /// Install a new agent version after registration
        #[arg(long)]
        with_update: bool,
        /// Post a TRIGGER_SYNC message from the agent
        #[arg(long)]
        with_trigger: bool,
        /// Bounce connectivity (offline, then back online)
        #[arg(long)]
        with_reconnect: bool,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (agent_script, agent_scope, sync_tag, sync_enabled)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    match cli.command {
        Commands::Status => commands::status::show(&output),
        Commands::Config { command } => match command {
            Some(ConfigCommands::Set { key, value }) => commands::config::set(key, value, &output),
            Some(ConfigCommands::Show) | None => commands::config::show(&output),
        },
        Commands::Run {
            with_update,
            with_trigger,
            with_reconnect,
        } => commands::run::run(with_update, with_trigger, with_reconnect, &output).await,
    }
}

fn init_tracing() {
    // Logs go to stderr so they never mix with command output
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
