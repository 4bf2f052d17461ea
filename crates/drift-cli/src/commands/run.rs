//! Run command handler
//!
//! Drives the coordinator against the simulated host runtime and prints
//! every event published on the application bus. Useful for seeing what an
//! application integration would observe without a real agent runtime.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::timeout;

use drift_core::sync::{sim::SimulatedHost, AgentMessage};
use drift_core::{AppEvent, Config, EventBus, SyncCoordinator};

use crate::output::{Output, OutputFormat};

/// How long to wait for the bus to go quiet before finishing
const DRAIN_WAIT: Duration = Duration::from_millis(300);

/// Run the coordinator on a simulated host and print published events
pub async fn run(
    with_update: bool,
    with_trigger: bool,
    with_reconnect: bool,
    output: &Output,
) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    if !config.sync_enabled {
        anyhow::bail!("Sync is disabled. Enable it with: drift config set sync_enabled true");
    }

    let host = Arc::new(SimulatedHost::new());
    let bus = EventBus::default();
    let mut events = bus.subscribe();
    let mut coordinator =
        SyncCoordinator::new(Arc::clone(&host), bus, config.coordinator_config());

    let registration = coordinator
        .register()
        .await
        .context("Agent registration failed on the simulated host")?;

    if !output.is_quiet() {
        output.success(&format!(
            "Registered agent {} at scope {}",
            registration.id, registration.scope
        ));
    }

    if with_update {
        host.install_update();
    }
    if with_trigger {
        host.post_message(AgentMessage::trigger_sync());
    }
    if with_reconnect {
        host.go_offline();
        host.go_online();
    }

    // Drain the bus until it goes quiet.
    let mut seen = 0usize;
    while let Ok(Ok(event)) = timeout(DRAIN_WAIT, events.recv()).await {
        seen += 1;
        print_event(&event, output);
    }

    if with_reconnect && !output.is_quiet() {
        for tag in host.sync_registrations() {
            output.success(&format!("Sync task '{}' re-registered on reconnect", tag));
        }
    }

    coordinator.shutdown();

    if output.format == OutputFormat::Human {
        println!();
        println!("{} event(s) observed", seen);
    }

    Ok(())
}

fn print_event(event: &AppEvent, output: &Output) {
    match output.format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "event": event.name() }));
        }
        OutputFormat::Quiet => {
            println!("{}", event.name());
        }
        OutputFormat::Human => match event {
            AppEvent::UpdateAvailable(registration) => {
                println!(
                    "{}: new agent version waiting at scope {}",
                    event.name(),
                    registration.scope
                );
            }
            AppEvent::TriggerSync => {
                println!("{}: agent requested a sync", event.name());
            }
        },
    }
}
