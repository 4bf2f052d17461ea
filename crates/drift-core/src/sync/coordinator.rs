//! Sync coordinator
//!
//! Registers the persistent background agent, watches its lifecycle for new
//! versions, relays sync triggers from the agent onto the application event
//! bus, and re-registers the named sync task whenever connectivity returns.
//!
//! Registration is a passive, best-effort background concern: every failure
//! here is logged and degrades to "no offline support" rather than
//! propagating to the caller.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::host::{AgentRegistration, AgentState, ConnectivityEvent, HostRuntime};
use crate::bus::{AppEvent, EventBus};

/// Configuration for the sync coordinator
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// URL of the agent script to install
    pub script_url: String,
    /// Scope (path prefix) the agent controls
    pub scope: String,
    /// Name of the sync task to (re-)register on reconnect
    pub sync_tag: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            script_url: "/service-worker.js".to_string(),
            scope: "/".to_string(),
            sync_tag: "flush-pending".to_string(),
        }
    }
}

/// Supervises the background agent for one application instance
///
/// The coordinator owns the agent registration and the listener tasks it
/// spawns. [`shutdown`](Self::shutdown) stops the listeners; the agent
/// itself stays installed in the host until unregistered or replaced.
pub struct SyncCoordinator<H: HostRuntime> {
    host: Arc<H>,
    bus: EventBus,
    config: CoordinatorConfig,
    registration: Option<AgentRegistration>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl<H: HostRuntime> SyncCoordinator<H> {
    pub fn new(host: Arc<H>, bus: EventBus, config: CoordinatorConfig) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            host,
            bus,
            config,
            registration: None,
            shutdown_tx,
            tasks: Vec::new(),
        }
    }

    /// Current registration, if the agent has been installed
    pub fn registration(&self) -> Option<&AgentRegistration> {
        self.registration.as_ref()
    }

    /// Register the background agent and start the listener tasks
    ///
    /// Soft-fails: an unsupported host or a failed installation returns
    /// `None` with a log line, never an error. Calling this again while a
    /// registration is live returns the existing handle and starts nothing
    /// new.
    pub async fn register(&mut self) -> Option<AgentRegistration> {
        if let Some(registration) = &self.registration {
            debug!("agent already registered at scope {}", registration.scope);
            return Some(registration.clone());
        }

        if !self.host.supports_agents() {
            info!("background agents unsupported on this host, offline sync disabled");
            return None;
        }

        let registration = match self
            .host
            .register_agent(&self.config.script_url, &self.config.scope)
            .await
        {
            Ok(registration) => registration,
            Err(e) => {
                warn!("agent registration failed: {}", e);
                return None;
            }
        };
        info!("registered background agent at scope {}", registration.scope);

        self.spawn_lifecycle_watcher(&registration);
        self.spawn_message_watcher();
        if self.host.supports_background_sync() {
            self.spawn_connectivity_watcher();
        } else {
            debug!("background sync tasks unsupported, relying on agent event handling");
        }

        self.registration = Some(registration.clone());
        Some(registration)
    }

    /// Stop the listener tasks
    ///
    /// The registration with the host is left in place.
    pub fn shutdown(&mut self) {
        let _ = self.shutdown_tx.send(true);
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    /// Publish `UpdateAvailable` when a new agent version finishes
    /// installing while a previous version is still in control.
    fn spawn_lifecycle_watcher(&mut self, registration: &AgentRegistration) {
        let mut events = self.host.lifecycle_events(registration);
        let bus = self.bus.clone();
        let registration = registration.clone();
        let mut shutdown = self.shutdown_tx.subscribe();

        self.tasks.push(tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = events.recv() => match event {
                        Some(event) => {
                            // Installed with a controller already active means
                            // an update is waiting, not a first install.
                            if event.state == AgentState::Installed && event.controller_active {
                                debug!("new agent version installed and waiting");
                                bus.publish(AppEvent::UpdateAvailable(registration.clone()));
                            }
                        }
                        None => break,
                    },
                    _ = shutdown.changed() => break,
                }
            }
        }));
    }

    /// Relay sync-trigger messages from the agent onto the bus.
    fn spawn_message_watcher(&mut self) {
        let mut messages = self.host.agent_messages();
        let bus = self.bus.clone();
        let mut shutdown = self.shutdown_tx.subscribe();

        self.tasks.push(tokio::spawn(async move {
            loop {
                tokio::select! {
                    message = messages.recv() => match message {
                        Some(message) if message.is_trigger_sync() => {
                            debug!("agent requested sync");
                            bus.publish(AppEvent::TriggerSync);
                        }
                        Some(message) => {
                            debug!("ignoring agent message with tag {}", message.kind);
                        }
                        None => break,
                    },
                    _ = shutdown.changed() => break,
                }
            }
        }));
    }

    /// Re-register the named sync task on every offline-to-online
    /// transition. Failures are swallowed; the agent's own event handling
    /// covers the gap.
    fn spawn_connectivity_watcher(&mut self) {
        let mut events = self.host.connectivity_events();
        let host = Arc::clone(&self.host);
        let tag = self.config.sync_tag.clone();
        let mut shutdown = self.shutdown_tx.subscribe();

        self.tasks.push(tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = events.recv() => match event {
                        Some(ConnectivityEvent::Online) => {
                            debug!("connectivity restored, re-registering sync task '{}'", tag);
                            if let Err(e) = host.register_sync_task(&tag).await {
                                debug!("sync task registration failed: {}", e);
                            }
                        }
                        Some(ConnectivityEvent::Offline) => {}
                        None => break,
                    },
                    _ = shutdown.changed() => break,
                }
            }
        }));
    }
}
