//! Application event bus
//!
//! Decouples the sync coordinator from the UI and orchestration code that
//! reacts to its signals. The coordinator is the sole publisher; application
//! code subscribes and decides whether to prompt a reload or flush a queue.

use tokio::sync::broadcast;
use tracing::debug;

use crate::sync::AgentRegistration;

/// Default channel capacity for the bus
const DEFAULT_CAPACITY: usize = 32;

/// Events published by the sync coordinator
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// A new agent version is installed and waiting to take over
    UpdateAvailable(AgentRegistration),
    /// The background agent asked the application to resume queued work
    TriggerSync,
}

impl AppEvent {
    /// Application-level name of this event
    pub fn name(&self) -> &'static str {
        match self {
            AppEvent::UpdateAvailable(_) => "sw-update-available",
            AppEvent::TriggerSync => "trigger-sync",
        }
    }
}

/// Broadcast bus for application events
///
/// Cloning the bus is cheap; all clones publish into the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AppEvent>,
}

impl EventBus {
    /// Create a bus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to events published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to all current subscribers
    ///
    /// Returns the number of subscribers the event reached. Publishing with
    /// no subscribers drops the event.
    pub fn publish(&self, event: AppEvent) -> usize {
        let name = event.name();
        match self.tx.send(event) {
            Ok(count) => count,
            Err(_) => {
                debug!("no subscribers for {} event", name);
                0
            }
        }
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
