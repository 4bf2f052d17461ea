//! Offline sync coordination
//!
//! Supervises a persistent background agent registered with the host
//! runtime and relays agent lifecycle transitions and sync signals onto the
//! application event bus.
//!
//! ## Flow
//!
//! 1. [`SyncCoordinator::register`] installs the agent through the
//!    [`HostRuntime`] capability interface (soft-failing on hosts without
//!    agent support)
//! 2. A new agent version finishing its install while a previous version is
//!    in control publishes [`AppEvent::UpdateAvailable`]
//! 3. A `TRIGGER_SYNC` message from the agent publishes
//!    [`AppEvent::TriggerSync`]
//! 4. Each restored-connectivity transition re-registers the named sync
//!    task with the agent, best effort
//!
//! [`AppEvent::UpdateAvailable`]: crate::bus::AppEvent::UpdateAvailable
//! [`AppEvent::TriggerSync`]: crate::bus::AppEvent::TriggerSync

mod coordinator;
mod host;
mod message;
pub mod sim;

pub use coordinator::{CoordinatorConfig, SyncCoordinator};
pub use host::{
    AgentRegistration, AgentState, ConnectivityEvent, HostError, HostRuntime, LifecycleEvent,
    Subscription,
};
pub use message::{AgentMessage, TRIGGER_SYNC_TAG};
