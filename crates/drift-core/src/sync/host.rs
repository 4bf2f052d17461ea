//! Host runtime capability interface
//!
//! The coordinator talks to the host's background-agent machinery through
//! the [`HostRuntime`] trait rather than a concrete host API, so it runs the
//! same against a real runtime or the simulated one used in tests.

use std::future::Future;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::message::AgentMessage;

/// Errors raised by the host's agent machinery
#[derive(Error, Debug)]
pub enum HostError {
    /// The host has no background-agent support
    #[error("background agents are not supported by this host")]
    Unsupported,

    /// The agent script could not be fetched or parsed
    #[error("failed to fetch agent script '{url}': {reason}")]
    ScriptFetch { url: String, reason: String },

    /// The host refused the registration
    #[error("agent registration rejected: {0}")]
    Rejected(String),

    /// A named sync task could not be registered with the agent
    #[error("sync task registration failed: {0}")]
    SyncRegistration(String),
}

/// Lifecycle states of an installed agent version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    /// Install in progress
    Installing,
    /// Installed, not yet activated
    Installed,
    /// Installed and waiting for a previous version to release control
    Waiting,
    /// Controlling the scope
    Active,
    /// Replaced by a newer version
    Redundant,
}

/// Handle to an agent registered with the host
///
/// One live registration per application instance; the handle is cloneable
/// because the host owns the underlying resource.
#[derive(Debug, Clone)]
pub struct AgentRegistration {
    /// Identifier assigned by the host
    pub id: Uuid,
    /// Path prefix the agent controls
    pub scope: String,
    /// When the registration was accepted
    pub registered_at: DateTime<Utc>,
}

/// A lifecycle transition reported for a newly installing agent version
#[derive(Debug, Clone)]
pub struct LifecycleEvent {
    /// State the new agent version reached
    pub state: AgentState,
    /// Whether a previous agent version was controlling the scope when the
    /// transition happened. Distinguishes an update from a first install.
    pub controller_active: bool,
}

/// Connectivity transition reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    Online,
    Offline,
}

/// Stream of host-delivered values with explicit teardown
///
/// Returned by the subscription methods on [`HostRuntime`]. Dropping the
/// subscription or calling [`cancel`](Self::cancel) detaches it from the
/// host; `recv` returns `None` once the feed ends.
pub struct Subscription<T> {
    rx: mpsc::Receiver<T>,
}

impl<T> Subscription<T> {
    pub fn new(rx: mpsc::Receiver<T>) -> Self {
        Self { rx }
    }

    /// Receive the next value, or `None` when the feed has ended
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Detach from the host feed
    pub fn cancel(mut self) {
        self.rx.close();
    }
}

/// Capability interface to the host's background-agent machinery
///
/// All failure modes surface as [`HostError`]; the coordinator decides which
/// of them are soft.
pub trait HostRuntime: Send + Sync + 'static {
    /// Whether the host supports background agents at all
    fn supports_agents(&self) -> bool;

    /// Whether the host supports named background sync tasks
    fn supports_background_sync(&self) -> bool;

    /// Install the agent script at the given scope
    ///
    /// Re-registering an already-installed script at the same scope returns
    /// the existing registration without reinstalling.
    fn register_agent(
        &self,
        script_url: &str,
        scope: &str,
    ) -> impl Future<Output = Result<AgentRegistration, HostError>> + Send;

    /// Lifecycle transitions for agent versions installed under a registration
    fn lifecycle_events(&self, registration: &AgentRegistration) -> Subscription<LifecycleEvent>;

    /// Messages posted by the active agent
    fn agent_messages(&self) -> Subscription<AgentMessage>;

    /// Connectivity transitions
    fn connectivity_events(&self) -> Subscription<ConnectivityEvent>;

    /// Ask the agent to retry deferred work once connectivity allows
    fn register_sync_task(&self, tag: &str) -> impl Future<Output = Result<(), HostError>> + Send;
}
