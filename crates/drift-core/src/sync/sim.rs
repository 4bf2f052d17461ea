//! Simulated host runtime
//!
//! An in-process [`HostRuntime`] backed by channels. The test suite and the
//! CLI `run` command use it to exercise the coordinator without a real agent
//! runtime: tests drive installs, updates, agent messages and connectivity
//! transitions explicitly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::Utc;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::host::{
    AgentRegistration, AgentState, ConnectivityEvent, HostError, HostRuntime, LifecycleEvent,
    Subscription,
};
use super::message::AgentMessage;

/// Channel capacity for each simulated feed
const FEED_CAPACITY: usize = 64;

#[derive(Default)]
struct Inner {
    registration: Option<AgentRegistration>,
    /// Whether an agent version currently controls the scope
    active: bool,
    lifecycle_txs: Vec<mpsc::Sender<LifecycleEvent>>,
    message_txs: Vec<mpsc::Sender<AgentMessage>>,
    connectivity_txs: Vec<mpsc::Sender<ConnectivityEvent>>,
    sync_registrations: Vec<String>,
}

/// In-process host runtime for tests and demos
pub struct SimulatedHost {
    inner: Mutex<Inner>,
    supports_agents: bool,
    supports_background_sync: bool,
    registration_failure: Option<String>,
    fail_sync_registration: AtomicBool,
}

impl SimulatedHost {
    /// A host with full agent and background-sync support
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            supports_agents: true,
            supports_background_sync: true,
            registration_failure: None,
            fail_sync_registration: AtomicBool::new(false),
        }
    }

    /// A host without background-agent support
    pub fn without_agent_support() -> Self {
        Self {
            supports_agents: false,
            ..Self::new()
        }
    }

    /// A host with agents but no named background sync tasks
    pub fn without_background_sync() -> Self {
        Self {
            supports_background_sync: false,
            ..Self::new()
        }
    }

    /// A host whose agent installation fails with the given reason
    pub fn failing_registration(reason: &str) -> Self {
        Self {
            registration_failure: Some(reason.to_string()),
            ..Self::new()
        }
    }

    /// Make subsequent sync-task registrations fail
    pub fn fail_sync_registration(&self) {
        self.fail_sync_registration.store(true, Ordering::SeqCst);
    }

    /// Install a new agent version behind the active one
    ///
    /// Emits the `Installing` and `Installed` transitions with a controller
    /// active, which is what a genuine update looks like. No-op when no
    /// agent is registered and active yet.
    pub fn install_update(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.registration.is_none() || !inner.active {
            return;
        }
        for state in [AgentState::Installing, AgentState::Installed] {
            emit(
                &mut inner.lifecycle_txs,
                LifecycleEvent {
                    state,
                    controller_active: true,
                },
            );
        }
    }

    /// Deliver a message from the active agent to the page
    pub fn post_message(&self, message: AgentMessage) {
        let mut inner = self.inner.lock().unwrap();
        emit(&mut inner.message_txs, message);
    }

    /// Deliver an online transition
    pub fn go_online(&self) {
        let mut inner = self.inner.lock().unwrap();
        emit(&mut inner.connectivity_txs, ConnectivityEvent::Online);
    }

    /// Deliver an offline transition
    pub fn go_offline(&self) {
        let mut inner = self.inner.lock().unwrap();
        emit(&mut inner.connectivity_txs, ConnectivityEvent::Offline);
    }

    /// Sync task tags registered so far, in order
    pub fn sync_registrations(&self) -> Vec<String> {
        self.inner.lock().unwrap().sync_registrations.clone()
    }
}

impl Default for SimulatedHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostRuntime for SimulatedHost {
    fn supports_agents(&self) -> bool {
        self.supports_agents
    }

    fn supports_background_sync(&self) -> bool {
        self.supports_background_sync
    }

    async fn register_agent(
        &self,
        script_url: &str,
        scope: &str,
    ) -> Result<AgentRegistration, HostError> {
        if !self.supports_agents {
            return Err(HostError::Unsupported);
        }
        if let Some(reason) = &self.registration_failure {
            return Err(HostError::ScriptFetch {
                url: script_url.to_string(),
                reason: reason.clone(),
            });
        }

        let mut inner = self.inner.lock().unwrap();

        // Re-registering the same scope hands back the existing registration.
        if let Some(registration) = &inner.registration {
            if registration.scope == scope {
                return Ok(registration.clone());
            }
        }

        let registration = AgentRegistration {
            id: Uuid::new_v4(),
            scope: scope.to_string(),
            registered_at: Utc::now(),
        };

        // First install: no previous version controls the scope.
        for state in [
            AgentState::Installing,
            AgentState::Installed,
            AgentState::Active,
        ] {
            emit(
                &mut inner.lifecycle_txs,
                LifecycleEvent {
                    state,
                    controller_active: false,
                },
            );
        }
        inner.active = true;
        inner.registration = Some(registration.clone());

        Ok(registration)
    }

    fn lifecycle_events(&self, _registration: &AgentRegistration) -> Subscription<LifecycleEvent> {
        let (tx, rx) = mpsc::channel(FEED_CAPACITY);
        self.inner.lock().unwrap().lifecycle_txs.push(tx);
        Subscription::new(rx)
    }

    fn agent_messages(&self) -> Subscription<AgentMessage> {
        let (tx, rx) = mpsc::channel(FEED_CAPACITY);
        self.inner.lock().unwrap().message_txs.push(tx);
        Subscription::new(rx)
    }

    fn connectivity_events(&self) -> Subscription<ConnectivityEvent> {
        let (tx, rx) = mpsc::channel(FEED_CAPACITY);
        self.inner.lock().unwrap().connectivity_txs.push(tx);
        Subscription::new(rx)
    }

    async fn register_sync_task(&self, tag: &str) -> Result<(), HostError> {
        if self.fail_sync_registration.load(Ordering::SeqCst) {
            return Err(HostError::SyncRegistration(
                "agent rejected the task".to_string(),
            ));
        }
        self.inner
            .lock()
            .unwrap()
            .sync_registrations
            .push(tag.to_string());
        Ok(())
    }
}

/// Send to every live subscriber, dropping the ones that have gone away
fn emit<T: Clone>(txs: &mut Vec<mpsc::Sender<T>>, value: T) {
    txs.retain(|tx| {
        !matches!(
            tx.try_send(value.clone()),
            Err(mpsc::error::TrySendError::Closed(_))
        )
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_is_idempotent_per_scope() {
        let host = SimulatedHost::new();

        let first = host.register_agent("/agent.js", "/").await.unwrap();
        let second = host.register_agent("/agent.js", "/").await.unwrap();

        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_first_install_lifecycle() {
        let host = SimulatedHost::new();
        // Subscribe before registering; a feed only sees what happens after
        // it was opened.
        let dummy = AgentRegistration {
            id: Uuid::new_v4(),
            scope: "/".to_string(),
            registered_at: Utc::now(),
        };
        let mut events = host.lifecycle_events(&dummy);

        host.register_agent("/agent.js", "/").await.unwrap();

        let installing = events.recv().await.unwrap();
        assert_eq!(installing.state, AgentState::Installing);
        assert!(!installing.controller_active);

        let installed = events.recv().await.unwrap();
        assert_eq!(installed.state, AgentState::Installed);
        assert!(!installed.controller_active);
    }

    #[tokio::test]
    async fn test_update_reports_active_controller() {
        let host = SimulatedHost::new();
        let registration = host.register_agent("/agent.js", "/").await.unwrap();
        let mut events = host.lifecycle_events(&registration);

        host.install_update();

        let installing = events.recv().await.unwrap();
        assert!(installing.controller_active);
        let installed = events.recv().await.unwrap();
        assert_eq!(installed.state, AgentState::Installed);
        assert!(installed.controller_active);
    }

    #[tokio::test]
    async fn test_install_update_without_registration_is_noop() {
        let host = SimulatedHost::new();
        let dummy = AgentRegistration {
            id: Uuid::new_v4(),
            scope: "/".to_string(),
            registered_at: Utc::now(),
        };
        let mut events = host.lifecycle_events(&dummy);

        host.install_update();

        drop(host);
        assert!(events.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_messages_fan_out_to_all_subscribers() {
        let host = SimulatedHost::new();
        let mut first = host.agent_messages();
        let mut second = host.agent_messages();

        host.post_message(AgentMessage::trigger_sync());

        assert!(first.recv().await.unwrap().is_trigger_sync());
        assert!(second.recv().await.unwrap().is_trigger_sync());
    }

    #[tokio::test]
    async fn test_cancelled_subscription_is_pruned() {
        let host = SimulatedHost::new();
        let subscription = host.agent_messages();
        subscription.cancel();

        host.post_message(AgentMessage::trigger_sync());

        assert!(host.inner.lock().unwrap().message_txs.is_empty());
    }

    #[tokio::test]
    async fn test_failing_registration() {
        let host = SimulatedHost::failing_registration("404");

        let err = host.register_agent("/agent.js", "/").await.unwrap_err();

        assert!(matches!(err, HostError::ScriptFetch { .. }));
    }

    #[tokio::test]
    async fn test_sync_task_failure() {
        let host = SimulatedHost::new();
        host.fail_sync_registration();

        let err = host.register_sync_task("flush-pending").await.unwrap_err();

        assert!(matches!(err, HostError::SyncRegistration(_)));
        assert!(host.sync_registrations().is_empty());
    }
}
