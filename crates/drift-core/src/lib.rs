//! Drift Core Library
//!
//! This crate provides the core functionality for Drift, a toolkit for
//! keeping client-visible application state consistent when connectivity
//! and a background synchronization agent are unreliable.
//!
//! # Architecture
//!
//! Two cooperating components, decoupled through the application event bus:
//!
//! - **Mutation controller**: applies a speculative transform to local state
//!   immediately, commits it through an injected remote operation, and rolls
//!   the visible state back if the commit fails.
//! - **Sync coordinator**: registers a persistent background agent with the
//!   host runtime, watches its lifecycle for new versions, and relays sync
//!   signals from the agent onto the event bus.
//!
//! # Quick Start
//!
//! ```text
//! let bus = EventBus::default();
//! let mut coordinator = SyncCoordinator::new(host, bus.clone(), config);
//! coordinator.register().await;
//!
//! let mut events = bus.subscribe();
//! while let Ok(event) = events.recv().await {
//!     // react to AppEvent::UpdateAvailable / AppEvent::TriggerSync
//! }
//! ```
//!
//! # Modules
//!
//! - `mutation`: optimistic mutation controller
//! - `sync`: agent coordinator, host capability interface, simulated host
//! - `bus`: application event bus
//! - `config`: application configuration

pub mod bus;
pub mod config;
pub mod mutation;
pub mod sync;

pub use bus::{AppEvent, EventBus};
pub use config::Config;
pub use mutation::{MutationController, MutationOptions};
pub use sync::{
    AgentRegistration, AgentState, CoordinatorConfig, HostError, HostRuntime, SyncCoordinator,
};
