//! Optimistic mutation controller
//!
//! Lets a caller mutate state immediately for responsiveness while a slower
//! authoritative write happens in the background. The speculative value is
//! published before the remote call is issued; a failed write restores the
//! pre-operation state so the visible value never disagrees with what was
//! actually persisted.
//!
//! State, the loading flag and the last error are published through `watch`
//! channels, so observers can follow them while an `execute` call is
//! suspended on the remote operation.
//!
//! Calls serialize per controller instance: `execute` takes `&mut self`, so
//! a second call cannot begin until the first has settled and every call's
//! baseline is the previously settled state.

use std::fmt::Display;

use futures_util::future::BoxFuture;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Pure function computing the speculative next state
///
/// Must not perform I/O; an error here propagates before any state mutation.
pub type Transform<T, P, E> = Box<dyn Fn(&T, &P) -> Result<T, E> + Send + Sync>;

/// Asynchronous authoritative write against the remote system
pub type RemoteOp<P, R, E> = Box<dyn Fn(P) -> BoxFuture<'static, Result<R, E>> + Send + Sync>;

/// Hook fired after a successful remote commit
pub type SuccessHook<R> = Box<dyn Fn(&R) + Send + Sync>;

/// Hook fired after a failed remote commit
pub type ErrorHook<E> = Box<dyn Fn(&E) + Send + Sync>;

/// Options recognized by the controller
pub struct MutationOptions<R, E> {
    on_success: Option<SuccessHook<R>>,
    on_error: Option<ErrorHook<E>>,
    rollback_on_error: bool,
}

impl<R, E> MutationOptions<R, E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the given hook after each successful remote commit
    pub fn with_success_hook(mut self, hook: SuccessHook<R>) -> Self {
        self.on_success = Some(hook);
        self
    }

    /// Fire the given hook after each failed remote commit
    pub fn with_error_hook(mut self, hook: ErrorHook<E>) -> Self {
        self.on_error = Some(hook);
        self
    }

    /// Whether a failed commit restores the pre-operation state (default true)
    pub fn with_rollback(mut self, rollback: bool) -> Self {
        self.rollback_on_error = rollback;
        self
    }
}

impl<R, E> Default for MutationOptions<R, E> {
    fn default() -> Self {
        Self {
            on_success: None,
            on_error: None,
            rollback_on_error: true,
        }
    }
}

/// Optimistic mutation controller
///
/// Owns one piece of application state and is the only writer to it.
/// Observers read through [`state`](Self::state) or the watch receivers.
pub struct MutationController<T, P, R, E> {
    state_tx: watch::Sender<T>,
    state_rx: watch::Receiver<T>,
    loading_tx: watch::Sender<bool>,
    loading_rx: watch::Receiver<bool>,
    error_tx: watch::Sender<Option<String>>,
    error_rx: watch::Receiver<Option<String>>,
    transform: Transform<T, P, E>,
    remote: RemoteOp<P, R, E>,
    options: MutationOptions<R, E>,
}

impl<T, P, R, E> MutationController<T, P, R, E>
where
    T: Clone,
    E: Display,
{
    /// Create a controller with default options
    pub fn new(initial: T, transform: Transform<T, P, E>, remote: RemoteOp<P, R, E>) -> Self {
        let (state_tx, state_rx) = watch::channel(initial);
        let (loading_tx, loading_rx) = watch::channel(false);
        let (error_tx, error_rx) = watch::channel(None);

        Self {
            state_tx,
            state_rx,
            loading_tx,
            loading_rx,
            error_tx,
            error_rx,
            transform,
            remote,
            options: MutationOptions::default(),
        }
    }

    /// Replace the controller options
    pub fn with_options(mut self, options: MutationOptions<R, E>) -> Self {
        self.options = options;
        self
    }

    /// Current state
    pub fn state(&self) -> T {
        self.state_rx.borrow().clone()
    }

    /// Subscribe to state changes
    pub fn subscribe_state(&self) -> watch::Receiver<T> {
        self.state_rx.clone()
    }

    /// Whether a remote commit is in flight
    pub fn is_loading(&self) -> bool {
        *self.loading_rx.borrow()
    }

    /// Subscribe to loading flag changes
    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.loading_rx.clone()
    }

    /// Error from the most recent `execute`, cleared when the next one starts
    pub fn last_error(&self) -> Option<String> {
        self.error_rx.borrow().clone()
    }

    /// Apply the transform optimistically, then commit remotely
    ///
    /// The speculative state is visible to observers strictly before the
    /// remote operation is issued. On success the state stays at the
    /// optimistic value; the server's authoritative value is not
    /// auto-reconciled. On failure the pre-operation state is restored when
    /// rollback is enabled, and the error is re-raised to the caller either
    /// way.
    pub async fn execute(&mut self, params: P) -> Result<R, E> {
        let previous = self.state_rx.borrow().clone();
        let _ = self.loading_tx.send(true);
        let _ = self.error_tx.send(None);

        // Speculative step. A transform error propagates with the state
        // untouched.
        let next = match (self.transform)(&previous, &params) {
            Ok(next) => next,
            Err(e) => {
                let _ = self.error_tx.send(Some(e.to_string()));
                let _ = self.loading_tx.send(false);
                return Err(e);
            }
        };
        let _ = self.state_tx.send(next);
        debug!("optimistic state applied, committing remotely");

        match (self.remote)(params).await {
            Ok(result) => {
                let _ = self.loading_tx.send(false);
                if let Some(hook) = &self.options.on_success {
                    hook(&result);
                }
                Ok(result)
            }
            Err(e) => {
                warn!("remote commit failed: {}", e);
                if self.options.rollback_on_error {
                    let _ = self.state_tx.send(previous);
                }
                let _ = self.error_tx.send(Some(e.to_string()));
                let _ = self.loading_tx.send(false);
                if let Some(hook) = &self.options.on_error {
                    hook(&e);
                }
                Err(e)
            }
        }
    }
}
