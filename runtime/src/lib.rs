//! # Eventure Runtime
//!
//! Runtime implementation for Eventure reducers.
//!
//! This crate provides the [`Store`] that coordinates reducer execution
//! and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: Owns the state, runs the reducer under a write lock and executes effects
//! - **Feedback loop**: Actions produced by effects are sent back into the reducer,
//!   then broadcast to observers
//! - **Metrics**: Prometheus exporter for store and application counters
//!
//! ## Example
//!
//! ```ignore
//! use eventure_runtime::Store;
//!
//! let store = Store::new(AdmissionState::default(), AdmissionReducer::new(), environment);
//!
//! // Fire and forget
//! store.send(RsvpAction::LedgersInvalidated).await?;
//!
//! // Request-response
//! let outcome = store
//!     .send_and_wait_for(request, |a| a.outcome_for() == Some(correlation_id), timeout)
//!     .await?;
//!
//! // Read state
//! let cached = store.state(AdmissionState::cached_ledgers).await;
//! ```

use eventure_core::{effect::Effect, reducer::Reducer};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, broadcast};

/// Prometheus metrics for observability
pub mod metrics;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// This error is returned when `send()` is called after shutdown initiated.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        ///
        /// Some effects were still running when the timeout elapsed.
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for terminal action
        ///
        /// Returned by `send_and_wait_for` when the timeout expires before
        /// a matching action is received.
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Default capacity of the action broadcast channel.
///
/// Every HTTP request waiting on an outcome holds a receiver, so the channel
/// has to absorb bursts of concurrent admissions without lagging.
pub const DEFAULT_BROADCAST_CAPACITY: usize = 1024;

/// Decrements a shared counter when dropped, so a panicking effect
/// still releases its slot.
struct PendingGuard(Arc<AtomicUsize>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The Store - runtime for reducers
///
/// The Store manages:
/// 1. State (behind `RwLock` for concurrent reads)
/// 2. Reducer execution (serialized under the write lock)
/// 3. Effect execution (spawned tasks with feedback loop)
///
/// # Type Parameters
///
/// - `S`: State type
/// - `A`: Action type
/// - `E`: Environment type
/// - `R`: Reducer implementation
pub struct Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    state: Arc<RwLock<S>>,
    reducer: R,
    environment: E,
    shutdown: Arc<AtomicBool>,
    pending_effects: Arc<AtomicUsize>,
    /// Actions produced by effects, for request-response observers.
    action_broadcast: broadcast::Sender<A>,
}

impl<S, A, E, R> Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
    A: Send + Clone + 'static,
    S: Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Create a new store with initial state, reducer, and environment
    #[must_use]
    pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
        Self::with_broadcast_capacity(initial_state, reducer, environment, DEFAULT_BROADCAST_CAPACITY)
    }

    /// Create a new store with a custom action broadcast capacity
    #[must_use]
    pub fn with_broadcast_capacity(
        initial_state: S,
        reducer: R,
        environment: E,
        capacity: usize,
    ) -> Self {
        let (action_broadcast, _) = broadcast::channel(capacity.max(1));

        Self {
            state: Arc::new(RwLock::new(initial_state)),
            reducer,
            environment,
            shutdown: Arc::new(AtomicBool::new(false)),
            pending_effects: Arc::new(AtomicUsize::new(0)),
            action_broadcast,
        }
    }

    /// Send an action to the store
    ///
    /// 1. Acquires write lock on state
    /// 2. Calls reducer with (state, action, environment)
    /// 3. Spawns the returned effects
    ///
    /// Concurrent `send()` calls serialize at the reducer level. `send()`
    /// returns once effects are started, not when they complete.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
    #[tracing::instrument(skip(self, action), name = "store_send")]
    pub async fn send(&self, action: A) -> Result<(), StoreError> {
        if self.shutdown.load(Ordering::Acquire) {
            tracing::warn!("Rejected action: store is shutting down");
            ::metrics::counter!("store.shutdown.rejected_actions").increment(1);
            return Err(StoreError::ShutdownInProgress);
        }

        ::metrics::counter!("store.commands.total").increment(1);

        let effects = {
            let mut state = self.state.write().await;

            let start = std::time::Instant::now();
            let effects = self.reducer.reduce(&mut *state, action, &self.environment);
            ::metrics::histogram!("store.reducer.duration_seconds")
                .record(start.elapsed().as_secs_f64());

            tracing::trace!("Reducer completed, returned {} effects", effects.len());
            effects
        };

        for effect in effects {
            self.execute_effect(effect);
        }

        Ok(())
    }

    /// Send an action and wait for a matching result action
    ///
    /// Subscribes to the action broadcast BEFORE sending, so an outcome
    /// produced by a fast effect cannot be missed.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Timeout`]: Timeout expired before matching action received
    /// - [`StoreError::ChannelClosed`]: Action broadcast channel closed
    /// - [`StoreError::ShutdownInProgress`]: Store is shutting down
    pub async fn send_and_wait_for<F>(
        &self,
        action: A,
        predicate: F,
        timeout: Duration,
    ) -> Result<A, StoreError>
    where
        F: Fn(&A) -> bool,
    {
        let mut rx = self.action_broadcast.subscribe();

        self.send(action).await?;

        tokio::time::timeout(timeout, async {
            loop {
                match rx.recv().await {
                    Ok(action) if predicate(&action) => return Ok(action),
                    Ok(_) => {},
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // If the terminal action was dropped, the timeout catches it
                        tracing::warn!(skipped, "Action observer lagged, {} actions skipped", skipped);
                    },
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(StoreError::ChannelClosed);
                    },
                }
            }
        })
        .await
        .map_err(|_| StoreError::Timeout)?
    }

    /// Subscribe to all actions produced by effects
    #[must_use]
    pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
        self.action_broadcast.subscribe()
    }

    /// Read current state via a closure
    ///
    /// ```ignore
    /// let cached = store.state(AdmissionState::cached_ledgers).await;
    /// ```
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        let state = self.state.read().await;
        f(&*state)
    }

    /// Number of effects currently running
    #[must_use]
    pub fn pending_effects(&self) -> usize {
        self.pending_effects.load(Ordering::Acquire)
    }

    /// Wait until no effects are running, or the timeout elapses
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if effects are still running at the deadline.
    pub async fn settle(&self, timeout: Duration) -> Result<(), StoreError> {
        let poll_interval = Duration::from_millis(10);
        tokio::time::timeout(timeout, async {
            while self.pending_effects() > 0 {
                tokio::time::sleep(poll_interval).await;
            }
        })
        .await
        .map_err(|_| StoreError::Timeout)
    }

    /// Initiate graceful shutdown
    ///
    /// Rejects new actions, then waits for in-flight effects to finish.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if the timeout expires before all
    /// pending effects complete.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        tracing::info!("Initiating graceful shutdown");
        ::metrics::counter!("store.shutdown.initiated").increment(1);

        self.shutdown.store(true, Ordering::Release);

        let start = std::time::Instant::now();
        let poll_interval = Duration::from_millis(100);

        loop {
            let pending = self.pending_effects();

            if pending == 0 {
                tracing::info!("All effects completed, shutdown successful");
                ::metrics::counter!("store.shutdown.completed").increment(1);
                return Ok(());
            }

            if start.elapsed() >= timeout {
                tracing::error!(pending_effects = pending, "Shutdown timeout: {} effects still running", pending);
                ::metrics::counter!("store.shutdown.timeout").increment(1);
                return Err(StoreError::ShutdownTimeout(pending));
            }

            tokio::time::sleep(poll_interval).await;
        }
    }

    fn execute_effect(&self, effect: Effect<A>) {
        match effect {
            Effect::None => {
                ::metrics::counter!("store.effects.executed", "type" => "none").increment(1);
            },
            Effect::Parallel(effects) => {
                ::metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);
                for effect in effects {
                    self.execute_effect(effect);
                }
            },
            Effect::Future(fut) => {
                ::metrics::counter!("store.effects.executed", "type" => "future").increment(1);

                self.pending_effects.fetch_add(1, Ordering::SeqCst);
                let guard = PendingGuard(Arc::clone(&self.pending_effects));
                let store = self.clone();

                tokio::spawn(async move {
                    let _guard = guard;

                    if let Some(action) = fut.await {
                        // Reduce before broadcasting: observers of an action see
                        // the state it produced. Feedback still runs during
                        // shutdown so in-flight work can finish.
                        store.feedback(action.clone()).await;
                        let _ = store.action_broadcast.send(action);
                    }
                });
            },
        }
    }

    async fn feedback(&self, action: A) {
        let effects = {
            let mut state = self.state.write().await;
            self.reducer.reduce(&mut *state, action, &self.environment)
        };

        for effect in effects {
            self.execute_effect(effect);
        }
    }
}

impl<S, A, E, R> Clone for Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Clone,
    E: Clone,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            reducer: self.reducer.clone(),
            environment: self.environment.clone(),
            shutdown: Arc::clone(&self.shutdown),
            pending_effects: Arc::clone(&self.pending_effects),
            action_broadcast: self.action_broadcast.clone(),
        }
    }
}
