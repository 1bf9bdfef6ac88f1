//! # Clubhouse Runtime
//!
//! The Store runtime that coordinates reducer execution and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: owns a workflow's state, runs the reducer and executes effects
//! - **Effect Executor**: spawns provider calls and feeds their result actions back
//! - **Action broadcast**: lets HTTP handlers wait for the terminal action of a request
//!
//! ## Example
//!
//! ```ignore
//! use clubhouse_runtime::Store;
//!
//! let store = Store::new(BookingState::default(), BookingReducer::new(), env);
//!
//! store.send(BookingAction::LoadSessions).await?.wait().await;
//!
//! let count = store.state(|s| s.sessions.len()).await;
//! ```

use clubhouse_core::{effect::Effect, reducer::Reducer};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{broadcast, watch, RwLock};

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for a terminal action or effect completion
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,

        /// Every effect started by the action finished without producing a
        /// matching result, e.g. the reducer ignored the action
        #[error("Action finished without a matching result")]
        NoResult,
    }
}

pub use error::StoreError;

/// Default capacity of the action broadcast channel.
const DEFAULT_BROADCAST_CAPACITY: usize = 64;

/// Shared counter of effects still running for one `send`.
///
/// Actions fed back by effects reuse the tracking of the action that
/// produced them, so a handle waits for the whole cascade and every
/// feedback action carries the `origin` of the `send` that started it.
#[derive(Clone)]
struct EffectTracking {
    origin: u64,
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    fn new(origin: u64) -> (EffectHandle, Self) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (notifier, completion) = watch::channel(());
        let handle = EffectHandle {
            counter: Arc::clone(&counter),
            completion,
        };
        (
            handle,
            Self {
                origin,
                counter,
                notifier: Arc::new(notifier),
            },
        )
    }

    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.notifier.send_replace(());
        }
    }
}

/// Decrements tracking when dropped, including when the effect panics.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Decrements the store-wide pending effect count when dropped.
struct PendingGuard(Arc<AtomicUsize>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Handle for waiting on the effects started by one `send`.
///
/// ```ignore
/// let mut handle = store.send(BookingAction::LoadSessions).await?;
/// handle.wait().await;
/// ```
pub struct EffectHandle {
    counter: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    /// A handle with no pending effects.
    #[must_use]
    pub fn completed() -> Self {
        let (_, completion) = watch::channel(());
        Self {
            counter: Arc::new(AtomicUsize::new(0)),
            completion,
        }
    }

    /// Number of effects still running.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.counter.load(Ordering::SeqCst)
    }

    /// Wait until every effect in the cascade has completed.
    pub async fn wait(&mut self) {
        while self.counter.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                break;
            }
        }
    }

    /// Wait for completion, giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if effects are still running when the
    /// timeout elapses.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

/// The Store - runtime for one reducer
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
    reducer: Arc<R>,
    environment: Arc<E>,
    shutdown: Arc<AtomicBool>,
    pending_effects: Arc<AtomicUsize>,
    next_origin: Arc<AtomicU64>,
    /// Every action produced by an effect is broadcast here once the
    /// reducer has applied it.
    action_broadcast: broadcast::Sender<A>,
    /// Same actions, tagged with the `send` they descend from.
    origin_broadcast: broadcast::Sender<(u64, A)>,
}

impl<S, A, E, R> Clone for Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            reducer: Arc::clone(&self.reducer),
            environment: Arc::clone(&self.environment),
            shutdown: Arc::clone(&self.shutdown),
            pending_effects: Arc::clone(&self.pending_effects),
            next_origin: Arc::clone(&self.next_origin),
            action_broadcast: self.action_broadcast.clone(),
            origin_broadcast: self.origin_broadcast.clone(),
        }
    }
}

impl<S, A, E, R> Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
    A: Send + Clone + 'static,
    S: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Create a new store with initial state, reducer, and environment
    #[must_use]
    pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
        Self::with_broadcast_capacity(initial_state, reducer, environment, DEFAULT_BROADCAST_CAPACITY)
    }

    /// Create a store with a custom action broadcast capacity
    #[must_use]
    pub fn with_broadcast_capacity(
        initial_state: S,
        reducer: R,
        environment: E,
        capacity: usize,
    ) -> Self {
        let (action_broadcast, _) = broadcast::channel(capacity.max(1));
        let (origin_broadcast, _) = broadcast::channel(capacity.max(1));

        Self {
            state: Arc::new(RwLock::new(initial_state)),
            reducer: Arc::new(reducer),
            environment: Arc::new(environment),
            shutdown: Arc::new(AtomicBool::new(false)),
            pending_effects: Arc::new(AtomicUsize::new(0)),
            next_origin: Arc::new(AtomicU64::new(0)),
            action_broadcast,
            origin_broadcast,
        }
    }

    /// Send an action to the store
    ///
    /// Runs the reducer under the state write lock, then starts the returned
    /// effects. The returned handle waits for those effects and for any
    /// effects started by the actions they feed back.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
    #[tracing::instrument(skip(self, action), name = "store_send")]
    pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
        let (_, handle) = self.send_tracked(action).await?;
        Ok(handle)
    }

    async fn send_tracked(&self, action: A) -> Result<(u64, EffectHandle), StoreError> {
        let origin = self.next_origin.fetch_add(1, Ordering::Relaxed);
        let (handle, tracking) = EffectTracking::new(origin);
        self.dispatch(action, tracking, false).await?;
        Ok((origin, handle))
    }

    /// Send an action and wait for a matching result action
    ///
    /// Only actions fed back by this action's own effects are matched, so
    /// concurrent callers never take each other's results. When the result
    /// is returned the reducer has already applied it.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Timeout`]: no matching action before `timeout`
    /// - [`StoreError::NoResult`]: the effects finished without a match
    /// - [`StoreError::ChannelClosed`]: broadcast closed
    /// - [`StoreError::ShutdownInProgress`]: store is shutting down
    pub async fn send_and_wait_for<F>(
        &self,
        action: A,
        predicate: F,
        timeout: Duration,
    ) -> Result<A, StoreError>
    where
        F: Fn(&A) -> bool,
    {
        let mut rx = self.origin_broadcast.subscribe();

        let (origin, mut handle) = self.send_tracked(action).await?;

        tokio::time::timeout(timeout, async {
            loop {
                tokio::select! {
                    biased;
                    received = rx.recv() => match received {
                        Ok((from, action)) if from == origin && predicate(&action) => {
                            return Ok(action);
                        },
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Action observer lagged");
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    },
                    () = handle.wait() => {
                        // Feedback is broadcast before its effect completes.
                        loop {
                            match rx.try_recv() {
                                Ok((from, action)) if from == origin && predicate(&action) => {
                                    return Ok(action);
                                },
                                Ok(_) | Err(broadcast::error::TryRecvError::Lagged(_)) => {},
                                Err(_) => return Err(StoreError::NoResult),
                            }
                        }
                    },
                }
            }
        })
        .await
        .map_err(|_| StoreError::Timeout)?
    }

    /// Subscribe to actions produced by effects
    #[must_use]
    pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
        self.action_broadcast.subscribe()
    }

    /// Read current state via a closure
    ///
    /// ```ignore
    /// let banner = store.state(|s| s.banner.clone()).await;
    /// ```
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        let state = self.state.read().await;
        f(&*state)
    }

    /// Number of effects currently running across all sends
    #[must_use]
    pub fn pending_effects(&self) -> usize {
        self.pending_effects.load(Ordering::SeqCst)
    }

    /// Whether shutdown has been initiated
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Stop accepting actions and wait for running effects to finish
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] with the number of effects
    /// still running if they do not finish within `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        self.shutdown.store(true, Ordering::Release);
        tracing::debug!(pending = self.pending_effects(), "Store shutdown initiated");

        let deadline = tokio::time::Instant::now() + timeout;
        while self.pending_effects() > 0 {
            if tokio::time::Instant::now() >= deadline {
                let remaining = self.pending_effects();
                tracing::warn!(remaining, "Store shutdown timed out");
                return Err(StoreError::ShutdownTimeout(remaining));
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        Ok(())
    }

    /// Run the reducer, then start its effects.
    ///
    /// Feedback actions are broadcast after the reducer has applied them and
    /// before their own effects start.
    async fn dispatch(
        &self,
        action: A,
        tracking: EffectTracking,
        feedback: bool,
    ) -> Result<(), StoreError> {
        if self.shutdown.load(Ordering::Acquire) {
            tracing::warn!("Rejected action: store is shutting down");
            metrics::counter!("store.shutdown.rejected_actions").increment(1);
            return Err(StoreError::ShutdownInProgress);
        }

        metrics::counter!("store.commands.total").increment(1);

        let announced = feedback.then(|| action.clone());
        let effects = {
            let mut state = self.state.write().await;
            self.reducer.reduce(&mut *state, action, &self.environment)
        };

        if let Some(action) = announced {
            let _ = self.action_broadcast.send(action.clone());
            let _ = self.origin_broadcast.send((tracking.origin, action));
        }

        tracing::trace!("Reducer returned {} effects", effects.len());
        for effect in effects {
            self.execute(effect, tracking.clone());
        }

        Ok(())
    }

    fn execute(&self, effect: Effect<A>, tracking: EffectTracking) {
        match effect {
            Effect::None => {
                metrics::counter!("store.effects.executed", "type" => "none").increment(1);
            },
            Effect::Future(fut) => {
                metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                tracking.increment();
                self.pending_effects.fetch_add(1, Ordering::SeqCst);
                let pending_guard = PendingGuard(Arc::clone(&self.pending_effects));
                let store = self.clone();

                tokio::spawn(async move {
                    let _guard = DecrementGuard(tracking.clone());
                    let _pending_guard = pending_guard;

                    if let Some(action) = fut.await {
                        if let Err(error) = store.dispatch(action, tracking, true).await {
                            tracing::warn!(%error, "Feedback action dropped");
                        }
                    }
                });
            },
            Effect::Delay { duration, action } => {
                metrics::counter!("store.effects.executed", "type" => "delay").increment(1);
                tracking.increment();
                self.pending_effects.fetch_add(1, Ordering::SeqCst);
                let pending_guard = PendingGuard(Arc::clone(&self.pending_effects));
                let store = self.clone();

                tokio::spawn(async move {
                    let _guard = DecrementGuard(tracking.clone());
                    let _pending_guard = pending_guard;

                    tokio::time::sleep(duration).await;
                    if let Err(error) = store.dispatch(*action, tracking, true).await {
                        tracing::warn!(%error, "Delayed action dropped");
                    }
                });
            },
            Effect::Parallel(effects) => {
                metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);
                for effect in effects {
                    self.execute(effect, tracking.clone());
                }
            },
        }
    }
}
