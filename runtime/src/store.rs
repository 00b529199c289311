//! The store: reducer dispatch and effect execution.
//!
//! A [`Store`] owns one feature's state behind an async `RwLock`, runs the
//! reducer for every incoming action while holding the write lock, then
//! executes the returned effects on the tokio runtime. Actions produced by
//! effects are fed back through `send`, which is what turns a checkout or
//! login into a chain of `(state, action)` transitions rather than nested
//! callbacks.
//!
//! Concurrency model:
//!
//! - reducers run serialized (one write lock), effects run concurrently;
//! - `send` returns once effects are *started*, with an [`EffectHandle`]
//!   to wait for them;
//! - effect panics are caught and recorded in the dead letter queue, the
//!   store keeps serving;
//! - reducer panics propagate. Reducers are pure and must not panic.

use crate::dlq::DeadLetterQueue;
use crate::error::StoreError;
use crate::health::HealthCheck;
use crate::tracking::{CounterGuard, EffectHandle, EffectTracking, FinishOnDrop};
use futures::FutureExt;
use ghumly_core::{effect::Effect, reducer::Reducer};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, watch, RwLock};

/// Tunables for a [`Store`] instance.
///
/// ```ignore
/// let config = StoreConfig::default()
///     .with_dlq_max_size(500)
///     .with_broadcast_capacity(64)
///     .with_shutdown_timeout(Duration::from_secs(10));
/// let store = Store::with_config(CheckoutState::Idle, CheckoutReducer, env, config);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Capacity of the dead letter queue
    pub dlq_max_size: usize,
    /// Capacity of the action broadcast channel observers subscribe to
    pub broadcast_capacity: usize,
    /// How long `shutdown()` waits for in-flight effects
    pub shutdown_timeout: Duration,
}

impl StoreConfig {
    /// Build a config with explicit values.
    #[must_use]
    pub const fn new(
        dlq_max_size: usize,
        broadcast_capacity: usize,
        shutdown_timeout: Duration,
    ) -> Self {
        Self {
            dlq_max_size,
            broadcast_capacity,
            shutdown_timeout,
        }
    }

    /// Override the dead letter queue capacity.
    #[must_use]
    pub const fn with_dlq_max_size(mut self, max_size: usize) -> Self {
        self.dlq_max_size = max_size;
        self
    }

    /// Override the action broadcast capacity. Raise it when observers are
    /// slow or numerous, otherwise they see `RecvError::Lagged`.
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Override the graceful shutdown timeout.
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dlq_max_size: 1000,
            broadcast_capacity: 16,
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// Runtime coordinator for one reducer.
///
/// Clones share everything: state, dead letter queue, shutdown flag and
/// the action feed. Cloning a store is how effects and observers keep a
/// way back into it.
///
/// # Type Parameters
///
/// - `S`: state owned by the store
/// - `A`: action type the reducer consumes
/// - `E`: environment of injected dependencies
/// - `R`: the reducer itself
///
/// # Example
///
/// ```ignore
/// let store = Store::new(CheckoutState::Idle, CheckoutReducer, environment);
/// store.send(CheckoutAction::StartCheckout { tour, travelers: 2 }).await?;
/// let confirmed = store.state(|s| matches!(s, CheckoutState::Confirmed { .. })).await;
/// ```
pub struct Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    state: Arc<RwLock<S>>,
    reducer: R,
    environment: E,
    dlq: DeadLetterQueue<String>,
    draining: Arc<AtomicBool>,
    shutdown_timeout: Duration,
    inflight: Arc<AtomicUsize>,
    /// Every action produced by an effect is offered to subscribers here
    /// before being fed back into the reducer. Drives `send_and_wait_for`
    /// and outside observation of a flow.
    observers: broadcast::Sender<A>,
}

impl<S, A, E, R> Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
    A: Send + Clone + 'static,
    S: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Store with default configuration (DLQ 1000, broadcast 16, shutdown
    /// timeout 30s).
    #[must_use]
    pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
        Self::with_config(initial_state, reducer, environment, StoreConfig::default())
    }

    /// Store with explicit [`StoreConfig`].
    #[must_use]
    pub fn with_config(initial_state: S, reducer: R, environment: E, config: StoreConfig) -> Self {
        let (observers, _) = broadcast::channel(config.broadcast_capacity);

        Self {
            state: Arc::new(RwLock::new(initial_state)),
            reducer,
            environment,
            dlq: DeadLetterQueue::new(config.dlq_max_size),
            draining: Arc::new(AtomicBool::new(false)),
            shutdown_timeout: config.shutdown_timeout,
            inflight: Arc::new(AtomicUsize::new(0)),
            observers,
        }
    }

    /// Store with default config except for the broadcast capacity.
    #[must_use]
    pub fn with_broadcast_capacity(
        initial_state: S,
        reducer: R,
        environment: E,
        capacity: usize,
    ) -> Self {
        Self::with_config(
            initial_state,
            reducer,
            environment,
            StoreConfig::default().with_broadcast_capacity(capacity),
        )
    }

    /// Handle to the dead letter queue shared by this store and its clones.
    #[must_use]
    pub fn dlq(&self) -> DeadLetterQueue<String> {
        self.dlq.clone()
    }

    /// Health of this store, judged by dead letter queue pressure:
    /// degraded past half capacity, unhealthy when full.
    #[must_use]
    pub fn health(&self) -> HealthCheck {
        let size = self.dlq.len();
        let capacity = self.dlq.max_size();
        // Note: Precision loss acceptable for a fill percentage
        #[allow(clippy::cast_precision_loss)]
        let fill_pct = (size as f64 / capacity as f64) * 100.0;

        let check = if size >= capacity {
            HealthCheck::unhealthy("store", "Dead letter queue is full")
        } else if fill_pct > 50.0 {
            // Note: Truncation intentional for display percentage
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let pct = fill_pct as u32;
            HealthCheck::degraded("store", format!("Dead letter queue is {pct}% full"))
        } else {
            HealthCheck::healthy("store")
        };

        check
            .with_metadata("dlq_size", size.to_string())
            .with_metadata("dlq_capacity", capacity.to_string())
            .with_metadata("dlq_usage_pct", format!("{fill_pct:.1}"))
    }

    /// Drain the store: refuse new actions, then wait for in-flight
    /// effects up to the configured timeout.
    ///
    /// Safe to call more than once; later calls just wait again.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] with the count of effects
    /// still running when the deadline passes.
    pub async fn shutdown(&self) -> Result<(), StoreError> {
        tracing::info!("Initiating graceful shutdown");
        metrics::counter!("store.shutdown.initiated").increment(1);

        self.draining.store(true, Ordering::Release);

        let started = Instant::now();
        let poll = Duration::from_millis(100);

        loop {
            let remaining = self.inflight.load(Ordering::Acquire);
            if remaining == 0 {
                tracing::info!("All effects completed, shutdown successful");
                metrics::counter!("store.shutdown.completed").increment(1);
                return Ok(());
            }

            if started.elapsed() >= self.shutdown_timeout {
                tracing::error!(
                    pending_effects = remaining,
                    "Shutdown timed out with effects still running"
                );
                metrics::counter!("store.shutdown.timeout").increment(1);
                return Err(StoreError::ShutdownTimeout(remaining));
            }

            tracing::debug!(
                pending_effects = remaining,
                elapsed_ms = started.elapsed().as_millis(),
                "Waiting for effects to complete"
            );
            tokio::time::sleep(poll).await;
        }
    }

    /// Run one action through the reducer and start its effects.
    ///
    /// The reducer runs under the state write lock; effects are spawned
    /// after the lock is released. Concurrent `send` calls therefore
    /// serialize at the reducer and interleave at the effects. The
    /// returned [`EffectHandle`] completes when the effects of *this*
    /// action are done; feedback actions get handles of their own.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after `shutdown()` has
    /// been initiated.
    ///
    /// # Panics
    ///
    /// A panicking reducer propagates. Keep reducers pure.
    #[tracing::instrument(skip(self, action), name = "store_send")]
    pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError>
    where
        R: Clone,
        E: Clone,
        A: Clone,
    {
        if self.draining.load(Ordering::Acquire) {
            tracing::warn!("Rejected action: store is shutting down");
            metrics::counter!("store.shutdown.rejected_actions").increment(1);
            return Err(StoreError::ShutdownInProgress);
        }

        tracing::debug!("Processing action");
        metrics::counter!("store.actions.total").increment(1);

        let (handle, tracking) = EffectHandle::new();

        let effects = {
            let mut state = self.state.write().await;

            let span = tracing::debug_span!("reducer_execution");
            let _enter = span.enter();

            let reduce_started = Instant::now();
            let effects = self.reducer.reduce(&mut state, action, &self.environment);
            metrics::histogram!("store.reducer.duration_seconds")
                .record(reduce_started.elapsed().as_secs_f64());

            // Note: Precision loss acceptable for metrics (effect counts < 2^52)
            #[allow(clippy::cast_precision_loss)]
            metrics::histogram!("store.effects.count").record(effects.len() as f64);
            tracing::trace!(count = effects.len(), "Reducer returned effects");

            effects
        };

        for effect in effects {
            self.run_effect(effect, tracking.clone());
        }

        Ok(handle)
    }

    /// Send an action, then wait for an effect-produced action matching
    /// `predicate`.
    ///
    /// Subscribes to the action feed *before* sending so a fast effect
    /// cannot slip its result past the caller. Useful for driving a flow
    /// to a terminal action:
    ///
    /// ```ignore
    /// let outcome = store.send_and_wait_for(
    ///     CheckoutAction::StartCheckout { tour, travelers },
    ///     |a| matches!(a, CheckoutAction::Confirmed { .. } | CheckoutAction::Failed { .. }),
    ///     Duration::from_secs(30),
    /// ).await?;
    /// ```
    ///
    /// Only effect-produced actions travel the feed; the action passed in
    /// here is not matched against the predicate. A lagging feed drops old
    /// actions; if the terminal action is among them the timeout fires.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Timeout`]: deadline passed without a match
    /// - [`StoreError::ChannelClosed`]: feed closed while waiting
    /// - [`StoreError::ShutdownInProgress`]: store already draining
    pub async fn send_and_wait_for<F>(
        &self,
        action: A,
        predicate: F,
        timeout: Duration,
    ) -> Result<A, StoreError>
    where
        R: Clone,
        E: Clone,
        A: Clone,
        F: Fn(&A) -> bool,
    {
        let mut feed = self.observers.subscribe();

        self.send(action).await?;

        tokio::time::timeout(timeout, async {
            loop {
                match feed.recv().await {
                    Ok(seen) if predicate(&seen) => return Ok(seen),
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Keep waiting; a dropped terminal action is
                        // caught by the timeout.
                        tracing::warn!(skipped, "Action observer lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(StoreError::ChannelClosed);
                    }
                }
            }
        })
        .await
        .map_err(|_| StoreError::Timeout)?
    }

    /// Subscribe to every action produced by effects.
    ///
    /// Initial actions passed to `send` are not broadcast, only what
    /// effects feed back. Slow receivers observe `RecvError::Lagged` and
    /// continue from the newest actions.
    #[must_use]
    pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
        self.observers.subscribe()
    }

    /// Read the state through a closure, holding the read lock only for
    /// the closure's duration.
    ///
    /// ```ignore
    /// let signed_in = store.state(|s| s.session().is_some()).await;
    /// ```
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        let state = self.state.read().await;
        f(&state)
    }

    /// Start one effect, wiring completion tracking and the action
    /// feedback loop.
    ///
    /// `Future`, `Delay` and `Sequential` spawn tasks and count against
    /// both the per-action handle and the store-wide in-flight counter;
    /// `Parallel` fans out inline; `None` only bumps a counter. A panic
    /// inside a future is caught and pushed to the dead letter queue.
    #[allow(clippy::needless_pass_by_value)] // tracking is cloned per effect on purpose
    fn run_effect(&self, effect: Effect<A>, tracking: EffectTracking)
    where
        R: Clone,
        E: Clone,
        A: Clone + Send + 'static,
    {
        match effect {
            Effect::None => {
                metrics::counter!("store.effects.executed", "type" => "none").increment(1);
            }
            Effect::Future(future) => {
                metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                tracking.started();
                self.inflight.fetch_add(1, Ordering::SeqCst);
                let inflight_guard = CounterGuard(Arc::clone(&self.inflight));
                let store = self.clone();

                tokio::spawn(async move {
                    let _done = FinishOnDrop(tracking);
                    let _inflight = inflight_guard;

                    let started = Instant::now();
                    match AssertUnwindSafe(future).catch_unwind().await {
                        Ok(Some(action)) => {
                            metrics::histogram!("store.effects.duration_seconds")
                                .record(started.elapsed().as_secs_f64());
                            // Observers first, then the feedback dispatch.
                            let _ = store.observers.send(action.clone());
                            let _ = store.send(action).await;
                        }
                        Ok(None) => {
                            metrics::histogram!("store.effects.duration_seconds")
                                .record(started.elapsed().as_secs_f64());
                        }
                        Err(panic) => {
                            let message = describe_panic(panic.as_ref());
                            metrics::counter!("store.effects.failed").increment(1);
                            tracing::error!(error = %message, "Effect panicked");
                            store.dlq.push("future_effect".to_string(), message, 0);
                        }
                    }
                });
            }
            Effect::Delay { duration, action } => {
                metrics::counter!("store.effects.executed", "type" => "delay").increment(1);
                tracking.started();
                self.inflight.fetch_add(1, Ordering::SeqCst);
                let inflight_guard = CounterGuard(Arc::clone(&self.inflight));
                let store = self.clone();

                tokio::spawn(async move {
                    let _done = FinishOnDrop(tracking);
                    let _inflight = inflight_guard;

                    tokio::time::sleep(duration).await;
                    let _ = store.observers.send((*action).clone());
                    let _ = store.send(*action).await;
                });
            }
            Effect::Parallel(effects) => {
                metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);
                for effect in effects {
                    self.run_effect(effect, tracking.clone());
                }
            }
            Effect::Sequential(effects) => {
                metrics::counter!("store.effects.executed", "type" => "sequential").increment(1);
                tracking.started();
                self.inflight.fetch_add(1, Ordering::SeqCst);
                let inflight_guard = CounterGuard(Arc::clone(&self.inflight));
                let store = self.clone();

                tokio::spawn(async move {
                    let _done = FinishOnDrop(tracking);
                    let _inflight = inflight_guard;

                    for effect in effects {
                        // Each step gets its own tracking pair so the next
                        // one starts only after it fully completes.
                        let (step_tx, mut step_rx) = watch::channel(());
                        let step_tracking = EffectTracking {
                            remaining: Arc::new(AtomicUsize::new(0)),
                            notify: step_tx,
                        };

                        store.run_effect(effect, step_tracking.clone());

                        if step_tracking.remaining.load(Ordering::SeqCst) > 0 {
                            let _ = step_rx.changed().await;
                        }
                    }
                });
            }
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
            dlq: self.dlq.clone(),
            draining: Arc::clone(&self.draining),
            shutdown_timeout: self.shutdown_timeout,
            inflight: Arc::clone(&self.inflight),
            observers: self.observers.clone(),
        }
    }
}

/// Best-effort text for a caught panic payload.
fn describe_panic(payload: &(dyn std::any::Any + Send)) -> String {
    payload.downcast_ref::<&str>().map_or_else(
        || {
            payload
                .downcast_ref::<String>()
                .cloned()
                .unwrap_or_else(|| "effect panicked".to_string())
        },
        |s| (*s).to_string(),
    )
}
