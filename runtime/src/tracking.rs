//! Per-action effect completion tracking.
//!
//! Every `send()` hands back an [`EffectHandle`] tied to the effects that
//! one action produced. The handle counts effects still running and wakes
//! waiters through a watch channel when the count hits zero. The counting
//! half ([`EffectTracking`]) travels with the effects through execution and
//! is decremented by an RAII guard, so a panicking effect still releases
//! its slot.

use crate::error::StoreError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Await-able handle over the effects a single action produced.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(CheckoutAction::StartCheckout { .. }).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// // The order-creation effect has finished (its feedback action may
/// // itself have spawned further effects with their own handles).
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    remaining: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    /// Build a linked handle/tracking pair for one action.
    pub(crate) fn new() -> (Self, EffectTracking) {
        let remaining = Arc::new(AtomicUsize::new(0));
        let (notify, completion) = watch::channel(());

        let handle = Self {
            remaining: Arc::clone(&remaining),
            completion,
        };
        let tracking = EffectTracking { remaining, notify };

        (handle, tracking)
    }

    /// A handle with nothing to wait for.
    ///
    /// Handy as the seed value when accumulating the last handle of a loop:
    ///
    /// ```ignore
    /// let mut last = EffectHandle::completed();
    /// for action in actions {
    ///     last = store.send(action).await?;
    /// }
    /// last.wait().await;
    /// ```
    #[must_use]
    pub fn completed() -> Self {
        let (notify, completion) = watch::channel(());
        let _ = notify.send(());

        Self {
            remaining: Arc::new(AtomicUsize::new(0)),
            completion,
        }
    }

    /// Wait until every tracked effect has finished.
    pub async fn wait(&mut self) {
        while self.remaining.load(Ordering::SeqCst) > 0 {
            let _ = self.completion.changed().await;
        }
    }

    /// Wait for completion, giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] when effects are still running at
    /// the deadline.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.remaining.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Counting half of an [`EffectHandle`], carried through effect execution.
pub(crate) struct EffectTracking {
    pub(crate) remaining: Arc<AtomicUsize>,
    pub(crate) notify: watch::Sender<()>,
}

impl EffectTracking {
    /// Register one more running effect.
    pub(crate) fn started(&self) {
        self.remaining.fetch_add(1, Ordering::SeqCst);
    }

    /// Mark one effect finished, waking waiters at zero.
    pub(crate) fn finished(&self) {
        if self.remaining.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.notify.send(());
        }
    }
}

impl Clone for EffectTracking {
    fn clone(&self) -> Self {
        Self {
            remaining: Arc::clone(&self.remaining),
            notify: self.notify.clone(),
        }
    }
}

/// Calls [`EffectTracking::finished`] on drop, panic or not.
pub(crate) struct FinishOnDrop(pub(crate) EffectTracking);

impl Drop for FinishOnDrop {
    fn drop(&mut self) {
        self.0.finished();
    }
}

/// Decrements a shared counter on drop; used for the store-wide in-flight
/// effect count that graceful shutdown waits on.
pub(crate) struct CounterGuard(pub(crate) Arc<AtomicUsize>);

impl Drop for CounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
