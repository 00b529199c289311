//! Dead letter queue for effects that failed terminally.
//!
//! When an effect panics during execution the store catches the panic,
//! keeps running, and records what happened here. The queue is a bounded
//! FIFO: at capacity the oldest entry is dropped so a persistent failure
//! cannot grow memory without limit. Entries are meant to be inspected by
//! operators (the store health check watches the fill level) or drained by
//! a supervisor.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A failed operation together with failure metadata.
#[derive(Debug, Clone)]
pub struct DeadLetter<T> {
    /// What was being attempted
    pub payload: T,
    /// How many times the operation was retried before giving up
    pub retry_count: usize,
    /// Message from the final failure
    pub error_message: String,
    /// Nanoseconds since epoch at the first failure
    pub first_failed_at: u64,
    /// Nanoseconds since epoch at the last failure
    pub last_failed_at: u64,
}

impl<T> DeadLetter<T> {
    fn record(payload: T, error_message: String, retry_count: usize) -> Self {
        // Note: Truncation acceptable for nanosecond timestamps (wraps every ~584 years)
        #[allow(clippy::cast_possible_truncation)]
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_nanos() as u64;

        Self {
            payload,
            retry_count,
            error_message,
            first_failed_at: now,
            last_failed_at: now,
        }
    }
}

/// Bounded FIFO of failed operations, shared across store clones.
///
/// Cloning the queue clones the handle, not the contents; all clones see
/// the same entries. Safe to use from multiple tasks.
///
/// # Example
///
/// ```ignore
/// let dlq = DeadLetterQueue::new(500);
/// dlq.push("verify_payment".to_string(), "gateway unreachable".to_string(), 0);
///
/// for letter in dlq.drain() {
///     tracing::warn!(payload = %letter.payload, "replaying failed operation");
/// }
/// ```
#[derive(Debug)]
pub struct DeadLetterQueue<T> {
    letters: Arc<Mutex<VecDeque<DeadLetter<T>>>>,
    max_size: usize,
}

impl<T> DeadLetterQueue<T> {
    /// Create a queue holding at most `max_size` entries.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            letters: Arc::new(Mutex::new(VecDeque::new())),
            max_size,
        }
    }

    /// Record a failed operation, evicting the oldest entry when full.
    pub fn push(&self, payload: T, error_message: String, retry_count: usize) {
        let mut letters = self.lock();

        if letters.len() >= self.max_size {
            letters.pop_front();
            metrics::counter!("dlq.dropped").increment(1);
            tracing::warn!(
                max_size = self.max_size,
                "DLQ at capacity, dropping oldest entry"
            );
        }

        letters.push_back(DeadLetter::record(payload, error_message, retry_count));

        // Queue size is bounded by max_size, so the f64 conversion is exact
        #[allow(clippy::cast_precision_loss)]
        metrics::gauge!("dlq.size").set(letters.len() as f64);
        metrics::counter!("dlq.pushed").increment(1);

        tracing::warn!(
            retry_count,
            queue_size = letters.len(),
            "Operation added to dead letter queue"
        );
    }

    /// Number of entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when nothing has failed (or everything was drained).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and return every entry, oldest first.
    pub fn drain(&self) -> Vec<DeadLetter<T>> {
        let drained: Vec<_> = self.lock().drain(..).collect();

        metrics::gauge!("dlq.size").set(0.0);
        metrics::counter!("dlq.drained").increment(drained.len() as u64);
        tracing::info!(count = drained.len(), "Drained dead letter queue");

        drained
    }

    /// Copy of the oldest entry, if any, without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<DeadLetter<T>>
    where
        T: Clone,
    {
        self.lock().front().cloned()
    }

    /// The configured capacity.
    #[must_use]
    pub const fn max_size(&self) -> usize {
        self.max_size
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<DeadLetter<T>>> {
        // A poisoned lock only means a panic elsewhere; the queue itself
        // holds plain data and stays usable.
        self.letters
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl<T> Clone for DeadLetterQueue<T> {
    fn clone(&self) -> Self {
        Self {
            letters: Arc::clone(&self.letters),
            max_size: self.max_size,
        }
    }
}

impl<T> Default for DeadLetterQueue<T> {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_grows_queue() {
        let dlq: DeadLetterQueue<String> = DeadLetterQueue::new(10);
        assert!(dlq.is_empty());

        dlq.push("create_order".to_string(), "timeout".to_string(), 2);
        dlq.push("verify_payment".to_string(), "reset".to_string(), 0);

        assert_eq!(dlq.len(), 2);
    }

    #[test]
    fn peek_returns_oldest_without_removing() {
        let dlq: DeadLetterQueue<String> = DeadLetterQueue::new(10);
        assert!(dlq.peek().is_none());

        dlq.push("first".to_string(), "err".to_string(), 0);
        dlq.push("second".to_string(), "err".to_string(), 0);

        assert!(dlq.peek().is_some_and(|l| l.payload == "first"));
        assert_eq!(dlq.len(), 2);
    }

    #[test]
    fn drain_empties_in_order() {
        let dlq: DeadLetterQueue<u32> = DeadLetterQueue::new(10);
        dlq.push(1, "err".to_string(), 0);
        dlq.push(2, "err".to_string(), 0);

        let drained = dlq.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].payload, 1);
        assert!(dlq.is_empty());
    }

    #[test]
    fn full_queue_evicts_oldest() {
        let dlq: DeadLetterQueue<String> = DeadLetterQueue::new(2);
        dlq.push("a".to_string(), "err".to_string(), 0);
        dlq.push("b".to_string(), "err".to_string(), 0);
        dlq.push("c".to_string(), "err".to_string(), 0);

        assert_eq!(dlq.len(), 2);
        assert!(dlq.peek().is_some_and(|l| l.payload == "b"));
    }

    #[test]
    fn clones_share_contents() {
        let dlq: DeadLetterQueue<String> = DeadLetterQueue::new(10);
        let other = dlq.clone();

        dlq.push("shared".to_string(), "err".to_string(), 0);
        assert_eq!(other.len(), 1);
    }

    #[test]
    fn letter_captures_failure_metadata() {
        let dlq: DeadLetterQueue<String> = DeadLetterQueue::new(10);
        dlq.push("op".to_string(), "gateway timeout".to_string(), 4);

        let letter = dlq.peek();
        assert!(letter.is_some_and(|l| {
            l.retry_count == 4
                && l.error_message == "gateway timeout"
                && l.first_failed_at == l.last_failed_at
        }));
    }
}
