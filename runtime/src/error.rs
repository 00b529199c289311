//! Store runtime errors.

use thiserror::Error;

/// Errors surfaced by [`Store`](crate::Store) operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store has begun draining and no longer accepts actions.
    ///
    /// `send()` returns this once `shutdown()` has been called.
    #[error("Store is shutting down")]
    ShutdownInProgress,

    /// Graceful shutdown gave up with effects still in flight.
    ///
    /// Carries the number of effects that had not finished when the
    /// shutdown timeout elapsed.
    #[error("Shutdown timed out with {0} effects still running")]
    ShutdownTimeout(usize),

    /// No matching action arrived inside the deadline.
    ///
    /// Returned by `send_and_wait_for` and `EffectHandle::wait_with_timeout`.
    #[error("Timeout waiting for action")]
    Timeout,

    /// The action feed closed while a caller was still waiting on it.
    #[error("Action broadcast channel closed")]
    ChannelClosed,
}
