//! # Ghumly Testing
//!
//! Testing utilities and helpers for the Ghumly client architecture.
//!
//! This crate provides:
//! - Mock implementations of Environment traits (clock, id generation)
//! - A fluent Given-When-Then API for testing reducers
//! - Assertion helpers for effects
//!
//! ## Example
//!
//! ```ignore
//! use ghumly_testing::{test_clock, ReducerTest};
//!
//! #[test]
//! fn booking_requires_travelers() {
//!     ReducerTest::new(CheckoutReducer)
//!         .with_env(test_environment())
//!         .given_state(CheckoutState::Idle)
//!         .when_action(CheckoutAction::StartCheckout { tour_id, travelers: 0 })
//!         .then_state(|state| {
//!             assert!(state.is_failed());
//!         })
//!         .run();
//! }
//! ```

use chrono::{DateTime, Utc};
use ghumly_core::environment::{Clock, IdGenerator};


/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, IdGenerator, Utc};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use uuid::Uuid;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use ghumly_testing::mocks::FixedClock;
    /// use ghumly_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Sequential id generator for deterministic tests
    ///
    /// Produces UUIDs built from an incrementing counter, so the ids a
    /// reducer embeds in effects (e.g. checkout idempotency keys) are
    /// predictable.
    ///
    /// # Example
    ///
    /// ```
    /// use ghumly_testing::mocks::SequenceIdGenerator;
    /// use ghumly_core::environment::IdGenerator;
    ///
    /// let ids = SequenceIdGenerator::new();
    /// let first = ids.generate();
    /// let second = ids.generate();
    /// assert_ne!(first, second);
    /// assert_eq!(first, SequenceIdGenerator::nth(1));
    /// ```
    #[derive(Debug, Clone, Default)]
    pub struct SequenceIdGenerator {
        counter: Arc<AtomicU64>,
    }

    impl SequenceIdGenerator {
        /// Create a new generator starting at 1
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// The UUID this generator produces on its `n`-th call (1-indexed)
        #[must_use]
        pub fn nth(n: u64) -> Uuid {
            Uuid::from_u128(u128::from(n))
        }
    }

    impl IdGenerator for SequenceIdGenerator {
        fn generate(&self) -> Uuid {
            let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
            Uuid::from_u128(u128::from(n))
        }
    }
}

/// Install a tracing subscriber suitable for tests
///
/// Reads `RUST_LOG` for filtering and writes through the test writer so
/// output is captured per test. Safe to call from multiple tests; only
/// the first call installs the subscriber.
pub fn init_test_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mocks::{test_clock, FixedClock, SequenceIdGenerator};
pub use reducer_test::{assertions, ReducerTest};
