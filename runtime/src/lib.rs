//! # Ghumly Runtime
//!
//! Execution layer for the Ghumly client architecture: the [`Store`] that
//! drives reducers and runs their effects, plus the operational pieces a
//! long-lived client process needs around it.
//!
//! ## Modules
//!
//! - [`store`]: reducer dispatch, effect execution, action broadcast,
//!   graceful shutdown
//! - [`tracking`]: [`EffectHandle`] for awaiting the effects of one action
//! - [`dlq`]: dead letter queue for effects that panicked
//! - [`retry`]: backoff policies and retry helpers used by the API client
//! - [`health`]: health check types aggregated across stores
//! - [`error`]: [`StoreError`]
//! - [`metrics`]: Prometheus exporter and metric recorders
//!
//! ## Quick Start
//!
//! ```ignore
//! use ghumly_runtime::{Store, StoreConfig};
//!
//! let store = Store::new(AuthState::default(), AuthReducer, environment);
//! let mut handle = store.send(AuthAction::RestoreSession).await?;
//! handle.wait().await;
//! let signed_in = store.state(|s| s.session().is_some()).await;
//! ```

pub mod dlq;
pub mod error;
pub mod health;
pub mod metrics;
pub mod retry;
pub mod store;
pub mod tracking;

pub use dlq::{DeadLetter, DeadLetterQueue};
pub use error::StoreError;
pub use health::{HealthCheck, HealthReport, HealthStatus};
pub use retry::{RetryPolicy, RetryPolicyBuilder};
pub use store::{Store, StoreConfig};
pub use tracking::EffectHandle;
