//! # Ghumly Booking
//!
//! Checkout orchestration: tour id and traveler count in, a confirmed
//! (or failed, or cancelled) booking out.
//!
//! The flow runs create-order, gateway widget hand-off and payment
//! verification as one [`CheckoutReducer`] over an explicit
//! [`CheckoutState`] tagged union, so every step is unit-testable
//! against a scripted widget and API. The guarantees the state machine
//! carries:
//!
//! - group-size validation before any network call
//! - a double-submit guard (`StartCheckout` outside `Idle` is dropped)
//! - a fresh idempotency key per attempt on the create-order call
//! - stale widget callbacks ignored by gateway order id
//! - dismissal cancels with no verification call and no compensation
//!
//! ```ignore
//! use ghumly_booking::{CheckoutAction, CheckoutEnvironment, CheckoutReducer, CheckoutState};
//!
//! let store = Store::new(CheckoutState::Idle, CheckoutReducer::new(), environment);
//! let outcome = store
//!     .send_and_wait_for(
//!         CheckoutAction::StartCheckout { tour, travelers: 2 },
//!         |a| matches!(
//!             a,
//!             CheckoutAction::VerificationSucceeded { .. }
//!                 | CheckoutAction::OrderFailed { .. }
//!                 | CheckoutAction::WidgetDismissed { .. }
//!         ),
//!         Duration::from_secs(120),
//!     )
//!     .await?;
//! ```

pub mod environment;
pub mod reducer;
pub mod types;
pub mod widget;

#[cfg(feature = "test-utils")]
pub mod mocks;

pub use environment::{BookingApi, BookingApiFuture, CheckoutEnvironment};
pub use reducer::CheckoutReducer;
pub use types::{CheckoutAction, CheckoutFailure, CheckoutState, PAYMENT_CANCELLED_MESSAGE};
pub use widget::{
    CheckoutRequest, CustomerContact, MockPaymentWidget, PaymentWidget, WidgetOutcome,
    WidgetPayment,
};
