//! Checkout state machine types.

use crate::widget::WidgetPayment;
use chrono::{DateTime, Utc};
use ghumly_api::{PaymentOrder, TourPackage};
use thiserror::Error;

/// Fixed message for a user-dismissed payment modal.
pub const PAYMENT_CANCELLED_MESSAGE: &str = "Payment cancelled by user";

/// Why a checkout attempt failed.
///
/// Cancellation is not here: closing the payment modal is a terminal
/// state of its own, not a failure.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CheckoutFailure {
    /// Rejected before any network call
    #[error("{0}")]
    Validation(String),
    /// The backend refused to create the order (server message verbatim)
    #[error("{0}")]
    OrderCreation(String),
    /// The gateway widget never came up
    #[error("Payment gateway not loaded. Please refresh the page.")]
    GatewayUnavailable,
    /// The backend rejected the payment proof (server message verbatim)
    #[error("{0}")]
    Verification(String),
}

/// Where the current checkout attempt stands.
///
/// One attempt at a time. Every transition is a function of
/// `(state, action)`; an attempt always ends in [`Confirmed`],
/// [`Failed`] or [`Cancelled`], and `Reset` returns any of those to
/// [`Idle`] for the next attempt.
///
/// [`Confirmed`]: CheckoutState::Confirmed
/// [`Failed`]: CheckoutState::Failed
/// [`Cancelled`]: CheckoutState::Cancelled
/// [`Idle`]: CheckoutState::Idle
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CheckoutState {
    /// No attempt running
    #[default]
    Idle,
    /// Create-order call in flight
    CreatingOrder {
        /// Tour being booked
        tour_id: String,
        /// Tour title, carried for the widget description
        tour_title: String,
        /// Travelers on the booking
        travelers: u32,
        /// Idempotency key for this attempt's create-order call
        attempt_key: String,
    },
    /// Order exists; the widget is being opened
    OrderCreated {
        /// The created payment order
        order: PaymentOrder,
        /// Travelers on the booking
        travelers: u32,
    },
    /// Widget on screen, waiting on the user
    PaymentOpen {
        /// The payment order being settled
        order: PaymentOrder,
        /// Travelers on the booking
        travelers: u32,
    },
    /// Payment proof sent to the backend for verification
    Verifying {
        /// The payment order being settled
        order: PaymentOrder,
        /// Proof delivered by the widget
        payment: WidgetPayment,
    },
    /// Terminal: booking paid and verified
    Confirmed {
        /// Confirmed booking id
        booking_id: String,
    },
    /// Terminal: the attempt failed
    Failed {
        /// What went wrong
        reason: CheckoutFailure,
        /// When it went wrong
        at: DateTime<Utc>,
    },
    /// Terminal: the user closed the payment modal
    Cancelled {
        /// The unpaid booking the backend is left to expire
        booking_id: String,
    },
}

impl CheckoutState {
    /// Whether a new attempt may start from here.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Whether the attempt has ended, one way or another.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Confirmed { .. } | Self::Failed { .. } | Self::Cancelled { .. }
        )
    }

    /// The message to show the user, for states that carry one.
    #[must_use]
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Failed { reason, .. } => Some(reason.to_string()),
            Self::Cancelled { .. } => Some(PAYMENT_CANCELLED_MESSAGE.to_string()),
            _ => None,
        }
    }
}

/// All inputs to the checkout reducer.
///
/// `StartCheckout` and `Reset` are the only commands a host sends; the
/// widget and API events come back through effects. Widget events carry
/// the gateway order id so a callback from an abandoned attempt cannot
/// move the current one.
#[derive(Clone, Debug, PartialEq)]
pub enum CheckoutAction {
    // ========== Commands ==========
    /// Command: Start a checkout attempt for a tour
    StartCheckout {
        /// The tour to book
        tour: TourPackage,
        /// Travelers on the booking
        travelers: u32,
    },

    /// Command: Return from a terminal state to `Idle`
    Reset,

    // ========== Events ==========
    /// Event: The backend created the booking and payment order
    OrderCreated {
        /// The created order
        order: PaymentOrder,
    },

    /// Event: Order creation was refused
    OrderFailed {
        /// Server message, verbatim
        message: String,
    },

    /// Event: The widget is on screen
    WidgetOpened {
        /// Gateway order id the widget opened for
        order_id: String,
    },

    /// Event: The widget could not open
    WidgetUnavailable {
        /// Gateway order id of the failed hand-off
        order_id: String,
    },

    /// Event: The user paid
    WidgetSucceeded {
        /// Payment proof from the widget callback
        payment: WidgetPayment,
    },

    /// Event: The user closed the modal without paying
    WidgetDismissed {
        /// Gateway order id of the dismissed hand-off
        order_id: String,
    },

    /// Event: The backend accepted the payment proof
    VerificationSucceeded {
        /// The paid booking
        booking_id: String,
    },

    /// Event: The backend rejected the payment proof
    VerificationFailed {
        /// Server message, verbatim
        message: String,
    },
}
