//! Checkout reducer.
//!
//! The nested-callback flow of the original checkout (create order, hand
//! off to the gateway widget, verify the payment) expressed as a tagged
//! union with one deterministic transition function. Highlights:
//!
//! - Group-size validation happens before any network call; a violation
//!   lands directly in `Failed` with no effect.
//! - `StartCheckout` is accepted only in `Idle`; anywhere else it is a
//!   counted no-op, which is the double-submit guard.
//! - Every attempt gets a fresh idempotency key, so a retry of the
//!   create-order call cannot produce a second booking.
//! - Widget events carry the gateway order id; an event that does not
//!   match the order in the current state is a stale callback from an
//!   abandoned attempt and is dropped.
//! - A dismissed modal cancels the attempt without a verification call;
//!   the unpaid order is the backend's to expire.

use crate::environment::CheckoutEnvironment;
use crate::types::{CheckoutAction, CheckoutFailure, CheckoutState};
use crate::widget::{CheckoutRequest, WidgetOutcome};
use ghumly_api::VerifyPaymentRequest;
use ghumly_core::effect::Effect;
use ghumly_core::reducer::Reducer;
use ghumly_core::{smallvec, SmallVec};
use ghumly_runtime::metrics::CheckoutMetrics;

/// Checkout reducer. Stateless; everything lives in [`CheckoutState`].
#[derive(Debug, Clone, Default)]
pub struct CheckoutReducer;

impl CheckoutReducer {
    /// Create a new checkout reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for CheckoutReducer {
    type State = CheckoutState;
    type Action = CheckoutAction;
    type Environment = CheckoutEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        // Transitions consume the old state, so take it and put the
        // successor back. `take` leaves `Idle`, never observed: every
        // branch of `step` returns a successor.
        let current = std::mem::take(state);
        let (next, effects) = step(current, action, env);
        *state = next;
        effects
    }
}

type Transition = (CheckoutState, SmallVec<[Effect<CheckoutAction>; 4]>);

#[allow(clippy::too_many_lines)] // One arm per transition keeps the table readable
fn step(state: CheckoutState, action: CheckoutAction, env: &CheckoutEnvironment) -> Transition {
    match (state, action) {
        // ═══════════════════════════════════════════════════════════════
        // Idle × StartCheckout: Validate, then create the order
        // ═══════════════════════════════════════════════════════════════
        (CheckoutState::Idle, CheckoutAction::StartCheckout { tour, travelers }) => {
            if travelers < tour.min_group_size {
                let reason = CheckoutFailure::Validation(format!(
                    "Minimum {} traveler(s) required",
                    tour.min_group_size
                ));
                return (
                    CheckoutState::Failed {
                        reason,
                        at: env.clock.now(),
                    },
                    smallvec![],
                );
            }
            if travelers > tour.max_group_size {
                let reason = CheckoutFailure::Validation(format!(
                    "Maximum {} travelers allowed",
                    tour.max_group_size
                ));
                return (
                    CheckoutState::Failed {
                        reason,
                        at: env.clock.now(),
                    },
                    smallvec![],
                );
            }

            let attempt_key = env.ids.generate().to_string();
            tracing::info!(tour = %tour.id, travelers, "Starting checkout");

            let api = env.booking_api.clone();
            let tour_id = tour.id.clone();
            let key = attempt_key.clone();
            let effect = Effect::Future(Box::pin(async move {
                match api.create_order(tour_id, travelers, key).await {
                    Ok(order) => Some(CheckoutAction::OrderCreated { order }),
                    Err(error) => Some(CheckoutAction::OrderFailed {
                        message: error.to_string(),
                    }),
                }
            }));

            (
                CheckoutState::CreatingOrder {
                    tour_id: tour.id,
                    tour_title: tour.title,
                    travelers,
                    attempt_key,
                },
                smallvec![effect],
            )
        }

        // ═══════════════════════════════════════════════════════════════
        // Non-idle × StartCheckout: Double-submit guard
        // ═══════════════════════════════════════════════════════════════
        (state, CheckoutAction::StartCheckout { .. }) => {
            tracing::warn!("Checkout already in progress, ignoring start");
            CheckoutMetrics::record_double_submit_blocked();
            (state, smallvec![])
        }

        // ═══════════════════════════════════════════════════════════════
        // CreatingOrder × OrderCreated: Hand the order to the widget
        // ═══════════════════════════════════════════════════════════════
        (
            CheckoutState::CreatingOrder {
                tour_title,
                travelers,
                ..
            },
            CheckoutAction::OrderCreated { order },
        ) => {
            CheckoutMetrics::record_order_created();
            tracing::info!(
                booking = %order.booking_id,
                order = %order.gateway_order_id,
                amount = order.amount_minor_units,
                "Order created"
            );

            let request = CheckoutRequest::for_order(
                &order,
                format!("Booking for {tour_title}"),
                env.customer.clone(),
            );
            let widget = env.widget.clone();
            let order_id = order.gateway_order_id.clone();

            let opened = {
                let order_id = order_id.clone();
                Effect::Future(Box::pin(async move {
                    Some(CheckoutAction::WidgetOpened { order_id })
                }))
            };
            let outcome = Effect::Future(Box::pin(async move {
                match widget.open(request).await {
                    WidgetOutcome::Succeeded(payment) => {
                        Some(CheckoutAction::WidgetSucceeded { payment })
                    }
                    WidgetOutcome::Dismissed => Some(CheckoutAction::WidgetDismissed { order_id }),
                    WidgetOutcome::Unavailable => {
                        Some(CheckoutAction::WidgetUnavailable { order_id })
                    }
                }
            }));

            // The opened signal must land before the outcome can, so the
            // hand-off runs as a strict sequence.
            (
                CheckoutState::OrderCreated { order, travelers },
                smallvec![Effect::Sequential(vec![opened, outcome])],
            )
        }

        // ═══════════════════════════════════════════════════════════════
        // CreatingOrder × OrderFailed: Server said no, verbatim
        // ═══════════════════════════════════════════════════════════════
        (CheckoutState::CreatingOrder { .. }, CheckoutAction::OrderFailed { message }) => {
            tracing::warn!(%message, "Order creation failed");
            (
                CheckoutState::Failed {
                    reason: CheckoutFailure::OrderCreation(message),
                    at: env.clock.now(),
                },
                smallvec![],
            )
        }

        // ═══════════════════════════════════════════════════════════════
        // OrderCreated × WidgetOpened: The modal is on screen
        // ═══════════════════════════════════════════════════════════════
        (
            CheckoutState::OrderCreated { order, travelers },
            CheckoutAction::WidgetOpened { order_id },
        ) if order.gateway_order_id == order_id => {
            (CheckoutState::PaymentOpen { order, travelers }, smallvec![])
        }

        // ═══════════════════════════════════════════════════════════════
        // WidgetUnavailable: The gateway never came up
        // ═══════════════════════════════════════════════════════════════
        // Accepted in PaymentOpen too: the hand-off reports availability
        // only after the opened signal has already been sequenced in.
        (
            CheckoutState::OrderCreated { order, .. } | CheckoutState::PaymentOpen { order, .. },
            CheckoutAction::WidgetUnavailable { order_id },
        ) if order.gateway_order_id == order_id => {
            CheckoutMetrics::record_payment_failed();
            tracing::error!(order = %order_id, "Payment widget unavailable");
            (
                CheckoutState::Failed {
                    reason: CheckoutFailure::GatewayUnavailable,
                    at: env.clock.now(),
                },
                smallvec![],
            )
        }

        // ═══════════════════════════════════════════════════════════════
        // PaymentOpen × WidgetSucceeded: Forward the proof for verification
        // ═══════════════════════════════════════════════════════════════
        (CheckoutState::PaymentOpen { order, .. }, CheckoutAction::WidgetSucceeded { payment })
            if order.gateway_order_id == payment.order_id =>
        {
            tracing::info!(payment = %payment.payment_id, "Payment collected, verifying");

            let request = VerifyPaymentRequest {
                razorpay_order_id: payment.order_id.clone(),
                razorpay_payment_id: payment.payment_id.clone(),
                razorpay_signature: payment.signature.clone(),
                booking_id: order.booking_id.clone(),
            };
            let booking_id = order.booking_id.clone();
            let api = env.booking_api.clone();
            let effect = Effect::Future(Box::pin(async move {
                match api.verify(request).await {
                    Ok(()) => Some(CheckoutAction::VerificationSucceeded { booking_id }),
                    Err(error) => Some(CheckoutAction::VerificationFailed {
                        message: error.to_string(),
                    }),
                }
            }));

            (
                CheckoutState::Verifying { order, payment },
                smallvec![effect],
            )
        }

        // ═══════════════════════════════════════════════════════════════
        // PaymentOpen × WidgetDismissed: Cancelled, no verification call
        // ═══════════════════════════════════════════════════════════════
        (CheckoutState::PaymentOpen { order, .. }, CheckoutAction::WidgetDismissed { order_id })
            if order.gateway_order_id == order_id =>
        {
            CheckoutMetrics::record_payment_cancelled();
            tracing::info!(booking = %order.booking_id, "Payment modal dismissed by user");
            (
                CheckoutState::Cancelled {
                    booking_id: order.booking_id,
                },
                smallvec![],
            )
        }

        // ═══════════════════════════════════════════════════════════════
        // Verifying × VerificationSucceeded: Booking confirmed
        // ═══════════════════════════════════════════════════════════════
        (CheckoutState::Verifying { .. }, CheckoutAction::VerificationSucceeded { booking_id }) => {
            CheckoutMetrics::record_payment_verified();
            tracing::info!(booking = %booking_id, "Payment verified, booking confirmed");
            (CheckoutState::Confirmed { booking_id }, smallvec![])
        }

        // ═══════════════════════════════════════════════════════════════
        // Verifying × VerificationFailed: Backend keeps the booking as-is
        // ═══════════════════════════════════════════════════════════════
        (CheckoutState::Verifying { .. }, CheckoutAction::VerificationFailed { message }) => {
            CheckoutMetrics::record_payment_failed();
            tracing::warn!(%message, "Payment verification failed");
            (
                CheckoutState::Failed {
                    reason: CheckoutFailure::Verification(message),
                    at: env.clock.now(),
                },
                smallvec![],
            )
        }

        // ═══════════════════════════════════════════════════════════════
        // Terminal × Reset: Back to Idle for the next attempt
        // ═══════════════════════════════════════════════════════════════
        (
            CheckoutState::Confirmed { .. }
            | CheckoutState::Failed { .. }
            | CheckoutState::Cancelled { .. },
            CheckoutAction::Reset,
        ) => (CheckoutState::Idle, smallvec![]),

        // ═══════════════════════════════════════════════════════════════
        // Everything else: No transition (stale callbacks land here)
        // ═══════════════════════════════════════════════════════════════
        (state, action) => {
            tracing::debug!(?action, "No checkout transition from the current state");
            (state, smallvec![])
        }
    }
}
