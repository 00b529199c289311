#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

//! Full checkout attempts through a real store: scripted backend,
//! scripted widget, assertions on the terminal state and on exactly
//! which calls went out (idempotency keys, verification payloads, and
//! the calls that must never happen).

use ghumly_api::{PaymentOrder, TourPackage, VerifyPaymentRequest};
use ghumly_booking::mocks::MockBookingApi;
use ghumly_booking::{
    CheckoutAction, CheckoutEnvironment, CheckoutFailure, CheckoutReducer, CheckoutState,
    CustomerContact, MockPaymentWidget, WidgetOutcome, WidgetPayment,
};
use ghumly_runtime::Store;
use ghumly_testing::mocks::{test_clock, SequenceIdGenerator};
use std::sync::Arc;
use std::time::Duration;

type CheckoutStore = Store<CheckoutState, CheckoutAction, CheckoutEnvironment, CheckoutReducer>;

const WAIT: Duration = Duration::from_secs(5);

fn tour() -> TourPackage {
    TourPackage {
        id: "t1".to_string(),
        title: "Ladakh Circuit".to_string(),
        price: None,
        min_group_size: 1,
        max_group_size: 10,
        agency: None,
        region: None,
        departure_city: None,
        start_date: None,
        days: Some(7),
        nights: Some(6),
        tour_theme: None,
        is_featured: false,
    }
}

fn order() -> PaymentOrder {
    PaymentOrder {
        booking_id: "b1".to_string(),
        gateway_order_id: "order_1".to_string(),
        gateway_key_id: "rzp_test_key".to_string(),
        amount_minor_units: 250_000,
    }
}

fn payment() -> WidgetPayment {
    WidgetPayment {
        order_id: "order_1".to_string(),
        payment_id: "pay_1".to_string(),
        signature: "sig_1".to_string(),
    }
}

fn start() -> CheckoutAction {
    CheckoutAction::StartCheckout {
        tour: tour(),
        travelers: 2,
    }
}

fn store_with(
    api: MockBookingApi,
    widget: MockPaymentWidget,
) -> (CheckoutStore, Arc<MockBookingApi>, Arc<MockPaymentWidget>) {
    let api = Arc::new(api);
    let widget = Arc::new(widget);
    let environment = CheckoutEnvironment::new(
        api.clone(),
        widget.clone(),
        Arc::new(SequenceIdGenerator::new()),
        Arc::new(test_clock()),
        CustomerContact {
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            phone: Some("9876543210".to_string()),
        },
    );
    let store = Store::new(CheckoutState::Idle, CheckoutReducer::new(), environment);
    (store, api, widget)
}

/// Poll the store until the state passes `check`.
async fn eventually<F>(store: &CheckoutStore, what: &str, check: F)
where
    F: Fn(&CheckoutState) -> bool,
{
    let deadline = tokio::time::Instant::now() + WAIT;
    while !store.state(|state| check(state)).await {
        assert!(
            tokio::time::Instant::now() < deadline,
            "store never reached: {what}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn happy_path_confirms_the_booking() {
    let (store, api, widget) = store_with(
        MockBookingApi::new().with_order(order()).with_verification(),
        MockPaymentWidget::new().with_outcome(WidgetOutcome::Succeeded(payment())),
    );

    let outcome = store
        .send_and_wait_for(
            start(),
            |a| matches!(a, CheckoutAction::VerificationSucceeded { .. }),
            WAIT,
        )
        .await
        .unwrap();

    assert_eq!(
        outcome,
        CheckoutAction::VerificationSucceeded {
            booking_id: "b1".to_string()
        }
    );
    eventually(&store, "confirmed", |s| {
        s == &CheckoutState::Confirmed {
            booking_id: "b1".to_string(),
        }
    })
    .await;

    assert_eq!(
        api.verify_calls(),
        vec![VerifyPaymentRequest {
            razorpay_order_id: "order_1".to_string(),
            razorpay_payment_id: "pay_1".to_string(),
            razorpay_signature: "sig_1".to_string(),
            booking_id: "b1".to_string(),
        }]
    );

    let requests = widget.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].order_id, "order_1");
    assert_eq!(requests[0].amount_minor_units, 250_000);
    assert_eq!(requests[0].currency, "INR");
    assert_eq!(requests[0].description, "Booking for Ladakh Circuit");
    assert_eq!(requests[0].customer.email, "asha@example.com");
}

#[tokio::test]
async fn dismissal_cancels_and_never_verifies() {
    let (store, api, _widget) = store_with(
        MockBookingApi::new().with_order(order()),
        MockPaymentWidget::new().with_outcome(WidgetOutcome::Dismissed),
    );

    store
        .send_and_wait_for(
            start(),
            |a| matches!(a, CheckoutAction::WidgetDismissed { .. }),
            WAIT,
        )
        .await
        .unwrap();

    eventually(&store, "cancelled", |s| {
        s == &CheckoutState::Cancelled {
            booking_id: "b1".to_string(),
        }
    })
    .await;
    assert_eq!(
        store
            .state(|s| s.user_message())
            .await
            .as_deref(),
        Some("Payment cancelled by user")
    );
    assert!(api.verify_calls().is_empty());
}

#[tokio::test]
async fn unavailable_widget_fails_the_attempt() {
    let (store, api, _widget) = store_with(
        MockBookingApi::new().with_order(order()),
        MockPaymentWidget::new().with_outcome(WidgetOutcome::Unavailable),
    );

    store
        .send_and_wait_for(
            start(),
            |a| matches!(a, CheckoutAction::WidgetUnavailable { .. }),
            WAIT,
        )
        .await
        .unwrap();

    eventually(&store, "failed on gateway", |s| {
        matches!(
            s,
            CheckoutState::Failed {
                reason: CheckoutFailure::GatewayUnavailable,
                ..
            }
        )
    })
    .await;
    assert!(api.verify_calls().is_empty());
}

#[tokio::test]
async fn order_refusal_surfaces_the_server_message() {
    let (store, api, widget) = store_with(
        MockBookingApi::new().with_order_error("Tour is fully booked"),
        MockPaymentWidget::new(),
    );

    store
        .send_and_wait_for(
            start(),
            |a| matches!(a, CheckoutAction::OrderFailed { .. }),
            WAIT,
        )
        .await
        .unwrap();

    eventually(&store, "failed on order creation", |s| {
        s.user_message().as_deref() == Some("Tour is fully booked")
    })
    .await;
    assert_eq!(api.create_calls().len(), 1);
    assert!(widget.requests().is_empty());
}

#[tokio::test]
async fn attempts_carry_distinct_idempotency_keys() {
    let (store, api, _widget) = store_with(
        MockBookingApi::new().with_order(order()).with_order(order()),
        MockPaymentWidget::new()
            .with_outcome(WidgetOutcome::Dismissed)
            .with_outcome(WidgetOutcome::Dismissed),
    );

    store
        .send_and_wait_for(
            start(),
            |a| matches!(a, CheckoutAction::WidgetDismissed { .. }),
            WAIT,
        )
        .await
        .unwrap();
    eventually(&store, "first attempt cancelled", CheckoutState::is_terminal).await;

    store.send(CheckoutAction::Reset).await.unwrap();
    eventually(&store, "back to idle", CheckoutState::is_idle).await;

    store
        .send_and_wait_for(
            start(),
            |a| matches!(a, CheckoutAction::WidgetDismissed { .. }),
            WAIT,
        )
        .await
        .unwrap();

    let calls = api.create_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].idempotency_key, SequenceIdGenerator::nth(1).to_string());
    assert_eq!(calls[1].idempotency_key, SequenceIdGenerator::nth(2).to_string());
    assert_ne!(calls[0].idempotency_key, calls[1].idempotency_key);
}

#[tokio::test]
async fn stale_success_callback_after_reset_is_ignored() {
    let (store, api, _widget) = store_with(
        MockBookingApi::new().with_order(order()),
        MockPaymentWidget::new().with_outcome(WidgetOutcome::Dismissed),
    );

    store
        .send_and_wait_for(
            start(),
            |a| matches!(a, CheckoutAction::WidgetDismissed { .. }),
            WAIT,
        )
        .await
        .unwrap();
    eventually(&store, "cancelled", CheckoutState::is_terminal).await;
    store.send(CheckoutAction::Reset).await.unwrap();
    eventually(&store, "back to idle", CheckoutState::is_idle).await;

    // A late success callback from the abandoned attempt must not move
    // the machine or trigger verification.
    store
        .send(CheckoutAction::WidgetSucceeded { payment: payment() })
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(store.state(CheckoutState::is_idle).await);
    assert!(api.verify_calls().is_empty());
}
