//! End-to-end checkout walkthrough against mock collaborators.
//!
//! Restores a session from a seeded store, picks a tour and drives three
//! checkout attempts through the real store runtime: one paid and
//! verified, one abandoned at the widget, one rejected before any
//! network call. Every checkout action is printed as it lands on the
//! store's feed.
//!
//! ```bash
//! cargo run -p checkout-demo
//! ```

use anyhow::{bail, Result};
use chrono::Utc;
use ghumly_api::{PaymentOrder, PriceType, TourPackage, TourPrice, UserProfile};
use ghumly_auth::mocks::{MockAuthApi, MockSessionStore};
use ghumly_auth::{AuthAction, AuthEnvironment, AuthReducer, AuthState, Session, SessionToken};
use ghumly_booking::mocks::MockBookingApi;
use ghumly_booking::{
    CheckoutAction, CheckoutEnvironment, CheckoutReducer, CheckoutState, CustomerContact,
    MockPaymentWidget, WidgetOutcome,
};
use ghumly_runtime::Store;
use ghumly_testing::mocks::{test_clock, SequenceIdGenerator};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type CheckoutStore = Store<CheckoutState, CheckoutAction, CheckoutEnvironment, CheckoutReducer>;

const WAIT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "checkout_demo=info,ghumly_booking=info,ghumly_runtime=warn".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Ghumly checkout walkthrough (mock collaborators) ===\n");

    let customer = restore_session().await?;
    let tour = featured_tour();
    println!(
        "Browsing: {} from {}, {} days, up to {} travelers\n",
        tour.title,
        tour.departure_city.as_deref().unwrap_or("anywhere"),
        tour.days.unwrap_or_default(),
        tour.max_group_size
    );

    paid_and_verified(&tour, &customer).await?;
    abandoned_at_the_widget(&tour, &customer).await?;
    rejected_before_the_network(&tour, &customer).await?;

    println!("=== Walkthrough complete ===");
    Ok(())
}

/// Sign the walkthrough user in by restoring a seeded session, the same
/// path the app takes on startup.
async fn restore_session() -> Result<CustomerContact> {
    let user = UserProfile {
        id: "u1".to_string(),
        name: "Asha Verma".to_string(),
        email: "asha@example.com".to_string(),
        phone: Some("9876543210".to_string()),
    };
    let saved = Session::new(SessionToken::new("demo-session"), user, Utc::now());
    let environment = AuthEnvironment::new(
        Arc::new(MockAuthApi::new()),
        MockSessionStore::with_session(saved),
        Arc::new(test_clock()),
    );
    let store = Store::new(AuthState::default(), AuthReducer::new(), environment);

    let restored = store
        .send_and_wait_for(
            AuthAction::RestoreSession,
            |a| matches!(a, AuthAction::SessionRestored { .. }),
            WAIT,
        )
        .await?;
    let AuthAction::SessionRestored {
        session: Some(session),
    } = restored
    else {
        bail!("no stored session to restore");
    };

    tracing::info!(user = %session.user.email, "walkthrough session restored");
    println!("Signed in as {} <{}>\n", session.user.name, session.user.email);
    Ok(CustomerContact {
        name: session.user.name,
        email: session.user.email,
        phone: session.user.phone,
    })
}

/// Happy path: order created, widget paid, signature verified.
async fn paid_and_verified(tour: &TourPackage, customer: &CustomerContact) -> Result<()> {
    println!("--- Attempt 1: paid and verified ---");
    let api = Arc::new(
        MockBookingApi::new()
            .with_order(demo_order())
            .with_verification(),
    );
    let store = checkout_store(api, Arc::new(MockPaymentWidget::new()), customer.clone());
    let printer = print_actions(&store);

    store
        .send_and_wait_for(
            CheckoutAction::StartCheckout {
                tour: tour.clone(),
                travelers: 2,
            },
            |a| {
                matches!(
                    a,
                    CheckoutAction::VerificationSucceeded { .. }
                        | CheckoutAction::VerificationFailed { .. }
                        | CheckoutAction::OrderFailed { .. }
                )
            },
            WAIT,
        )
        .await?;
    until(&store, "confirmed", |s| {
        matches!(s, CheckoutState::Confirmed { .. })
    })
    .await?;

    let booking = store
        .state(|s| match s {
            CheckoutState::Confirmed { booking_id } => booking_id.clone(),
            _ => String::new(),
        })
        .await;
    println!("Booking {booking} confirmed\n");
    finish(store, printer).await
}

/// The customer closes the payment widget: the attempt cancels and no
/// verification call goes out.
async fn abandoned_at_the_widget(tour: &TourPackage, customer: &CustomerContact) -> Result<()> {
    println!("--- Attempt 2: abandoned at the widget ---");
    let api = Arc::new(MockBookingApi::new().with_order(demo_order()));
    let widget = Arc::new(MockPaymentWidget::new().with_outcome(WidgetOutcome::Dismissed));
    let store = checkout_store(api.clone(), widget, customer.clone());
    let printer = print_actions(&store);

    store
        .send_and_wait_for(
            CheckoutAction::StartCheckout {
                tour: tour.clone(),
                travelers: 2,
            },
            |a| matches!(a, CheckoutAction::WidgetDismissed { .. }),
            WAIT,
        )
        .await?;
    until(&store, "cancelled", |s| {
        matches!(s, CheckoutState::Cancelled { .. })
    })
    .await?;

    if let Some(message) = store.state(|s| s.user_message()).await {
        println!("User sees: \"{message}\"");
    }
    println!(
        "Verification calls recorded: {}",
        api.verify_calls().len()
    );

    store.send(CheckoutAction::Reset).await?;
    until(&store, "idle again", CheckoutState::is_idle).await?;
    println!("Reset: ready for another attempt\n");
    finish(store, printer).await
}

/// Group-size validation fails the attempt before any network call.
async fn rejected_before_the_network(tour: &TourPackage, customer: &CustomerContact) -> Result<()> {
    println!("--- Attempt 3: rejected before the network ---");
    let api = Arc::new(MockBookingApi::new());
    let store = checkout_store(api.clone(), Arc::new(MockPaymentWidget::new()), customer.clone());
    let printer = print_actions(&store);

    store
        .send(CheckoutAction::StartCheckout {
            tour: tour.clone(),
            travelers: 0,
        })
        .await?;
    until(&store, "failed on validation", |s| {
        matches!(s, CheckoutState::Failed { .. })
    })
    .await?;

    if let Some(message) = store.state(|s| s.user_message()).await {
        println!("User sees: \"{message}\"");
    }
    println!(
        "Create-order calls recorded: {}\n",
        api.create_calls().len()
    );
    finish(store, printer).await
}

fn checkout_store(
    api: Arc<MockBookingApi>,
    widget: Arc<MockPaymentWidget>,
    customer: CustomerContact,
) -> CheckoutStore {
    let environment = CheckoutEnvironment::new(
        api,
        widget,
        Arc::new(SequenceIdGenerator::new()),
        Arc::new(test_clock()),
        customer,
    );
    Store::new(CheckoutState::Idle, CheckoutReducer::new(), environment)
}

/// Print every checkout action as it lands on the store's feed.
fn print_actions(store: &CheckoutStore) -> tokio::task::JoinHandle<()> {
    let mut actions = store.subscribe_actions();
    tokio::spawn(async move {
        while let Ok(action) = actions.recv().await {
            println!("  {}", describe(&action));
        }
    })
}

fn describe(action: &CheckoutAction) -> String {
    match action {
        CheckoutAction::StartCheckout { tour, travelers } => {
            format!("command: start checkout for \"{}\" x{travelers}", tour.title)
        }
        CheckoutAction::Reset => "command: reset".to_string(),
        CheckoutAction::OrderCreated { order } => format!(
            "event: order {} created for booking {} ({} paise)",
            order.gateway_order_id, order.booking_id, order.amount_minor_units
        ),
        CheckoutAction::OrderFailed { message } => format!("event: order refused ({message})"),
        CheckoutAction::WidgetOpened { order_id } => {
            format!("event: payment widget opened for {order_id}")
        }
        CheckoutAction::WidgetUnavailable { .. } => "event: payment widget unavailable".to_string(),
        CheckoutAction::WidgetSucceeded { payment } => {
            format!("event: payment {} captured at the widget", payment.payment_id)
        }
        CheckoutAction::WidgetDismissed { .. } => "event: payment widget dismissed".to_string(),
        CheckoutAction::VerificationSucceeded { booking_id } => {
            format!("event: signature verified, booking {booking_id} confirmed")
        }
        CheckoutAction::VerificationFailed { message } => {
            format!("event: verification failed ({message})")
        }
    }
}

/// Poll the store until the state passes `check`.
async fn until(
    store: &CheckoutStore,
    what: &str,
    check: impl Fn(&CheckoutState) -> bool,
) -> Result<()> {
    let deadline = tokio::time::Instant::now() + WAIT;
    while !store.state(|s| check(s)).await {
        if tokio::time::Instant::now() >= deadline {
            bail!("state never reached: {what}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    Ok(())
}

/// Drain the store and stop the action printer.
async fn finish(store: CheckoutStore, printer: tokio::task::JoinHandle<()>) -> Result<()> {
    store.shutdown().await?;
    // Give the printer a beat to flush the last broadcast.
    tokio::time::sleep(Duration::from_millis(50)).await;
    printer.abort();
    Ok(())
}

fn featured_tour() -> TourPackage {
    TourPackage {
        id: "t_ladakh_7d".to_string(),
        title: "Ladakh Monasteries Circuit".to_string(),
        price: Some(TourPrice {
            amount: 25_000.0,
            kind: PriceType::PerPerson,
        }),
        min_group_size: 1,
        max_group_size: 12,
        agency: None,
        region: None,
        departure_city: Some("Delhi".to_string()),
        start_date: None,
        days: Some(7),
        nights: Some(6),
        tour_theme: None,
        is_featured: true,
    }
}

fn demo_order() -> PaymentOrder {
    PaymentOrder {
        booking_id: "bk_2041".to_string(),
        gateway_order_id: "order_demo_1".to_string(),
        gateway_key_id: "rzp_test_demo".to_string(),
        amount_minor_units: 5_000_000,
    }
}
