//! Payment widget port.
//!
//! Abstraction over the hosted gateway widget (Razorpay checkout in
//! production). The orchestrator hands it a prefilled [`CheckoutRequest`]
//! and gets back exactly one [`WidgetOutcome`]; everything between those
//! two points, the modal, the card form, 3DS, belongs to the gateway.
//!
//! The widget handle is created once per environment and shared by all
//! checkout attempts, mirroring the loaded-once-per-page gateway script.
//! No real widget exists in this crate, so [`MockPaymentWidget`] is the
//! shipped implementation, scriptable for tests and the demo.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};

use ghumly_api::PaymentOrder;

/// Contact details prefilled into the widget form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomerContact {
    /// Customer name
    pub name: String,
    /// Customer email
    pub email: String,
    /// Customer mobile number, when the profile has one
    pub phone: Option<String>,
}

/// Everything the gateway widget needs to collect one payment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutRequest {
    /// Gateway order id the payment settles against
    pub order_id: String,
    /// Gateway key id the widget authenticates with
    pub key_id: String,
    /// Amount in minor currency units (paise)
    pub amount_minor_units: u64,
    /// ISO currency code, always INR today
    pub currency: String,
    /// Merchant name shown in the widget header
    pub business_name: String,
    /// One-line purchase description
    pub description: String,
    /// Prefilled contact details
    pub customer: CustomerContact,
}

impl CheckoutRequest {
    /// Request for a freshly created payment order.
    #[must_use]
    pub fn for_order(order: &PaymentOrder, description: String, customer: CustomerContact) -> Self {
        Self {
            order_id: order.gateway_order_id.clone(),
            key_id: order.gateway_key_id.clone(),
            amount_minor_units: order.amount_minor_units,
            currency: "INR".to_string(),
            business_name: "Ghumly".to_string(),
            description,
            customer,
        }
    }
}

/// Proof of payment delivered by the widget's success callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WidgetPayment {
    /// Gateway order id this payment belongs to
    pub order_id: String,
    /// Gateway-issued payment id
    pub payment_id: String,
    /// Gateway signature over order id and payment id
    pub signature: String,
}

/// How a widget hand-off ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WidgetOutcome {
    /// The user paid; proof attached
    Succeeded(WidgetPayment),
    /// The user closed the modal without paying
    Dismissed,
    /// The widget could not open at all
    Unavailable,
}

/// Hosted payment widget.
///
/// `open` resolves once per hand-off, after the user has either paid,
/// dismissed the modal, or the widget failed to come up.
pub trait PaymentWidget: Send + Sync {
    /// Open the widget for one payment and wait for its outcome.
    fn open(&self, request: CheckoutRequest)
        -> Pin<Box<dyn Future<Output = WidgetOutcome> + Send>>;
}

/// Scriptable payment widget.
///
/// Outcomes queued with [`with_outcome`](Self::with_outcome) are replayed
/// in order; with an empty script every hand-off succeeds with generated
/// payment ids, which is what the demo wants. Every request passed to
/// `open` is recorded for assertions.
#[derive(Debug, Default)]
pub struct MockPaymentWidget {
    script: Mutex<VecDeque<WidgetOutcome>>,
    requests: Mutex<Vec<CheckoutRequest>>,
}

impl MockPaymentWidget {
    /// Widget with an empty script (every hand-off succeeds).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the outcome of the next hand-off.
    #[must_use]
    pub fn with_outcome(self, outcome: WidgetOutcome) -> Self {
        self.lock_script().push_back(outcome);
        self
    }

    /// Arc-wrapped handle for sharing across attempts.
    #[must_use]
    pub fn shared(self) -> Arc<dyn PaymentWidget> {
        Arc::new(self)
    }

    /// Requests the widget has been opened with, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<CheckoutRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, VecDeque<WidgetOutcome>> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PaymentWidget for MockPaymentWidget {
    fn open(
        &self,
        request: CheckoutRequest,
    ) -> Pin<Box<dyn Future<Output = WidgetOutcome> + Send>> {
        let scripted = self.lock_script().pop_front();
        let outcome = scripted.unwrap_or_else(|| {
            WidgetOutcome::Succeeded(WidgetPayment {
                order_id: request.order_id.clone(),
                payment_id: format!("pay_{}", uuid::Uuid::new_v4().simple()),
                signature: format!("sig_{}", uuid::Uuid::new_v4().simple()),
            })
        });
        tracing::info!(
            order = %request.order_id,
            amount = request.amount_minor_units,
            "Mock widget hand-off"
        );
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        Box::pin(async move { outcome })
    }
}
