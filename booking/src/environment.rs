//! Dependency injection for the checkout reducer.

use crate::widget::{CustomerContact, PaymentWidget};
use ghumly_api::{ApiClient, ApiError, PaymentOrder, VerifyPaymentRequest};
use ghumly_core::environment::{Clock, IdGenerator};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by [`BookingApi`] methods.
pub type BookingApiFuture<T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send>>;

/// Port over the backend's booking endpoints.
///
/// Object safe so the environment can hold `Arc<dyn BookingApi>`: the
/// real client in the app, a scripted mock in tests.
pub trait BookingApi: Send + Sync {
    /// `POST /bookings` with the attempt's idempotency key.
    fn create_order(
        &self,
        tour_package_id: String,
        travelers: u32,
        idempotency_key: String,
    ) -> BookingApiFuture<PaymentOrder>;

    /// `POST /bookings/verify-payment`
    fn verify(&self, request: VerifyPaymentRequest) -> BookingApiFuture<()>;
}

impl BookingApi for ApiClient {
    fn create_order(
        &self,
        tour_package_id: String,
        travelers: u32,
        idempotency_key: String,
    ) -> BookingApiFuture<PaymentOrder> {
        let client = self.clone();
        Box::pin(async move {
            client
                .create_booking(&tour_package_id, travelers, &idempotency_key)
                .await
        })
    }

    fn verify(&self, request: VerifyPaymentRequest) -> BookingApiFuture<()> {
        let client = self.clone();
        Box::pin(async move { client.verify_payment(&request).await })
    }
}

/// Everything the checkout reducer needs from the outside world.
///
/// The widget handle is shared by every attempt made through this
/// environment; the gateway script loads once per page, not per attempt.
#[derive(Clone)]
pub struct CheckoutEnvironment {
    /// Backend booking endpoints
    pub booking_api: Arc<dyn BookingApi>,
    /// Hosted payment widget
    pub widget: Arc<dyn PaymentWidget>,
    /// Source of per-attempt idempotency keys
    pub ids: Arc<dyn IdGenerator>,
    /// Time source (failure timestamps)
    pub clock: Arc<dyn Clock>,
    /// Contact details prefilled into the widget
    pub customer: CustomerContact,
}

impl CheckoutEnvironment {
    /// Assemble an environment from its collaborators.
    pub fn new(
        booking_api: Arc<dyn BookingApi>,
        widget: Arc<dyn PaymentWidget>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
        customer: CustomerContact,
    ) -> Self {
        Self {
            booking_api,
            widget,
            ids,
            clock,
            customer,
        }
    }
}
