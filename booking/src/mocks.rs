//! Scripted collaborators for tests and demos.
//!
//! The mock widget lives in [`crate::widget`] next to its trait; this
//! module covers the backend side.

use crate::environment::{BookingApi, BookingApiFuture};
use ghumly_api::{ApiError, PaymentOrder, VerifyPaymentRequest};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// One recorded `create_order` invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateOrderCall {
    /// Tour the order was created for
    pub tour_package_id: String,
    /// Travelers on the booking
    pub travelers: u32,
    /// Idempotency key the attempt carried
    pub idempotency_key: String,
}

/// Scripted [`BookingApi`].
///
/// Order and verification responses are queued with the `with_*`
/// builders and consumed in order; an exhausted queue answers with a
/// business error naming the method. Calls are recorded with their
/// arguments so tests can assert on idempotency keys and on which
/// verification payload, if any, went out.
#[derive(Debug, Default)]
pub struct MockBookingApi {
    orders: Mutex<VecDeque<Result<PaymentOrder, String>>>,
    verifications: Mutex<VecDeque<Result<(), String>>>,
    create_calls: Mutex<Vec<CreateOrderCall>>,
    verify_calls: Mutex<Vec<VerifyPaymentRequest>>,
}

impl MockBookingApi {
    /// Mock with empty scripts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful order creation.
    #[must_use]
    pub fn with_order(self, order: PaymentOrder) -> Self {
        lock(&self.orders).push_back(Ok(order));
        self
    }

    /// Queue a refused order creation.
    #[must_use]
    pub fn with_order_error(self, message: impl Into<String>) -> Self {
        lock(&self.orders).push_back(Err(message.into()));
        self
    }

    /// Queue an accepted payment verification.
    #[must_use]
    pub fn with_verification(self) -> Self {
        lock(&self.verifications).push_back(Ok(()));
        self
    }

    /// Queue a rejected payment verification.
    #[must_use]
    pub fn with_verification_error(self, message: impl Into<String>) -> Self {
        lock(&self.verifications).push_back(Err(message.into()));
        self
    }

    /// Recorded `create_order` calls, in order.
    #[must_use]
    pub fn create_calls(&self) -> Vec<CreateOrderCall> {
        lock(&self.create_calls).clone()
    }

    /// Recorded verification payloads, in order.
    #[must_use]
    pub fn verify_calls(&self) -> Vec<VerifyPaymentRequest> {
        lock(&self.verify_calls).clone()
    }
}

impl BookingApi for MockBookingApi {
    fn create_order(
        &self,
        tour_package_id: String,
        travelers: u32,
        idempotency_key: String,
    ) -> BookingApiFuture<PaymentOrder> {
        lock(&self.create_calls).push(CreateOrderCall {
            tour_package_id,
            travelers,
            idempotency_key,
        });
        let result = take_scripted(&self.orders, "create_order");
        Box::pin(async move { result })
    }

    fn verify(&self, request: VerifyPaymentRequest) -> BookingApiFuture<()> {
        lock(&self.verify_calls).push(request);
        let result = take_scripted(&self.verifications, "verify");
        Box::pin(async move { result })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn take_scripted<T>(queue: &Mutex<VecDeque<Result<T, String>>>, method: &str) -> Result<T, ApiError> {
    match lock(queue).pop_front() {
        Some(Ok(value)) => Ok(value),
        Some(Err(message)) => Err(ApiError::Business(message)),
        None => Err(ApiError::Business(format!(
            "MockBookingApi: no scripted response for {method}"
        ))),
    }
}
