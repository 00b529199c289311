//! Scripted collaborators for tests and demos.

use crate::environment::{ReviewsApi, ReviewsApiFuture};
use ghumly_api::{
    ApiError, Booking, CreateReviewRequest, Review, ReviewCheck, UpdateReviewRequest,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

/// One recorded `update_review` invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateReviewCall {
    /// Review the edit addressed
    pub review_id: String,
    /// Request body that went out
    pub request: UpdateReviewRequest,
}

/// Scripted [`ReviewsApi`].
///
/// Booking lists and mutation responses are queued with the `with_*`
/// builders and consumed in order. Review checks are keyed by booking id
/// instead, because the loader asks once per candidate booking and tests
/// should not have to know the candidate order. An exhausted queue or a
/// missing check answers with a business error naming the method. Calls
/// are recorded with their arguments.
#[derive(Debug, Default)]
pub struct MockReviewsApi {
    bookings: Mutex<VecDeque<Result<Vec<Booking>, String>>>,
    checks: Mutex<HashMap<String, Result<ReviewCheck, String>>>,
    creations: Mutex<VecDeque<Result<Option<Review>, String>>>,
    updates: Mutex<VecDeque<Result<Option<Review>, String>>>,
    deletions: Mutex<VecDeque<Result<(), String>>>,
    check_calls: Mutex<Vec<String>>,
    create_calls: Mutex<Vec<CreateReviewRequest>>,
    update_calls: Mutex<Vec<UpdateReviewCall>>,
    delete_calls: Mutex<Vec<String>>,
}

impl MockReviewsApi {
    /// Mock with empty scripts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a booking-list response.
    #[must_use]
    pub fn with_bookings(self, bookings: Vec<Booking>) -> Self {
        lock(&self.bookings).push_back(Ok(bookings));
        self
    }

    /// Queue a failed booking-list fetch.
    #[must_use]
    pub fn with_bookings_error(self, message: impl Into<String>) -> Self {
        lock(&self.bookings).push_back(Err(message.into()));
        self
    }

    /// Script the review check for one booking.
    #[must_use]
    pub fn with_check(self, booking_id: impl Into<String>, check: ReviewCheck) -> Self {
        lock(&self.checks).insert(booking_id.into(), Ok(check));
        self
    }

    /// Script a failing review check for one booking.
    #[must_use]
    pub fn with_check_error(
        self,
        booking_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        lock(&self.checks).insert(booking_id.into(), Err(message.into()));
        self
    }

    /// Queue an accepted review creation.
    #[must_use]
    pub fn with_creation(self, review: Option<Review>) -> Self {
        lock(&self.creations).push_back(Ok(review));
        self
    }

    /// Queue a refused review creation.
    #[must_use]
    pub fn with_creation_error(self, message: impl Into<String>) -> Self {
        lock(&self.creations).push_back(Err(message.into()));
        self
    }

    /// Queue an accepted review edit.
    #[must_use]
    pub fn with_update(self, review: Option<Review>) -> Self {
        lock(&self.updates).push_back(Ok(review));
        self
    }

    /// Queue a refused review edit.
    #[must_use]
    pub fn with_update_error(self, message: impl Into<String>) -> Self {
        lock(&self.updates).push_back(Err(message.into()));
        self
    }

    /// Queue an accepted review deletion.
    #[must_use]
    pub fn with_deletion(self) -> Self {
        lock(&self.deletions).push_back(Ok(()));
        self
    }

    /// Queue a refused review deletion.
    #[must_use]
    pub fn with_deletion_error(self, message: impl Into<String>) -> Self {
        lock(&self.deletions).push_back(Err(message.into()));
        self
    }

    /// Booking ids whose checks were fetched, in order.
    #[must_use]
    pub fn check_calls(&self) -> Vec<String> {
        lock(&self.check_calls).clone()
    }

    /// Recorded `create_review` request bodies, in order.
    #[must_use]
    pub fn create_calls(&self) -> Vec<CreateReviewRequest> {
        lock(&self.create_calls).clone()
    }

    /// Recorded `update_review` calls, in order.
    #[must_use]
    pub fn update_calls(&self) -> Vec<UpdateReviewCall> {
        lock(&self.update_calls).clone()
    }

    /// Review ids deleted, in order.
    #[must_use]
    pub fn delete_calls(&self) -> Vec<String> {
        lock(&self.delete_calls).clone()
    }
}

impl ReviewsApi for MockReviewsApi {
    fn my_bookings(&self) -> ReviewsApiFuture<Vec<Booking>> {
        let result = take_scripted(&self.bookings, "my_bookings");
        Box::pin(async move { result })
    }

    fn review_check(&self, booking_id: String) -> ReviewsApiFuture<ReviewCheck> {
        lock(&self.check_calls).push(booking_id.clone());
        let result = match lock(&self.checks).get(&booking_id) {
            Some(Ok(check)) => Ok(*check),
            Some(Err(message)) => Err(ApiError::Business(message.clone())),
            None => Err(ApiError::Business(format!(
                "MockReviewsApi: no scripted check for {booking_id}"
            ))),
        };
        Box::pin(async move { result })
    }

    fn create_review(&self, request: CreateReviewRequest) -> ReviewsApiFuture<Option<Review>> {
        lock(&self.create_calls).push(request);
        let result = take_scripted(&self.creations, "create_review");
        Box::pin(async move { result })
    }

    fn update_review(
        &self,
        review_id: String,
        request: UpdateReviewRequest,
    ) -> ReviewsApiFuture<Option<Review>> {
        lock(&self.update_calls).push(UpdateReviewCall { review_id, request });
        let result = take_scripted(&self.updates, "update_review");
        Box::pin(async move { result })
    }

    fn delete_review(&self, review_id: String) -> ReviewsApiFuture<()> {
        lock(&self.delete_calls).push(review_id);
        let result = take_scripted(&self.deletions, "delete_review");
        Box::pin(async move { result })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn take_scripted<T>(
    queue: &Mutex<VecDeque<Result<T, String>>>,
    method: &str,
) -> Result<T, ApiError> {
    match lock(queue).pop_front() {
        Some(Ok(value)) => Ok(value),
        Some(Err(message)) => Err(ApiError::Business(message)),
        None => Err(ApiError::Business(format!(
            "MockReviewsApi: no scripted response for {method}"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use ghumly_api::ReviewType;

    #[tokio::test]
    async fn missing_check_answers_with_an_error() {
        let api = MockReviewsApi::new();
        let result = api.review_check("b1".to_string()).await;
        assert!(matches!(result, Err(ApiError::Business(m)) if m.contains("b1")));
        assert_eq!(api.check_calls(), vec!["b1".to_string()]);
    }

    #[tokio::test]
    async fn records_create_requests() {
        let api = MockReviewsApi::new().with_creation(None);
        let request = CreateReviewRequest {
            booking_id: "b1".to_string(),
            review_type: ReviewType::Tour,
            rating: 5,
            review_text: "Great trek".to_string(),
        };

        let result = api.create_review(request.clone()).await;

        assert!(result.unwrap().is_none());
        assert_eq!(api.create_calls(), vec![request]);
    }
}
