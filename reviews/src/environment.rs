//! Dependency injection for the review reducer.

use ghumly_api::{
    ApiClient, ApiError, Booking, CreateReviewRequest, Review, ReviewCheck, UpdateReviewRequest,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by [`ReviewsApi`] methods.
pub type ReviewsApiFuture<T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send>>;

/// Port over the backend's booking-list and review endpoints.
///
/// Object safe so the environment can hold `Arc<dyn ReviewsApi>`: the
/// real client in the app, a scripted mock in tests.
pub trait ReviewsApi: Send + Sync {
    /// `GET /bookings/my-bookings`
    fn my_bookings(&self) -> ReviewsApiFuture<Vec<Booking>>;

    /// `GET /reviews/check/:bookingId`
    fn review_check(&self, booking_id: String) -> ReviewsApiFuture<ReviewCheck>;

    /// `POST /reviews`
    fn create_review(&self, request: CreateReviewRequest) -> ReviewsApiFuture<Option<Review>>;

    /// `PUT /reviews/:id`
    fn update_review(
        &self,
        review_id: String,
        request: UpdateReviewRequest,
    ) -> ReviewsApiFuture<Option<Review>>;

    /// `DELETE /reviews/:id`
    fn delete_review(&self, review_id: String) -> ReviewsApiFuture<()>;
}

impl ReviewsApi for ApiClient {
    fn my_bookings(&self) -> ReviewsApiFuture<Vec<Booking>> {
        let client = self.clone();
        Box::pin(async move { client.my_bookings().await })
    }

    fn review_check(&self, booking_id: String) -> ReviewsApiFuture<ReviewCheck> {
        let client = self.clone();
        Box::pin(async move { client.review_check(&booking_id).await })
    }

    fn create_review(&self, request: CreateReviewRequest) -> ReviewsApiFuture<Option<Review>> {
        let client = self.clone();
        Box::pin(async move { client.create_review(&request).await })
    }

    fn update_review(
        &self,
        review_id: String,
        request: UpdateReviewRequest,
    ) -> ReviewsApiFuture<Option<Review>> {
        let client = self.clone();
        Box::pin(async move { client.update_review(&review_id, &request).await })
    }

    fn delete_review(&self, review_id: String) -> ReviewsApiFuture<()> {
        let client = self.clone();
        Box::pin(async move { client.delete_review(&review_id).await })
    }
}

/// Everything the review reducer needs from the outside world.
#[derive(Clone)]
pub struct ReviewEnvironment {
    /// Backend booking-list and review endpoints
    pub reviews_api: Arc<dyn ReviewsApi>,
}

impl ReviewEnvironment {
    /// Assemble an environment from its collaborators.
    #[must_use]
    pub fn new(reviews_api: Arc<dyn ReviewsApi>) -> Self {
        Self { reviews_api }
    }
}
