//! Review endpoints.
//!
//! Reviews hang off a confirmed booking and target either its tour or its
//! agency; the backend enforces authorship and one-review-per-target, the
//! client only mirrors those rules ahead of time via `review_check`. List
//! endpoints are reads and retry per policy; submit/edit/delete are
//! mutations and execute exactly once.

use crate::{
    catalog::PageQuery,
    client::ApiClient,
    error::ApiError,
    types::{Paginated, Review, ReviewCheck},
};
use serde::{Deserialize, Serialize};

/// Which side of a booking a review targets
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReviewType {
    /// Review the booked tour package
    Tour,
    /// Review the agency that ran it
    Agency,
}

/// Review creation request body
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateReviewRequest {
    /// Confirmed booking the review is attached to
    #[serde(rename = "bookingId")]
    pub booking_id: String,
    /// Tour or agency review
    #[serde(rename = "reviewType")]
    pub review_type: ReviewType,
    /// Star rating, 1 to 5
    pub rating: u8,
    /// Free-text review body
    #[serde(rename = "reviewText")]
    pub review_text: String,
}

/// Review edit request body; target and booking are fixed at creation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateReviewRequest {
    /// New star rating, 1 to 5
    pub rating: u8,
    /// New review body
    #[serde(rename = "reviewText")]
    pub review_text: String,
}

#[derive(Deserialize)]
struct ReviewMutationResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    review: Option<Review>,
    #[serde(default)]
    message: Option<String>,
}

impl ReviewMutationResponse {
    fn into_review(self, fallback: &str) -> Result<Option<Review>, ApiError> {
        if self.success == Some(false) {
            return Err(ApiError::Business(
                self.message.unwrap_or_else(|| fallback.to_string()),
            ));
        }
        Ok(self.review)
    }
}

impl ApiClient {
    /// `GET /reviews/tour/:id` - published reviews for a tour, paginated.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after exhausting read retries.
    pub async fn tour_reviews(
        &self,
        tour_id: &str,
        query: &PageQuery,
    ) -> Result<Paginated<Review>, ApiError> {
        let path = format!("/reviews/tour/{tour_id}");
        self.get_with_query(&path, Some(query), "reviews.tour")
            .await
    }

    /// `GET /reviews/agency/:id` - published reviews for an agency, paginated.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after exhausting read retries.
    pub async fn agency_reviews(
        &self,
        agency_id: &str,
        query: &PageQuery,
    ) -> Result<Paginated<Review>, ApiError> {
        let path = format!("/reviews/agency/{agency_id}");
        self.get_with_query(&path, Some(query), "reviews.agency")
            .await
    }

    /// `GET /reviews/check/:bookingId` - what the caller may still review on
    /// this booking.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after exhausting read retries.
    pub async fn review_check(&self, booking_id: &str) -> Result<ReviewCheck, ApiError> {
        let path = format!("/reviews/check/{booking_id}");
        self.get(&path, "reviews.check").await
    }

    /// `POST /reviews` - submit a review for a booking. Not retried.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Business`] with the server message when the
    /// backend answers `success: false`, or a transport/HTTP error otherwise.
    pub async fn create_review(
        &self,
        request: &CreateReviewRequest,
    ) -> Result<Option<Review>, ApiError> {
        let response: ReviewMutationResponse =
            self.post("/reviews", request, "reviews.create").await?;
        response.into_review("Failed to submit review")
    }

    /// `PUT /reviews/:id` - edit an existing review. Not retried.
    ///
    /// The backend rejects edits by anyone but the author.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Business`] with the server message when the
    /// backend answers `success: false`, or a transport/HTTP error otherwise.
    pub async fn update_review(
        &self,
        review_id: &str,
        request: &UpdateReviewRequest,
    ) -> Result<Option<Review>, ApiError> {
        let path = format!("/reviews/{review_id}");
        let response: ReviewMutationResponse =
            self.put(&path, request, "reviews.update").await?;
        response.into_review("Failed to update review")
    }

    /// `DELETE /reviews/:id` - remove an existing review. Not retried.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Business`] with the server message when the
    /// backend answers `success: false`, or a transport/HTTP error otherwise.
    pub async fn delete_review(&self, review_id: &str) -> Result<(), ApiError> {
        let path = format!("/reviews/{review_id}");
        let response: ReviewMutationResponse = self.delete(&path, "reviews.delete").await?;
        response.into_review("Failed to delete review").map(|_| ())
    }
}
