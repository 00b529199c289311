//! Review workflow state and actions.

use crate::eligibility::{self, ReviewTarget};
use ghumly_api::{Booking, Review, ReviewCheck, ReviewType};
use std::collections::HashMap;

/// Client cache of the caller's bookings and what each may still review,
/// plus the in-flight guard for mutations.
///
/// One mutation at a time: `submitting` is raised when a submit, edit or
/// delete goes out and dropped by the event that answers it. Commands
/// arriving while it is raised are counted no-ops.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReviewState {
    /// The caller's bookings, as last loaded
    pub bookings: Vec<Booking>,
    /// Review permissions per booking id, candidates only
    pub checks: HashMap<String, ReviewCheck>,
    /// A submit, edit or delete is in flight
    pub submitting: bool,
    /// Last user-facing error
    pub last_error: Option<String>,
}

impl ReviewState {
    /// Bookings that may still be used to review `target`, from the
    /// cached bookings and checks.
    #[must_use]
    pub fn eligible(&self, target: &ReviewTarget) -> Vec<Booking> {
        eligibility::eligible_bookings(&self.bookings, &self.checks, target)
    }
}

/// Everything that can happen in the review workflow.
#[derive(Clone, Debug, PartialEq)]
pub enum ReviewAction {
    // ========== Commands ==========
    /// Load the caller's bookings and their review permissions for
    /// `target`.
    LoadEligibleBookings {
        /// Tour or agency being reviewed
        target: ReviewTarget,
    },
    /// Submit a new review against a confirmed booking.
    SubmitReview {
        /// Booking the review is attached to
        booking_id: String,
        /// Which side of the booking is reviewed
        target_type: ReviewType,
        /// Star rating, 1 to 5
        rating: u8,
        /// Free-text body, at most 1000 characters
        text: String,
    },
    /// Rewrite an existing review's rating and text.
    EditReview {
        /// Review to edit
        review_id: String,
        /// New star rating, 1 to 5
        rating: u8,
        /// New body, at most 1000 characters
        text: String,
    },
    /// Remove an existing review.
    DeleteReview {
        /// Review to delete
        review_id: String,
    },

    // ========== Events ==========
    /// The caller's bookings and permissions arrived.
    EligibleBookingsLoaded {
        /// The caller's bookings
        bookings: Vec<Booking>,
        /// Permissions per booking id, candidates only
        checks: HashMap<String, ReviewCheck>,
    },
    /// The backend accepted the new review.
    ReviewSubmitted {
        /// Booking the review was attached to
        booking_id: String,
        /// Which side was reviewed
        target_type: ReviewType,
        /// The stored review, when the backend echoes it back
        review: Option<Review>,
    },
    /// The backend accepted the edit.
    ReviewUpdated {
        /// The stored review, when the backend echoes it back
        review: Option<Review>,
    },
    /// The backend removed the review.
    ReviewDeleted {
        /// The deleted review's id
        review_id: String,
    },
    /// A request was refused, client-side or by the backend.
    ReviewRejected {
        /// User-facing message
        message: String,
    },
}
