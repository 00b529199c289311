//! Client-side review eligibility.
//!
//! The backend is the authority on who may review what; these functions
//! mirror its rules ahead of time so the client only offers review forms
//! that can succeed. A booking qualifies when it is confirmed, lies on
//! the reviewed target, and its review check still has that side open.
//! The tour and agency sides of one booking are independent: reviewing
//! the tour leaves the agency reviewable, and the other way around.

use ghumly_api::{Booking, BookingStatus, Review, ReviewCheck, ReviewType, UserProfile};
use std::collections::HashMap;

/// What a review is being written about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReviewTarget {
    /// A tour package, by backend document id
    Tour(String),
    /// An agency, by backend document id
    Agency(String),
}

impl ReviewTarget {
    /// The targeted document id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Tour(id) | Self::Agency(id) => id,
        }
    }

    /// The review type a submission against this target carries.
    #[must_use]
    pub const fn review_type(&self) -> ReviewType {
        match self {
            Self::Tour(_) => ReviewType::Tour,
            Self::Agency(_) => ReviewType::Agency,
        }
    }
}

/// Whether `booking` can carry a review of `target` at all: confirmed,
/// and booked on the targeted tour or through the targeted agency.
///
/// The agency is read off the booking's tour, populated or not.
#[must_use]
pub fn is_candidate(booking: &Booking, target: &ReviewTarget) -> bool {
    if booking.status != BookingStatus::Confirmed {
        return false;
    }
    let Some(tour) = &booking.tour_package else {
        return false;
    };
    match target {
        ReviewTarget::Tour(id) => tour.id == *id,
        ReviewTarget::Agency(id) => tour.agency.as_ref().is_some_and(|agency| agency.id() == id),
    }
}

/// Whether a review check leaves the targeted side open.
#[must_use]
pub const fn check_allows(check: ReviewCheck, target: &ReviewTarget) -> bool {
    if !check.can_review {
        return false;
    }
    match target {
        ReviewTarget::Tour(_) => !check.has_reviewed_tour,
        ReviewTarget::Agency(_) => !check.has_reviewed_agency,
    }
}

/// Bookings from `bookings` that may still be used to review `target`.
///
/// `checks` is keyed by booking id. A candidate booking with no check
/// entry is left out: an unanswered check reads as ineligible, never as
/// permission.
#[must_use]
pub fn eligible_bookings(
    bookings: &[Booking],
    checks: &HashMap<String, ReviewCheck>,
    target: &ReviewTarget,
) -> Vec<Booking> {
    bookings
        .iter()
        .filter(|booking| is_candidate(booking, target))
        .filter(|booking| {
            checks
                .get(&booking.id)
                .is_some_and(|check| check_allows(*check, target))
        })
        .cloned()
        .collect()
}

/// Whether the signed-in user authored `review`.
///
/// Edit and delete controls are rendered only for the author; the
/// backend enforces the same rule on the mutation itself.
#[must_use]
pub fn can_modify(review: &Review, current_user: Option<&UserProfile>) -> bool {
    match (&review.user, current_user) {
        (Some(author), Some(user)) => author.id == user.id,
        _ => false,
    }
}
