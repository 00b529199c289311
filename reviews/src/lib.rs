//! # Ghumly Reviews
//!
//! Review eligibility and the submit/edit/delete workflow.
//!
//! A review hangs off a confirmed booking and targets either its tour
//! or the agency that ran it; the two sides are independent, so one
//! booking can carry one review of each. [`eligibility`] mirrors the
//! backend's rules client-side, [`ReviewReducer`] drives the workflow
//! over a [`ReviewState`] cache with a one-mutation-at-a-time guard.
//! The backend stays the authority on authorship and on
//! one-review-per-side; everything here is a forecast of its answer,
//! never a substitute for it.
//!
//! ```ignore
//! use ghumly_reviews::{ReviewAction, ReviewTarget};
//!
//! store
//!     .send(ReviewAction::LoadEligibleBookings {
//!         target: ReviewTarget::Tour(tour_id),
//!     })
//!     .await?;
//! let open = store
//!     .state(|s| s.eligible(&ReviewTarget::Tour(tour_id)))
//!     .await;
//! ```

pub mod eligibility;
pub mod environment;
pub mod reducer;
pub mod types;

#[cfg(feature = "test-utils")]
pub mod mocks;

pub use eligibility::{can_modify, check_allows, eligible_bookings, is_candidate, ReviewTarget};
pub use environment::{ReviewEnvironment, ReviewsApi, ReviewsApiFuture};
pub use reducer::ReviewReducer;
pub use types::{ReviewAction, ReviewState};
