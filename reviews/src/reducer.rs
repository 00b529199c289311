//! Review workflow reducer.
//!
//! Drives loading, submitting, editing and deleting reviews over the
//! command/event split in [`ReviewAction`]. The load walks the caller's
//! bookings and fetches a review check per candidate; mutations validate
//! the draft locally, then describe one API call as an
//! [`Effect::Future`]. One mutation runs at a time: commands arriving
//! while `submitting` is raised are counted no-ops.
//!
//! Input that fails validation never reaches the network. The reducer
//! answers with an immediate effect resolving to `ReviewRejected`, so
//! observers see the rejection on the same action feed as API outcomes.

use crate::eligibility::{self, ReviewTarget};
use crate::environment::{ReviewEnvironment, ReviewsApi};
use crate::types::{ReviewAction, ReviewState};
use ghumly_api::{CreateReviewRequest, ReviewType, UpdateReviewRequest};
use ghumly_core::effect::Effect;
use ghumly_core::reducer::Reducer;
use ghumly_core::{smallvec, SmallVec};
use ghumly_runtime::metrics::ReviewMetrics;
use std::collections::HashMap;
use std::sync::Arc;

/// Review text is capped at the backend's column width.
const MAX_REVIEW_CHARS: usize = 1000;

/// Review workflow reducer. Stateless; everything lives in
/// [`ReviewState`].
#[derive(Debug, Clone, Default)]
pub struct ReviewReducer;

impl ReviewReducer {
    /// Create a new review reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// The effect for input rejected before any network call.
fn rejected(message: &str) -> SmallVec<[Effect<ReviewAction>; 4]> {
    let message = message.to_string();
    smallvec![Effect::Future(Box::pin(async move {
        Some(ReviewAction::ReviewRejected { message })
    }))]
}

/// The draft problem a submit or edit would be refused for, if any.
fn draft_problem(rating: u8, text: &str) -> Option<&'static str> {
    if !(1..=5).contains(&rating) {
        return Some("Please select a rating");
    }
    if text.chars().count() > MAX_REVIEW_CHARS {
        return Some("Review text must be 1000 characters or less");
    }
    None
}

/// Fetch the caller's bookings, then a review check per candidate.
///
/// Checks run one at a time. A failed check drops that booking from the
/// eligible set instead of failing the whole load; an unanswered check
/// must never read as permission.
async fn load_eligible(api: Arc<dyn ReviewsApi>, target: ReviewTarget) -> ReviewAction {
    let bookings = match api.my_bookings().await {
        Ok(bookings) => bookings,
        Err(error) => {
            return ReviewAction::ReviewRejected {
                message: error.to_string(),
            };
        }
    };

    let mut checks = HashMap::new();
    for booking in bookings
        .iter()
        .filter(|booking| eligibility::is_candidate(booking, &target))
    {
        match api.review_check(booking.id.clone()).await {
            Ok(check) => {
                checks.insert(booking.id.clone(), check);
            }
            Err(error) => {
                tracing::warn!(
                    booking_id = %booking.id,
                    %error,
                    "review check failed; booking treated as ineligible"
                );
            }
        }
    }

    ReviewAction::EligibleBookingsLoaded { bookings, checks }
}

impl Reducer for ReviewReducer {
    type State = ReviewState;
    type Action = ReviewAction;
    type Environment = ReviewEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per action keeps the flow readable
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ═══════════════════════════════════════════════════════════════
            // LoadEligibleBookings: Bookings first, then a check per candidate
            // ═══════════════════════════════════════════════════════════════
            ReviewAction::LoadEligibleBookings { target } => {
                state.last_error = None;
                let api = env.reviews_api.clone();
                smallvec![Effect::Future(Box::pin(async move {
                    Some(load_eligible(api, target).await)
                }))]
            }

            // ═══════════════════════════════════════════════════════════════
            // SubmitReview: Validate the draft locally, then create it
            // ═══════════════════════════════════════════════════════════════
            ReviewAction::SubmitReview {
                booking_id,
                target_type,
                rating,
                text,
            } => {
                if state.submitting {
                    tracing::warn!("review mutation already in flight; submit ignored");
                    ReviewMetrics::record_double_submit_blocked();
                    return smallvec![Effect::None];
                }
                if let Some(problem) = draft_problem(rating, &text) {
                    return rejected(problem);
                }

                state.submitting = true;
                state.last_error = None;
                let api = env.reviews_api.clone();
                let request = CreateReviewRequest {
                    booking_id: booking_id.clone(),
                    review_type: target_type,
                    rating,
                    review_text: text,
                };
                smallvec![Effect::Future(Box::pin(async move {
                    Some(match api.create_review(request).await {
                        Ok(review) => ReviewAction::ReviewSubmitted {
                            booking_id,
                            target_type,
                            review,
                        },
                        Err(error) => ReviewAction::ReviewRejected {
                            message: error.to_string(),
                        },
                    })
                }))]
            }

            // ═══════════════════════════════════════════════════════════════
            // EditReview: Same draft rules, aimed at an existing review
            // ═══════════════════════════════════════════════════════════════
            ReviewAction::EditReview {
                review_id,
                rating,
                text,
            } => {
                if state.submitting {
                    tracing::warn!("review mutation already in flight; edit ignored");
                    ReviewMetrics::record_double_submit_blocked();
                    return smallvec![Effect::None];
                }
                if let Some(problem) = draft_problem(rating, &text) {
                    return rejected(problem);
                }

                state.submitting = true;
                state.last_error = None;
                let api = env.reviews_api.clone();
                let request = UpdateReviewRequest {
                    rating,
                    review_text: text,
                };
                smallvec![Effect::Future(Box::pin(async move {
                    Some(match api.update_review(review_id, request).await {
                        Ok(review) => ReviewAction::ReviewUpdated { review },
                        Err(error) => ReviewAction::ReviewRejected {
                            message: error.to_string(),
                        },
                    })
                }))]
            }

            // ═══════════════════════════════════════════════════════════════
            // DeleteReview: No draft to validate, straight to the API
            // ═══════════════════════════════════════════════════════════════
            ReviewAction::DeleteReview { review_id } => {
                if state.submitting {
                    tracing::warn!("review mutation already in flight; delete ignored");
                    ReviewMetrics::record_double_submit_blocked();
                    return smallvec![Effect::None];
                }

                state.submitting = true;
                state.last_error = None;
                let api = env.reviews_api.clone();
                smallvec![Effect::Future(Box::pin(async move {
                    Some(match api.delete_review(review_id.clone()).await {
                        Ok(()) => ReviewAction::ReviewDeleted { review_id },
                        Err(error) => ReviewAction::ReviewRejected {
                            message: error.to_string(),
                        },
                    })
                }))]
            }

            // ═══════════════════════════════════════════════════════════════
            // EligibleBookingsLoaded: Settle the caches
            // ═══════════════════════════════════════════════════════════════
            ReviewAction::EligibleBookingsLoaded { bookings, checks } => {
                tracing::info!(
                    bookings = bookings.len(),
                    candidates = checks.len(),
                    "eligible bookings loaded"
                );
                state.bookings = bookings;
                state.checks = checks;
                smallvec![Effect::None]
            }

            // ═══════════════════════════════════════════════════════════════
            // ReviewSubmitted: Close the reviewed side locally
            // ═══════════════════════════════════════════════════════════════
            ReviewAction::ReviewSubmitted {
                booking_id,
                target_type,
                review: _,
            } => {
                ReviewMetrics::record_submitted();
                tracing::info!(%booking_id, ?target_type, "review submitted");
                state.submitting = false;
                // Mirror the server: this side of the booking is spent,
                // without waiting for a reload.
                if let Some(check) = state.checks.get_mut(&booking_id) {
                    match target_type {
                        ReviewType::Tour => check.has_reviewed_tour = true,
                        ReviewType::Agency => check.has_reviewed_agency = true,
                    }
                }
                smallvec![Effect::None]
            }

            // ═══════════════════════════════════════════════════════════════
            // ReviewUpdated / ReviewDeleted: Drop the in-flight guard
            // ═══════════════════════════════════════════════════════════════
            ReviewAction::ReviewUpdated { review: _ } => {
                ReviewMetrics::record_updated();
                tracing::info!("review updated");
                state.submitting = false;
                smallvec![Effect::None]
            }
            ReviewAction::ReviewDeleted { review_id } => {
                ReviewMetrics::record_deleted();
                tracing::info!(%review_id, "review deleted");
                state.submitting = false;
                smallvec![Effect::None]
            }

            // ═══════════════════════════════════════════════════════════════
            // ReviewRejected: Surface the message, drop the guard
            // ═══════════════════════════════════════════════════════════════
            ReviewAction::ReviewRejected { message } => {
                ReviewMetrics::record_rejected();
                tracing::warn!(%message, "review request rejected");
                state.submitting = false;
                state.last_error = Some(message);
                smallvec![Effect::None]
            }
        }
    }
}
