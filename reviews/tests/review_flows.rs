#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

//! Full review flows through a real store: scripted backend, assertions
//! on the eligible set, on exactly which calls went out, and on the
//! one-mutation-at-a-time guard releasing after each outcome.

use ghumly_api::{
    AgencyRef, Booking, BookingStatus, CreateReviewRequest, ReviewCheck, ReviewType, TourPackage,
    UpdateReviewRequest,
};
use ghumly_reviews::mocks::{MockReviewsApi, UpdateReviewCall};
use ghumly_reviews::{
    ReviewAction, ReviewEnvironment, ReviewReducer, ReviewState, ReviewTarget,
};
use ghumly_runtime::Store;
use std::sync::Arc;
use std::time::Duration;

type ReviewStore = Store<ReviewState, ReviewAction, ReviewEnvironment, ReviewReducer>;

const WAIT: Duration = Duration::from_secs(5);

fn tour_on(tour_id: &str) -> TourPackage {
    TourPackage {
        id: tour_id.to_string(),
        title: "Ladakh Circuit".to_string(),
        price: None,
        min_group_size: 1,
        max_group_size: 10,
        agency: Some(AgencyRef::Id("a1".to_string())),
        region: None,
        departure_city: None,
        start_date: None,
        days: Some(7),
        nights: Some(6),
        tour_theme: None,
        is_featured: false,
    }
}

fn booking(id: &str, status: BookingStatus, tour_id: &str) -> Booking {
    Booking {
        id: id.to_string(),
        tour_package: Some(tour_on(tour_id)),
        number_of_travelers: 2,
        status,
        total_amount: Some(2500.0),
        booking_date: None,
        created_at: None,
    }
}

fn open_check() -> ReviewCheck {
    ReviewCheck {
        can_review: true,
        has_reviewed_tour: false,
        has_reviewed_agency: false,
    }
}

fn tour_target() -> ReviewTarget {
    ReviewTarget::Tour("t1".to_string())
}

fn submit(rating: u8) -> ReviewAction {
    ReviewAction::SubmitReview {
        booking_id: "b1".to_string(),
        target_type: ReviewType::Tour,
        rating,
        text: "Great trek".to_string(),
    }
}

fn store_with(api: MockReviewsApi) -> (ReviewStore, Arc<MockReviewsApi>) {
    let api = Arc::new(api);
    let environment = ReviewEnvironment::new(api.clone());
    let store = Store::new(ReviewState::default(), ReviewReducer::new(), environment);
    (store, api)
}

/// Poll the store until the state passes `check`.
async fn eventually<F>(store: &ReviewStore, what: &str, check: F)
where
    F: Fn(&ReviewState) -> bool,
{
    let deadline = tokio::time::Instant::now() + WAIT;
    while !store.state(|state| check(state)).await {
        assert!(
            tokio::time::Instant::now() < deadline,
            "store never reached: {what}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn eligible_ids(state: &ReviewState, target: &ReviewTarget) -> Vec<String> {
    state
        .eligible(target)
        .into_iter()
        .map(|booking| booking.id)
        .collect()
}

#[tokio::test]
async fn load_checks_only_confirmed_bookings_on_the_target() {
    let (store, api) = store_with(
        MockReviewsApi::new()
            .with_bookings(vec![
                booking("b1", BookingStatus::Confirmed, "t1"),
                booking("b2", BookingStatus::Pending, "t1"),
                booking("b3", BookingStatus::Confirmed, "t9"),
            ])
            .with_check("b1", open_check()),
    );

    store
        .send_and_wait_for(
            ReviewAction::LoadEligibleBookings {
                target: tour_target(),
            },
            |a| matches!(a, ReviewAction::EligibleBookingsLoaded { .. }),
            WAIT,
        )
        .await
        .unwrap();

    eventually(&store, "eligible set settled", |s| {
        eligible_ids(s, &tour_target()) == vec!["b1".to_string()]
    })
    .await;
    assert_eq!(api.check_calls(), vec!["b1".to_string()]);
}

#[tokio::test]
async fn load_then_submit_closes_the_tour_side_only() {
    let (store, api) = store_with(
        MockReviewsApi::new()
            .with_bookings(vec![booking("b1", BookingStatus::Confirmed, "t1")])
            .with_check("b1", open_check())
            .with_creation(None),
    );

    store
        .send_and_wait_for(
            ReviewAction::LoadEligibleBookings {
                target: tour_target(),
            },
            |a| matches!(a, ReviewAction::EligibleBookingsLoaded { .. }),
            WAIT,
        )
        .await
        .unwrap();
    eventually(&store, "booking eligible", |s| {
        !s.eligible(&tour_target()).is_empty()
    })
    .await;

    store
        .send_and_wait_for(
            submit(5),
            |a| matches!(a, ReviewAction::ReviewSubmitted { .. }),
            WAIT,
        )
        .await
        .unwrap();

    assert_eq!(
        api.create_calls(),
        vec![CreateReviewRequest {
            booking_id: "b1".to_string(),
            review_type: ReviewType::Tour,
            rating: 5,
            review_text: "Great trek".to_string(),
        }]
    );
    eventually(&store, "tour side closed, agency side open", |s| {
        !s.submitting
            && s.eligible(&tour_target()).is_empty()
            && eligible_ids(s, &ReviewTarget::Agency("a1".to_string())) == vec!["b1".to_string()]
    })
    .await;
}

#[tokio::test]
async fn missing_rating_never_reaches_the_backend() {
    let (store, api) = store_with(MockReviewsApi::new());

    let outcome = store
        .send_and_wait_for(
            submit(0),
            |a| matches!(a, ReviewAction::ReviewRejected { .. }),
            WAIT,
        )
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ReviewAction::ReviewRejected {
            message: "Please select a rating".to_string()
        }
    );
    eventually(&store, "error surfaced", |s| {
        s.last_error.as_deref() == Some("Please select a rating")
    })
    .await;
    assert!(api.create_calls().is_empty());
}

#[tokio::test]
async fn load_failure_surfaces_the_server_message() {
    let (store, _api) = store_with(MockReviewsApi::new().with_bookings_error("Session expired"));

    store
        .send_and_wait_for(
            ReviewAction::LoadEligibleBookings {
                target: tour_target(),
            },
            |a| matches!(a, ReviewAction::ReviewRejected { .. }),
            WAIT,
        )
        .await
        .unwrap();

    eventually(&store, "error surfaced", |s| {
        s.last_error.as_deref() == Some("Session expired")
    })
    .await;
}

#[tokio::test]
async fn backend_rejection_unlocks_the_next_attempt() {
    let (store, api) = store_with(
        MockReviewsApi::new()
            .with_creation_error("You have already reviewed this tour")
            .with_creation(None),
    );

    store
        .send_and_wait_for(
            submit(5),
            |a| matches!(a, ReviewAction::ReviewRejected { .. }),
            WAIT,
        )
        .await
        .unwrap();
    eventually(&store, "guard released with the message kept", |s| {
        !s.submitting && s.last_error.as_deref() == Some("You have already reviewed this tour")
    })
    .await;

    store
        .send_and_wait_for(
            submit(4),
            |a| matches!(a, ReviewAction::ReviewSubmitted { .. }),
            WAIT,
        )
        .await
        .unwrap();

    assert_eq!(api.create_calls().len(), 2);
    eventually(&store, "second attempt settled", |s| {
        !s.submitting && s.last_error.is_none()
    })
    .await;
}

#[tokio::test]
async fn failed_check_drops_only_that_booking() {
    let (store, api) = store_with(
        MockReviewsApi::new()
            .with_bookings(vec![
                booking("b1", BookingStatus::Confirmed, "t1"),
                booking("b4", BookingStatus::Confirmed, "t1"),
            ])
            .with_check("b1", open_check())
            .with_check_error("b4", "check unavailable"),
    );

    store
        .send_and_wait_for(
            ReviewAction::LoadEligibleBookings {
                target: tour_target(),
            },
            |a| matches!(a, ReviewAction::EligibleBookingsLoaded { .. }),
            WAIT,
        )
        .await
        .unwrap();

    eventually(&store, "only the checked booking eligible", |s| {
        eligible_ids(s, &tour_target()) == vec!["b1".to_string()]
    })
    .await;
    assert_eq!(api.check_calls(), vec!["b1".to_string(), "b4".to_string()]);
}

#[tokio::test]
async fn edit_and_delete_round_trip() {
    let (store, api) = store_with(MockReviewsApi::new().with_update(None).with_deletion());

    store
        .send_and_wait_for(
            ReviewAction::EditReview {
                review_id: "r1".to_string(),
                rating: 4,
                text: "Edited after the second trip".to_string(),
            },
            |a| matches!(a, ReviewAction::ReviewUpdated { .. }),
            WAIT,
        )
        .await
        .unwrap();
    eventually(&store, "edit settled", |s| !s.submitting).await;

    store
        .send_and_wait_for(
            ReviewAction::DeleteReview {
                review_id: "r1".to_string(),
            },
            |a| matches!(a, ReviewAction::ReviewDeleted { .. }),
            WAIT,
        )
        .await
        .unwrap();

    assert_eq!(
        api.update_calls(),
        vec![UpdateReviewCall {
            review_id: "r1".to_string(),
            request: UpdateReviewRequest {
                rating: 4,
                review_text: "Edited after the second trip".to_string(),
            },
        }]
    );
    assert_eq!(api.delete_calls(), vec!["r1".to_string()]);
    eventually(&store, "delete settled", |s| !s.submitting).await;
}
