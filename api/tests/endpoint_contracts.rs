//! Integration tests for per-endpoint request and response contracts.
//!
//! Checks what actually crosses the wire: bearer credentials, the booking
//! idempotency key, camelCase payload naming, pagination query parameters,
//! and the `success: false` envelope turning into a business error.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use ghumly_api::{
    ApiClient, ApiConfig, ApiError, CreateReviewRequest, PageQuery, ReviewType,
    VerifyPaymentRequest,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(ApiConfig::new(server.uri())).expect("client builds")
}

// ============================================================================
// Credentials and Headers
// ============================================================================

#[tokio::test]
async fn bearer_token_is_attached_when_present() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bookings/my-bookings"))
        .and(header("authorization", "Bearer jwt-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"bookings": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).with_token("jwt-abc");
    let bookings = client.my_bookings().await.unwrap();

    assert!(bookings.is_empty());
}

#[tokio::test]
async fn create_booking_sends_idempotency_key_and_camel_case_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bookings"))
        .and(header("Idempotency-Key", "attempt-key-1"))
        .and(body_json(json!({
            "tourPackageId": "t1",
            "numberOfTravelers": 4
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "bookingId": "b1",
            "razorpayOrderId": "order_9",
            "razorpayKeyId": "rzp_test_key",
            "amount": 12500.0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let order = client.create_booking("t1", 4, "attempt-key-1").await.unwrap();

    assert_eq!(order.booking_id, "b1");
    assert_eq!(order.gateway_order_id, "order_9");
    assert_eq!(order.gateway_key_id, "rzp_test_key");
    // Rupees to paise for the widget.
    assert_eq!(order.amount_minor_units, 1_250_000);
}

// ============================================================================
// Envelope Handling
// ============================================================================

#[tokio::test]
async fn create_booking_success_false_maps_to_business_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bookings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Tour is fully booked"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .create_booking("t1", 2, "attempt-key-2")
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Business(m) if m == "Tour is fully booked"));
}

#[tokio::test]
async fn verify_payment_rejection_carries_server_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bookings/verify-payment"))
        .and(body_json(json!({
            "razorpay_order_id": "order_9",
            "razorpay_payment_id": "pay_3",
            "razorpay_signature": "sig-x",
            "bookingId": "b1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Invalid payment signature"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = VerifyPaymentRequest {
        razorpay_order_id: "order_9".to_string(),
        razorpay_payment_id: "pay_3".to_string(),
        razorpay_signature: "sig-x".to_string(),
        booking_id: "b1".to_string(),
    };
    let err = client.verify_payment(&request).await.unwrap_err();

    assert!(matches!(err, ApiError::Business(m) if m == "Invalid payment signature"));
}

#[tokio::test]
async fn booking_list_accepts_keyed_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bookings/my-bookings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bookings": [
                {"_id": "b1", "status": "confirmed", "numberOfTravelers": 2},
                {"_id": "b2", "status": "pending"}
            ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let bookings = client.my_bookings().await.unwrap();

    assert_eq!(bookings.len(), 2);
    assert_eq!(bookings[0].id, "b1");
    assert_eq!(bookings[0].number_of_travelers, 2);
    // Absent party size falls back to one traveler.
    assert_eq!(bookings[1].number_of_travelers, 1);
}

// ============================================================================
// Reviews
// ============================================================================

#[tokio::test]
async fn tour_reviews_paginates_with_query_params() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reviews/tour/t1"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{
                "_id": "r1",
                "rating": 5,
                "reviewText": "Unforgettable",
                "user": {"_id": "u1", "name": "Asha"}
            }],
            "pagination": {"page": 2, "limit": 10, "total": 11, "pages": 2}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let page = client
        .tour_reviews("t1", &PageQuery::new(2, 10))
        .await
        .unwrap();

    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].rating, 5);
    assert_eq!(page.pagination.unwrap().pages, 2);
}

#[tokio::test]
async fn create_review_posts_booking_target_and_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/reviews"))
        .and(body_json(json!({
            "bookingId": "b1",
            "reviewType": "agency",
            "rating": 4,
            "reviewText": "Well organised"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "review": {"_id": "r9", "rating": 4, "reviewText": "Well organised"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let review = client
        .create_review(&CreateReviewRequest {
            booking_id: "b1".to_string(),
            review_type: ReviewType::Agency,
            rating: 4,
            review_text: "Well organised".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(review.unwrap().id, "r9");
}
