//! Booking and payment endpoints.
//!
//! `create_booking` reserves a booking and opens a payment order with the
//! gateway in one call; `verify_payment` closes the loop after the widget
//! reports success. Both are mutations and are never retried; the client
//! idempotency key lets the backend collapse accidental duplicates.

use crate::{
    client::ApiClient,
    error::ApiError,
    types::{Booking, PaymentOrder},
};
use reqwest::Method;
use serde::{Deserialize, Serialize};

/// Header carrying the client-generated idempotency key on booking creation
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Booking creation request body
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateBookingRequest {
    /// Tour to book
    #[serde(rename = "tourPackageId")]
    pub tour_package_id: String,
    /// Party size
    #[serde(rename = "numberOfTravelers")]
    pub number_of_travelers: u32,
}

#[derive(Deserialize)]
struct CreateBookingResponse {
    #[serde(default)]
    success: bool,
    #[serde(default, rename = "bookingId")]
    booking_id: Option<String>,
    #[serde(default, rename = "razorpayOrderId")]
    razorpay_order_id: Option<String>,
    #[serde(default, rename = "razorpayKeyId")]
    razorpay_key_id: Option<String>,
    /// Amount in rupees (major units)
    #[serde(default)]
    amount: Option<f64>,
    #[serde(default)]
    message: Option<String>,
}

/// Payment verification request body.
///
/// The `razorpay_*` fields come from the widget callback verbatim; only the
/// booking id is camelCase on this endpoint.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifyPaymentRequest {
    /// Gateway order id the payment was taken against
    pub razorpay_order_id: String,
    /// Gateway-issued payment id
    pub razorpay_payment_id: String,
    /// Gateway signature over order and payment ids
    pub razorpay_signature: String,
    /// Booking the payment confirms
    #[serde(rename = "bookingId")]
    pub booking_id: String,
}

#[derive(Deserialize)]
struct VerifyPaymentResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BookingListResponse {
    Keyed {
        bookings: Vec<Booking>,
    },
    Wrapped {
        data: Vec<Booking>,
    },
    Bare(Vec<Booking>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BookingDetailResponse {
    Keyed { booking: Booking },
    Wrapped { data: Booking },
    Bare(Booking),
}

impl ApiClient {
    /// `POST /bookings` - reserve a booking and open a payment order.
    ///
    /// Not retried. The idempotency key is generated once per checkout
    /// attempt by the caller and sent as the [`IDEMPOTENCY_KEY_HEADER`]
    /// header.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Business`] with the server message when the
    /// backend answers `success: false`, or a transport/HTTP error otherwise.
    pub async fn create_booking(
        &self,
        tour_package_id: &str,
        number_of_travelers: u32,
        idempotency_key: &str,
    ) -> Result<PaymentOrder, ApiError> {
        let request = CreateBookingRequest {
            tour_package_id: tour_package_id.to_string(),
            number_of_travelers,
        };
        let builder = self
            .request(Method::POST, "/bookings")
            .header(IDEMPOTENCY_KEY_HEADER, idempotency_key)
            .json(&request);
        let response: CreateBookingResponse = Self::execute(builder, "bookings.create").await?;

        if !response.success {
            return Err(ApiError::Business(
                response
                    .message
                    .unwrap_or_else(|| "Failed to create order".to_string()),
            ));
        }

        let (Some(booking_id), Some(order_id), Some(key_id), Some(amount)) = (
            response.booking_id,
            response.razorpay_order_id,
            response.razorpay_key_id,
            response.amount,
        ) else {
            return Err(ApiError::ResponseParse(
                "order creation succeeded without order fields".to_string(),
            ));
        };

        Ok(PaymentOrder {
            booking_id,
            gateway_order_id: order_id,
            gateway_key_id: key_id,
            amount_minor_units: to_minor_units(amount),
        })
    }

    /// `POST /bookings/verify-payment` - confirm a payment after the widget
    /// succeeds. Not retried.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Business`] with the server message when
    /// verification is rejected, or a transport/HTTP error otherwise.
    pub async fn verify_payment(&self, request: &VerifyPaymentRequest) -> Result<(), ApiError> {
        let response: VerifyPaymentResponse = self
            .post("/bookings/verify-payment", request, "bookings.verify")
            .await?;

        if response.success {
            Ok(())
        } else {
            Err(ApiError::Business(
                response
                    .message
                    .unwrap_or_else(|| "Payment verification failed".to_string()),
            ))
        }
    }

    /// `GET /bookings/my-bookings` - the caller's bookings.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after exhausting read retries.
    pub async fn my_bookings(&self) -> Result<Vec<Booking>, ApiError> {
        let response: BookingListResponse =
            self.get("/bookings/my-bookings", "bookings.mine").await?;
        Ok(match response {
            BookingListResponse::Keyed { bookings } => bookings,
            BookingListResponse::Wrapped { data } => data,
            BookingListResponse::Bare(bookings) => bookings,
        })
    }

    /// `GET /bookings/:id`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after exhausting read retries.
    pub async fn get_booking(&self, id: &str) -> Result<Booking, ApiError> {
        let path = format!("/bookings/{id}");
        let response: BookingDetailResponse = self.get(&path, "bookings.detail").await?;
        Ok(match response {
            BookingDetailResponse::Keyed { booking } => booking,
            BookingDetailResponse::Wrapped { data } => data,
            BookingDetailResponse::Bare(booking) => booking,
        })
    }
}

/// Convert a rupee amount to paise, as the payment widget expects.
fn to_minor_units(amount: f64) -> u64 {
    // Note: Casts acceptable here; gateway amounts are small positive numbers
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let minor = (amount * 100.0).round().max(0.0) as u64;
    minor
}
