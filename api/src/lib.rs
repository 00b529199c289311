//! # Ghumly API
//!
//! Typed REST client for the Ghumly backend.
//!
//! One [`ApiClient`] instance covers the whole surface: auth, catalog,
//! bookings and reviews, each in its own module as an `impl ApiClient`
//! block. The client is configured once from [`ApiConfig`] and cloned
//! freely; a bearer token is attached per instance with
//! [`ApiClient::with_token`] rather than through any ambient global.
//!
//! Request handling is split by endpoint class:
//!
//! - **Reads** (`GET`) run under the configured [`RetryPolicy`] and are
//!   retried on transport errors, timeouts, 429 and 5xx.
//! - **Mutations** (`POST`/`PUT`/`DELETE`) execute exactly once; booking
//!   creation instead carries a client idempotency key so the backend can
//!   collapse accidental duplicates.
//!
//! ## Example
//!
//! ```ignore
//! use ghumly_api::{ApiClient, ApiConfig, TourQuery};
//!
//! async fn example() -> Result<(), ghumly_api::ApiError> {
//!     let client = ApiClient::new(ApiConfig::from_env()?)?;
//!     let tours = client.list_tour_packages(&TourQuery::default()).await?;
//!     println!("{} tours on page 1", tours.data.len());
//!     Ok(())
//! }
//! ```
//!
//! [`RetryPolicy`]: ghumly_runtime::retry::RetryPolicy

pub mod auth;
pub mod bookings;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod reviews;
pub mod types;

pub use auth::{AuthResponse, VerifyOtpRequest};
pub use bookings::{CreateBookingRequest, VerifyPaymentRequest, IDEMPOTENCY_KEY_HEADER};
pub use catalog::{PageQuery, TourQuery};
pub use client::ApiClient;
pub use config::{ApiConfig, ConfigError, Environment};
pub use error::ApiError;
pub use reviews::{CreateReviewRequest, ReviewType, UpdateReviewRequest};
pub use types::{
    Agency, AgencyRef, Booking, BookingStatus, DestinationCategory, DestinationRegion, Paginated,
    Pagination, PaymentOrder, PriceType, RegionRef, Review, ReviewAuthor, ReviewCheck, TourPackage,
    TourPrice, UserProfile,
};
