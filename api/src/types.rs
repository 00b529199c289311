//! Wire types for the Ghumly backend API.
//!
//! The backend speaks Mongo-flavored JSON: documents carry an `_id` key and
//! camelCase field names, references may arrive either as a bare id string or
//! as a populated sub-document, and most fields are optional in practice.
//! Serde attributes do the mapping so the rest of the workspace works with
//! plain Rust names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authenticated user profile
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    /// Backend document id
    #[serde(rename = "_id")]
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Email address (login identifier)
    #[serde(default)]
    pub email: String,
    /// Indian mobile number, when provided
    #[serde(default)]
    pub phone: Option<String>,
}

/// Tour price with its pricing basis
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TourPrice {
    /// Amount in rupees (major units)
    pub amount: f64,
    /// Pricing basis
    #[serde(rename = "type", default)]
    pub kind: PriceType,
}

/// Pricing basis for a tour
#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PriceType {
    /// Price applies per traveler
    #[default]
    PerPerson,
    /// Price applies to the whole group
    PerGroup,
    /// Unrecognized pricing basis
    Other,
}

// Unknown pricing strings must not reject the whole tour document.
impl<'de> Deserialize<'de> for PriceType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(match value.as_str() {
            "per_person" => Self::PerPerson,
            "per_group" => Self::PerGroup,
            _ => Self::Other,
        })
    }
}

/// A tour package offered by a partner agency
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TourPackage {
    /// Backend document id
    #[serde(rename = "_id")]
    pub id: String,
    /// Tour title
    #[serde(default)]
    pub title: String,
    /// Price, absent for contact-for-price tours
    #[serde(default)]
    pub price: Option<TourPrice>,
    /// Smallest bookable group
    #[serde(default = "default_min_group_size")]
    pub min_group_size: u32,
    /// Largest bookable group
    #[serde(default = "default_max_group_size")]
    pub max_group_size: u32,
    /// Operating agency, populated or as a bare id
    #[serde(default)]
    pub agency: Option<AgencyRef>,
    /// Destination region, populated or as a bare id
    #[serde(default)]
    pub region: Option<RegionRef>,
    /// City the tour departs from
    #[serde(default)]
    pub departure_city: Option<String>,
    /// Scheduled departure, for fixed-date tours
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    /// Duration in days
    #[serde(default)]
    pub days: Option<u32>,
    /// Duration in nights
    #[serde(default)]
    pub nights: Option<u32>,
    /// Theme tag (religious, adventure, ...)
    #[serde(default)]
    pub tour_theme: Option<String>,
    /// Whether the backend marks this tour as featured
    #[serde(default)]
    pub is_featured: bool,
}

const fn default_min_group_size() -> u32 {
    1
}

const fn default_max_group_size() -> u32 {
    20
}

/// Agency reference as the backend returns it inside other documents
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AgencyRef {
    /// Bare document id (relation not populated)
    Id(String),
    /// Populated agency document
    Populated(Box<Agency>),
}

impl AgencyRef {
    /// The referenced agency id, regardless of population
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Populated(agency) => &agency.id,
        }
    }

    /// The populated agency document, when present
    #[must_use]
    pub fn populated(&self) -> Option<&Agency> {
        match self {
            Self::Id(_) => None,
            Self::Populated(agency) => Some(agency),
        }
    }
}

/// Region reference as the backend returns it inside other documents
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RegionRef {
    /// Bare document id (relation not populated)
    Id(String),
    /// Populated region document
    Populated(Box<DestinationRegion>),
}

impl RegionRef {
    /// The referenced region id, regardless of population
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Populated(region) => &region.id,
        }
    }
}

/// A partner travel agency
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Agency {
    /// Backend document id
    #[serde(rename = "_id")]
    pub id: String,
    /// Agency name
    #[serde(default)]
    pub name: String,
    /// Short description
    #[serde(default)]
    pub description: Option<String>,
    /// City the agency operates from
    #[serde(default)]
    pub city_location: Option<String>,
    /// Whether the marketplace has verified this agency
    #[serde(default)]
    pub is_verified: bool,
    /// Whether the agency is featured on the marketplace
    #[serde(default)]
    pub is_featured: bool,
    /// Tour themes the agency offers
    #[serde(default)]
    pub tour_types: Vec<String>,
    /// Average review rating, absent for unreviewed agencies
    #[serde(default)]
    pub average_rating: Option<f64>,
    /// Total review count
    #[serde(default)]
    pub total_reviews: u64,
}

/// A destination region (e.g. Ladakh, Kerala)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DestinationRegion {
    /// Backend document id
    #[serde(rename = "_id")]
    pub id: String,
    /// Region name
    #[serde(default)]
    pub name: String,
    /// Short description
    #[serde(default)]
    pub description: Option<String>,
}

/// A destination category (e.g. beaches, mountains)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DestinationCategory {
    /// Backend document id
    #[serde(rename = "_id")]
    pub id: String,
    /// Category name
    #[serde(default)]
    pub name: String,
    /// Short description
    #[serde(default)]
    pub description: Option<String>,
}

/// Booking lifecycle status, owned by the backend
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Created, payment not yet verified
    #[default]
    Pending,
    /// Payment verified
    Confirmed,
    /// Cancelled or expired
    Cancelled,
}

/// A booking held by the current user
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Backend document id
    #[serde(rename = "_id")]
    pub id: String,
    /// Booked tour, populated by the backend for booking lists
    #[serde(default)]
    pub tour_package: Option<TourPackage>,
    /// Party size
    #[serde(default = "default_travelers")]
    pub number_of_travelers: u32,
    /// Lifecycle status
    #[serde(default)]
    pub status: BookingStatus,
    /// Total amount in rupees
    #[serde(default)]
    pub total_amount: Option<f64>,
    /// Scheduled travel date
    #[serde(default)]
    pub booking_date: Option<DateTime<Utc>>,
    /// When the booking was created
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

const fn default_travelers() -> u32 {
    1
}

/// Payment-order handle produced by booking creation and consumed by the
/// payment widget. Ephemeral: lives only for the active checkout attempt.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentOrder {
    /// Booking the order pays for
    pub booking_id: String,
    /// Gateway-issued order id
    pub gateway_order_id: String,
    /// Gateway key id the widget authenticates with
    pub gateway_key_id: String,
    /// Amount in minor currency units (paise)
    pub amount_minor_units: u64,
}

/// Review author as embedded in review documents
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviewAuthor {
    /// Backend document id
    #[serde(rename = "_id")]
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
}

/// A published review for a tour or an agency
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Backend document id
    #[serde(rename = "_id")]
    pub id: String,
    /// Booking this review is attached to
    #[serde(default)]
    pub booking: Option<String>,
    /// Review author
    #[serde(default)]
    pub user: Option<ReviewAuthor>,
    /// Star rating, 1 to 5
    pub rating: u8,
    /// Free-text review body
    #[serde(default)]
    pub review_text: Option<String>,
    /// When the review was created
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// When the review was last edited
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Per-booking review permissions reported by the backend
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCheck {
    /// Whether this booking qualifies for reviewing at all
    #[serde(default)]
    pub can_review: bool,
    /// Whether the booking's tour has already been reviewed
    #[serde(default)]
    pub has_reviewed_tour: bool,
    /// Whether the booking's agency has already been reviewed
    #[serde(default)]
    pub has_reviewed_agency: bool,
}

/// Pagination block attached to list responses
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    /// Current page, 1-indexed
    #[serde(default)]
    pub page: u32,
    /// Page size
    #[serde(default)]
    pub limit: u32,
    /// Total matching documents
    #[serde(default)]
    pub total: u64,
    /// Total pages
    #[serde(default)]
    pub pages: u32,
}

/// Standard list envelope: `{success?, data, pagination?}`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Paginated<T> {
    /// Business-level success flag, when the endpoint sends one
    #[serde(default)]
    pub success: Option<bool>,
    /// The page of documents
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    /// Pagination block, when the endpoint sends one
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Detail endpoints answer either `{data: ...}` or the bare document.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Enveloped<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Enveloped<T> {
    pub(crate) fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } => data,
            Self::Bare(inner) => inner,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;

    #[test]
    fn test_user_profile_maps_mongo_id() {
        let json = r#"{"_id":"u1","name":"Asha","email":"asha@example.com","phone":"9876543210"}"#;
        let user: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.phone.as_deref(), Some("9876543210"));
    }

    #[test]
    fn test_tour_package_group_size_defaults() {
        let json = r#"{"_id":"t1","title":"Ladakh Circuit"}"#;
        let tour: TourPackage = serde_json::from_str(json).unwrap();
        assert_eq!(tour.min_group_size, 1);
        assert_eq!(tour.max_group_size, 20);
        assert!(tour.price.is_none());
    }

    #[test]
    fn test_tour_package_camel_case_fields() {
        let json = r#"{
            "_id": "t1",
            "title": "Ladakh Circuit",
            "minGroupSize": 2,
            "maxGroupSize": 12,
            "departureCity": "Delhi",
            "tourTheme": "adventure",
            "isFeatured": true,
            "price": {"amount": 24999, "type": "per_person"}
        }"#;
        let tour: TourPackage = serde_json::from_str(json).unwrap();
        assert_eq!(tour.min_group_size, 2);
        assert_eq!(tour.max_group_size, 12);
        assert_eq!(tour.departure_city.as_deref(), Some("Delhi"));
        assert!(tour.is_featured);
        assert_eq!(tour.price.unwrap().kind, PriceType::PerPerson);
    }

    #[test]
    fn test_agency_ref_accepts_bare_id() {
        let json = r#"{"_id":"t1","title":"Goa Escape","agency":"a42"}"#;
        let tour: TourPackage = serde_json::from_str(json).unwrap();
        assert_eq!(tour.agency.unwrap().id(), "a42");
    }

    #[test]
    fn test_agency_ref_accepts_populated_document() {
        let json = r#"{"_id":"t1","title":"Goa Escape","agency":{"_id":"a42","name":"Sunrise Travels","isVerified":true}}"#;
        let tour: TourPackage = serde_json::from_str(json).unwrap();
        let agency_ref = tour.agency.unwrap();
        assert_eq!(agency_ref.id(), "a42");
        assert_eq!(agency_ref.populated().unwrap().name, "Sunrise Travels");
    }

    #[test]
    fn test_booking_status_defaults_to_pending() {
        let json = r#"{"_id":"b1"}"#;
        let booking: Booking = serde_json::from_str(json).unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.number_of_travelers, 1);
    }

    #[test]
    fn test_booking_status_parses_lowercase() {
        let json = r#"{"_id":"b1","status":"confirmed","numberOfTravelers":4}"#;
        let booking: Booking = serde_json::from_str(json).unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.number_of_travelers, 4);
    }

    #[test]
    fn test_price_type_tolerates_unknown_values() {
        let json = r#"{"amount": 5000, "type": "per_couple"}"#;
        let price: TourPrice = serde_json::from_str(json).unwrap();
        assert_eq!(price.kind, PriceType::Other);
    }

    #[test]
    fn test_review_check_defaults_to_false() {
        let check: ReviewCheck = serde_json::from_str("{}").unwrap();
        assert!(!check.can_review);
        assert!(!check.has_reviewed_tour);
        assert!(!check.has_reviewed_agency);
    }

    #[test]
    fn test_paginated_envelope() {
        let json = r#"{"success":true,"data":[{"_id":"r1","rating":5}],"pagination":{"page":1,"limit":10,"total":1,"pages":1}}"#;
        let page: Paginated<Review> = serde_json::from_str(json).unwrap();
        assert_eq!(page.success, Some(true));
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.pagination.unwrap().pages, 1);
    }

    #[test]
    fn test_enveloped_unwraps_both_shapes() {
        let wrapped: Enveloped<Review> =
            serde_json::from_str(r#"{"data":{"_id":"r1","rating":4}}"#).unwrap();
        assert_eq!(wrapped.into_inner().id, "r1");

        let bare: Enveloped<Review> = serde_json::from_str(r#"{"_id":"r2","rating":3}"#).unwrap();
        assert_eq!(bare.into_inner().id, "r2");
    }
}
