//! Public catalog endpoints: tours, agencies, destination regions and
//! categories. All reads, all unauthenticated.

use crate::{
    client::ApiClient,
    error::ApiError,
    types::{Agency, DestinationCategory, DestinationRegion, Enveloped, Paginated, TourPackage},
};
use chrono::NaiveDate;
use serde::Serialize;

/// Tour listing filters, serialized as query parameters.
///
/// Every filter is optional; `limit` and `page` always go out so the backend
/// paginates deterministically.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TourQuery {
    /// Free-text search
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Filter by agency id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agency: Option<String>,
    /// Filter by destination region id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Filter by destination category id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Only featured tours
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    /// Filter by tour status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Minimum price in rupees
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<u64>,
    /// Maximum price in rupees
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<u64>,
    /// Minimum duration in days
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_days: Option<u32>,
    /// Maximum duration in days
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_days: Option<u32>,
    /// Earliest departure date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_from: Option<NaiveDate>,
    /// Latest departure date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_to: Option<NaiveDate>,
    /// Filter by departure city
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure_city: Option<String>,
    /// Travel window start
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// Travel window end
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Filter by theme tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tour_theme: Option<String>,
    /// Page size
    pub limit: u32,
    /// Page number, 1-indexed
    pub page: u32,
}

impl Default for TourQuery {
    fn default() -> Self {
        Self {
            search: None,
            agency: None,
            region: None,
            category: None,
            featured: None,
            status: None,
            min_price: None,
            max_price: None,
            min_days: None,
            max_days: None,
            start_from: None,
            start_to: None,
            departure_city: None,
            start_date: None,
            end_date: None,
            tour_theme: None,
            limit: 12,
            page: 1,
        }
    }
}

/// Plain pagination query for agency and destination listings
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct PageQuery {
    /// Page number, 1-indexed
    pub page: u32,
    /// Page size
    pub limit: u32,
}

impl PageQuery {
    /// Create a pagination query.
    #[must_use]
    pub const fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        Self { page: 1, limit: 12 }
    }
}

impl ApiClient {
    /// `GET /tour-packages`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after exhausting read retries.
    pub async fn list_tour_packages(
        &self,
        query: &TourQuery,
    ) -> Result<Paginated<TourPackage>, ApiError> {
        self.get_with_query("/tour-packages", Some(query), "catalog.tours")
            .await
    }

    /// `GET /tour-packages/:id`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after exhausting read retries.
    pub async fn get_tour_package(&self, id: &str) -> Result<TourPackage, ApiError> {
        let path = format!("/tour-packages/{id}");
        let tour: Enveloped<TourPackage> = self.get(&path, "catalog.tour_detail").await?;
        Ok(tour.into_inner())
    }

    /// `GET /agencies`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after exhausting read retries.
    pub async fn list_agencies(&self, query: &PageQuery) -> Result<Paginated<Agency>, ApiError> {
        self.get_with_query("/agencies", Some(query), "catalog.agencies")
            .await
    }

    /// `GET /agencies/:id`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after exhausting read retries.
    pub async fn get_agency(&self, id: &str) -> Result<Agency, ApiError> {
        let path = format!("/agencies/{id}");
        let agency: Enveloped<Agency> = self.get(&path, "catalog.agency_detail").await?;
        Ok(agency.into_inner())
    }

    /// `GET /destination-regions`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after exhausting read retries.
    pub async fn list_destination_regions(
        &self,
        query: &PageQuery,
    ) -> Result<Paginated<DestinationRegion>, ApiError> {
        self.get_with_query("/destination-regions", Some(query), "catalog.regions")
            .await
    }

    /// `GET /destination-categories`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after exhausting read retries.
    pub async fn list_destination_categories(
        &self,
        query: &PageQuery,
    ) -> Result<Paginated<DestinationCategory>, ApiError> {
        self.get_with_query("/destination-categories", Some(query), "catalog.categories")
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;

    #[test]
    fn test_tour_query_defaults() {
        let query = TourQuery::default();
        assert_eq!(query.limit, 12);
        assert_eq!(query.page, 1);
        assert!(query.search.is_none());
    }

    #[test]
    fn test_tour_query_skips_absent_filters() {
        let query = TourQuery::default();
        let encoded = serde_urlencoded_for_tests(&query);
        assert_eq!(encoded, "limit=12&page=1");
    }

    #[test]
    fn test_tour_query_serializes_camel_case() {
        let query = TourQuery {
            min_price: Some(5000),
            departure_city: Some("Delhi".to_string()),
            tour_theme: Some("religious".to_string()),
            featured: Some(true),
            ..TourQuery::default()
        };
        let encoded = serde_urlencoded_for_tests(&query);
        assert!(encoded.contains("minPrice=5000"));
        assert!(encoded.contains("departureCity=Delhi"));
        assert!(encoded.contains("tourTheme=religious"));
        assert!(encoded.contains("featured=true"));
    }

    // reqwest encodes `.query(...)` with serde_urlencoded; serde_json's
    // string form is close enough to assert key naming and skipping.
    fn serde_urlencoded_for_tests(query: &TourQuery) -> String {
        let value = serde_json::to_value(query).unwrap();
        let map = value.as_object().unwrap();
        map.iter()
            .map(|(k, v)| {
                let v = match v {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                format!("{k}={v}")
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}
