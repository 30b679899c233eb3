//! Driven port for the geocoding provider.
//!
//! The domain owns the address-component and place shapes so backfill and
//! enrichment logic stay provider-agnostic. A `None` result always means "the
//! provider answered but had nothing"; transport trouble is an error.

use async_trait::async_trait;

use crate::domain::GeoPoint;

use super::define_port_error;

/// One structured component of a geocoded address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressComponent {
    pub long_name: String,
    pub short_name: String,
    /// Provider component types, e.g. `locality` or `country`.
    pub types: Vec<String>,
}

impl AddressComponent {
    /// Whether the component carries the given type tag.
    pub fn has_type(&self, kind: &str) -> bool {
        self.types.iter().any(|t| t == kind)
    }
}

/// Forward geocoding hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodeMatch {
    pub place_id: String,
    pub components: Vec<AddressComponent>,
}

/// Photo reference attached to a place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacePhoto {
    pub reference: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Place details relevant to enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlaceDetails {
    pub photos: Vec<PlacePhoto>,
}

define_port_error! {
    /// Errors surfaced while calling the geocoding provider.
    pub enum GeocoderError {
        /// Network transport failed before receiving a response.
        Transport { message: String } => "geocoder transport failed: {message}",
        /// The provider call exceeded its timeout.
        Timeout { message: String } => "geocoder timeout: {message}",
        /// The provider refused the request due to quota.
        RateLimited { message: String } => "geocoder rate limited request: {message}",
        /// The provider rejected the request.
        Rejected { message: String } => "geocoder rejected request: {message}",
        /// The provider response could not be decoded.
        Decode { message: String } => "geocoder response decode failed: {message}",
    }
}

/// Port for reverse/forward geocoding and place photos.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Translate a coordinate pair into address components.
    async fn reverse_geocode(
        &self,
        point: GeoPoint,
    ) -> Result<Option<Vec<AddressComponent>>, GeocoderError>;

    /// Resolve free text to the best matching place.
    async fn geocode(&self, text: &str) -> Result<Option<GeocodeMatch>, GeocoderError>;

    /// Fetch place details for a place identifier.
    async fn place_details(&self, place_id: &str) -> Result<Option<PlaceDetails>, GeocoderError>;

    /// Build a photo URL for a photo reference. The result is persisted, so
    /// it must not embed credentials.
    fn photo_url(&self, photo_reference: &str, max_width: u32) -> String;
}
