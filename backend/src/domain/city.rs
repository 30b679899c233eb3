//! City data model and natural-key normalization.
//!
//! A city is identified by its store-assigned [`CityId`] but deduplicated by
//! its [`CityKey`]: the trimmed, lowercased `(name, country_code)` pair. Every
//! lookup and write goes through [`CityKey::new`] so resolution is insensitive
//! to case and surrounding whitespace.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Validation errors returned by [`CityKey::new`] and [`GeoPoint::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CityValidationError {
    EmptyName,
    EmptyCountryCode,
    CoordinatesNotFinite,
    LongitudeOutOfRange,
    LatitudeOutOfRange,
}

impl fmt::Display for CityValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "city name must not be empty"),
            Self::EmptyCountryCode => write!(f, "country code must not be empty"),
            Self::CoordinatesNotFinite => write!(f, "coordinates must be finite numbers"),
            Self::LongitudeOutOfRange => write!(f, "longitude must be within [-180, 180]"),
            Self::LatitudeOutOfRange => write!(f, "latitude must be within [-90, 90]"),
        }
    }
}

impl std::error::Error for CityValidationError {}

/// Stable city identifier assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct CityId(Uuid);

impl CityId {
    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a random identifier. Used by in-memory stores.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for CityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalized natural key of a city.
///
/// ## Invariants
/// - `name` and `country_code` are trimmed, lowercased and non-empty.
///
/// # Examples
/// ```
/// use city_service::domain::CityKey;
///
/// let a = CityKey::new("Paris", "FR").expect("valid key");
/// let b = CityKey::new(" paris ", "fr").expect("valid key");
/// assert_eq!(a, b);
/// assert_eq!(a.name(), "paris");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CityKey {
    name: String,
    country_code: String,
}

impl CityKey {
    /// Normalize and validate a natural key.
    pub fn new(
        name: impl AsRef<str>,
        country_code: impl AsRef<str>,
    ) -> Result<Self, CityValidationError> {
        let name = normalize(name.as_ref());
        if name.is_empty() {
            return Err(CityValidationError::EmptyName);
        }
        let country_code = normalize(country_code.as_ref());
        if country_code.is_empty() {
            return Err(CityValidationError::EmptyCountryCode);
        }
        Ok(Self { name, country_code })
    }

    /// Normalized city name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Normalized country code.
    pub fn country_code(&self) -> &str {
        self.country_code.as_str()
    }
}

impl fmt::Display for CityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.country_code)
    }
}

fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// WGS84 point stored alongside a city.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    /// Validate and construct a point.
    pub fn new(longitude: f64, latitude: f64) -> Result<Self, CityValidationError> {
        if !longitude.is_finite() || !latitude.is_finite() {
            return Err(CityValidationError::CoordinatesNotFinite);
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CityValidationError::LongitudeOutOfRange);
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CityValidationError::LatitudeOutOfRange);
        }
        Ok(Self {
            longitude,
            latitude,
        })
    }
}

/// Stored city row as seen by the domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub id: CityId,
    /// Normalized name.
    pub name: String,
    /// Normalized country code.
    pub country_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub plan_count: i64,
    #[serde(default)]
    pub trending_score: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl City {
    /// Whether an image URL has already been stored.
    pub fn has_image(&self) -> bool {
        self.image_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
    }
}

/// Event emitted once per successful city insert.
///
/// Delivery is at-least-once; consumers deduplicate on `event_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CityCreatedEvent {
    pub event_id: Uuid,
    pub city_id: CityId,
    pub name: String,
    pub country_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
}

impl CityCreatedEvent {
    /// Build an event for a freshly inserted city with a new event id.
    pub fn for_city(city: &City) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            city_id: city.id,
            name: city.name.clone(),
            country_code: city.country_code.clone(),
            location: city.location,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for key normalization and point validation.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Paris", "FR")]
    #[case(" paris ", "fr")]
    #[case("PARIS\t", " Fr")]
    fn keys_normalize_case_and_whitespace(#[case] name: &str, #[case] country: &str) {
        let key = CityKey::new(name, country).expect("valid key");
        assert_eq!(key.name(), "paris");
        assert_eq!(key.country_code(), "fr");
    }

    #[rstest]
    #[case("", "fr", CityValidationError::EmptyName)]
    #[case("   ", "fr", CityValidationError::EmptyName)]
    #[case("paris", "  ", CityValidationError::EmptyCountryCode)]
    fn keys_reject_blank_parts(
        #[case] name: &str,
        #[case] country: &str,
        #[case] expected: CityValidationError,
    ) {
        assert_eq!(CityKey::new(name, country), Err(expected));
    }

    #[rstest]
    #[case(f64::NAN, 0.0, CityValidationError::CoordinatesNotFinite)]
    #[case(181.0, 0.0, CityValidationError::LongitudeOutOfRange)]
    #[case(0.0, -90.5, CityValidationError::LatitudeOutOfRange)]
    fn points_reject_invalid_coordinates(
        #[case] longitude: f64,
        #[case] latitude: f64,
        #[case] expected: CityValidationError,
    ) {
        assert_eq!(GeoPoint::new(longitude, latitude), Err(expected));
    }

    #[rstest]
    fn created_events_carry_a_fresh_id_per_call() {
        let city = City {
            id: CityId::random(),
            name: "lyon".to_owned(),
            country_code: "fr".to_owned(),
            location: None,
            image_url: None,
            plan_count: 0,
            trending_score: 0.0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let first = CityCreatedEvent::for_city(&city);
        let second = CityCreatedEvent::for_city(&city);
        assert_ne!(first.event_id, second.event_id);
        assert_eq!(first.city_id, city.id);
    }
}
