//! Records owned by other services that optionally point at a city.
//!
//! Venues and events share one shape as far as city resolution is concerned:
//! an identifier, an optional city reference, and an optional GeoJSON-style
//! location sub-object.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{CityId, GeoPoint};

/// Collection a reference record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Venues,
    Events,
}

impl RecordKind {
    /// Path segment and log label for the collection.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Venues => "venues",
            Self::Events => "events",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown record kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown record kind: {0}")]
pub struct UnknownRecordKind(pub String);

impl FromStr for RecordKind {
    type Err = UnknownRecordKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "venues" => Ok(Self::Venues),
            "events" => Ok(Self::Events),
            other => Err(UnknownRecordKind(other.to_owned())),
        }
    }
}

/// Raw location sub-object as stored by the owning service.
///
/// Nothing about the shape is trusted; [`RecordLocation::point`] decides
/// whether it is usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecordLocation {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Vec<f64>>,
}

impl RecordLocation {
    /// Build a well-formed `Point` location from `[lon, lat]`.
    pub fn point(longitude: f64, latitude: f64) -> Self {
        Self {
            kind: Some("Point".to_owned()),
            coordinates: Some(vec![longitude, latitude]),
        }
    }

    /// Return the coordinate pair when the sub-object is a valid `Point`.
    ///
    /// # Examples
    /// ```
    /// use city_service::domain::RecordLocation;
    ///
    /// assert!(RecordLocation::point(-74.0, 40.7).as_point().is_some());
    /// let bad = RecordLocation { kind: Some("Polygon".into()), coordinates: Some(vec![1.0, 2.0]) };
    /// assert!(bad.as_point().is_none());
    /// ```
    pub fn as_point(&self) -> Option<GeoPoint> {
        if self.kind.as_deref() != Some("Point") {
            return None;
        }
        match self.coordinates.as_deref() {
            Some(&[longitude, latitude]) => GeoPoint::new(longitude, latitude).ok(),
            _ => None,
        }
    }
}

/// Venue or event as returned by `fetchUnresolvedRecords`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_id: Option<CityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<RecordLocation>,
}

impl ReferenceRecord {
    /// Usable coordinates for reverse geocoding, if any.
    pub fn point(&self) -> Option<GeoPoint> {
        self.location.as_ref().and_then(RecordLocation::as_point)
    }
}

#[cfg(test)]
mod tests {
    //! Coverage for location shape checks.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::missing_tag(json!({ "coordinates": [-74.0, 40.7] }))]
    #[case::wrong_tag(json!({ "type": "LineString", "coordinates": [-74.0, 40.7] }))]
    #[case::three_coordinates(json!({ "type": "Point", "coordinates": [-74.0, 40.7, 3.0] }))]
    #[case::one_coordinate(json!({ "type": "Point", "coordinates": [-74.0] }))]
    #[case::no_coordinates(json!({ "type": "Point" }))]
    #[case::out_of_range(json!({ "type": "Point", "coordinates": [-274.0, 40.7] }))]
    fn malformed_locations_are_not_usable(#[case] raw: serde_json::Value) {
        let location: RecordLocation = serde_json::from_value(raw).expect("decodes");
        assert!(location.as_point().is_none());
    }

    #[rstest]
    fn point_locations_decode_from_geojson() {
        let record: ReferenceRecord = serde_json::from_value(json!({
            "id": "venue-1",
            "location": { "type": "Point", "coordinates": [-74.0, 40.7] }
        }))
        .expect("decodes");

        let point = record.point().expect("usable point");
        assert_eq!(point.longitude, -74.0);
        assert_eq!(point.latitude, 40.7);
    }

    #[rstest]
    fn records_without_location_have_no_point() {
        let record = ReferenceRecord {
            id: "event-9".to_owned(),
            city_id: None,
            location: None,
        };
        assert!(record.point().is_none());
    }

    #[rstest]
    #[case("venues", RecordKind::Venues)]
    #[case("events", RecordKind::Events)]
    fn kinds_parse_from_path_segments(#[case] raw: &str, #[case] expected: RecordKind) {
        assert_eq!(raw.parse::<RecordKind>(), Ok(expected));
        assert_eq!(expected.as_str(), raw);
    }
}
