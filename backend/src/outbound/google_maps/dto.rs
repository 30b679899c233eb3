//! Wire shapes for the Google Maps Geocoding and Places APIs.

use serde::Deserialize;

use crate::domain::ports::{AddressComponent, GeocodeMatch, GeocoderError, PlaceDetails, PlacePhoto};

/// API-level status carried in every response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum ApiStatus {
    Ok,
    /// The provider answered but found nothing.
    Empty,
    Failed(GeocoderError),
}

pub(super) fn classify_status(status: &str, error_message: Option<&str>) -> ApiStatus {
    let detail = match error_message {
        Some(message) if !message.is_empty() => format!("{status}: {message}"),
        _ => status.to_owned(),
    };
    match status {
        "OK" => ApiStatus::Ok,
        "ZERO_RESULTS" | "NOT_FOUND" => ApiStatus::Empty,
        "OVER_QUERY_LIMIT" | "OVER_DAILY_LIMIT" => {
            ApiStatus::Failed(GeocoderError::rate_limited(detail))
        }
        "REQUEST_DENIED" | "INVALID_REQUEST" => ApiStatus::Failed(GeocoderError::rejected(detail)),
        _ => ApiStatus::Failed(GeocoderError::transport(detail)),
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct GeocodeResponseDto {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub results: Vec<GeocodeResultDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct GeocodeResultDto {
    pub place_id: String,
    #[serde(default)]
    pub address_components: Vec<AddressComponentDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct AddressComponentDto {
    pub long_name: String,
    pub short_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

impl From<AddressComponentDto> for AddressComponent {
    fn from(dto: AddressComponentDto) -> Self {
        Self {
            long_name: dto.long_name,
            short_name: dto.short_name,
            types: dto.types,
        }
    }
}

impl GeocodeResponseDto {
    /// First result, or `None` when the provider had no match.
    pub fn into_first_match(self) -> Result<Option<GeocodeMatch>, GeocoderError> {
        match classify_status(&self.status, self.error_message.as_deref()) {
            ApiStatus::Ok => Ok(self.results.into_iter().next().map(|result| GeocodeMatch {
                place_id: result.place_id,
                components: result
                    .address_components
                    .into_iter()
                    .map(AddressComponent::from)
                    .collect(),
            })),
            ApiStatus::Empty => Ok(None),
            ApiStatus::Failed(error) => Err(error),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct PlaceDetailsResponseDto {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub result: Option<PlaceResultDto>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct PlaceResultDto {
    #[serde(default)]
    pub photos: Vec<PhotoDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PhotoDto {
    pub photo_reference: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl PlaceDetailsResponseDto {
    pub fn into_details(self) -> Result<Option<PlaceDetails>, GeocoderError> {
        match classify_status(&self.status, self.error_message.as_deref()) {
            ApiStatus::Ok => Ok(self.result.map(|result| PlaceDetails {
                photos: result
                    .photos
                    .into_iter()
                    .map(|photo| PlacePhoto {
                        reference: photo.photo_reference,
                        width: photo.width,
                        height: photo.height,
                    })
                    .collect(),
            })),
            ApiStatus::Empty => Ok(None),
            ApiStatus::Failed(error) => Err(error),
        }
    }
}
