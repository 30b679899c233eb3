//! Reqwest-backed Google Maps geocoder adapter.
//!
//! Owns transport details only: query construction, timeout and HTTP error
//! mapping, and JSON decoding into domain address shapes. The API key is
//! stripped from every error message before it can reach a log line, and it
//! is never written into photo URLs, which are persisted and served to
//! clients. Whoever fetches the photo appends its own credentials.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

use super::dto::{GeocodeResponseDto, PlaceDetailsResponseDto};
use crate::domain::GeoPoint;
use crate::domain::ports::{AddressComponent, GeocodeMatch, Geocoder, GeocoderError, PlaceDetails};

/// Public Google Maps API root.
pub const DEFAULT_GOOGLE_MAPS_BASE_URL: &str = "https://maps.googleapis.com/maps/api/";

/// Geocoder adapter calling the Geocoding and Place Details endpoints.
pub struct GoogleMapsGeocoder {
    client: Client,
    geocode_endpoint: Url,
    details_endpoint: Url,
    photo_endpoint: Url,
    api_key: String,
}

impl GoogleMapsGeocoder {
    /// Build an adapter against `base_url` with a per-request timeout.
    /// ```rust,ignore
    /// let base = Url::parse(DEFAULT_GOOGLE_MAPS_BASE_URL)?;
    /// let geocoder = GoogleMapsGeocoder::new(base, api_key, Duration::from_secs(10))?;
    /// ```
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed or the
    /// base URL cannot be extended with the endpoint paths.
    pub fn new(
        base_url: Url,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GoogleMapsSetupError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base = ensure_trailing_slash(base_url);
        Ok(Self {
            client,
            geocode_endpoint: endpoint(&base, "geocode/json")?,
            details_endpoint: endpoint(&base, "place/details/json")?,
            photo_endpoint: endpoint(&base, "place/photo")?,
            api_key: api_key.into(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &Url,
        params: &[(&str, &str)],
    ) -> Result<T, GeocoderError> {
        let response = self
            .client
            .get(endpoint.clone())
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        serde_json::from_slice(body.as_ref()).map_err(|error| {
            GeocoderError::decode(format!("invalid Google Maps JSON payload: {error}"))
        })
    }
}

/// Construction failures for [`GoogleMapsGeocoder`].
#[derive(Debug, thiserror::Error)]
pub enum GoogleMapsSetupError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("invalid Google Maps base URL: {message}")]
    Url { message: String },
}

fn endpoint(base: &Url, path: &str) -> Result<Url, GoogleMapsSetupError> {
    base.join(path).map_err(|err| GoogleMapsSetupError::Url {
        message: err.to_string(),
    })
}

fn ensure_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[async_trait]
impl Geocoder for GoogleMapsGeocoder {
    async fn reverse_geocode(
        &self,
        point: GeoPoint,
    ) -> Result<Option<Vec<AddressComponent>>, GeocoderError> {
        let latlng = format!("{},{}", point.latitude, point.longitude);
        let response: GeocodeResponseDto = self
            .get_json(&self.geocode_endpoint, &[("latlng", latlng.as_str())])
            .await?;
        Ok(response
            .into_first_match()?
            .map(|found| found.components)
            .filter(|components| !components.is_empty()))
    }

    async fn geocode(&self, text: &str) -> Result<Option<GeocodeMatch>, GeocoderError> {
        let response: GeocodeResponseDto = self
            .get_json(&self.geocode_endpoint, &[("address", text)])
            .await?;
        response.into_first_match()
    }

    async fn place_details(&self, place_id: &str) -> Result<Option<PlaceDetails>, GeocoderError> {
        let response: PlaceDetailsResponseDto = self
            .get_json(
                &self.details_endpoint,
                &[("place_id", place_id), ("fields", "photos")],
            )
            .await?;
        response.into_details()
    }

    fn photo_url(&self, photo_reference: &str, max_width: u32) -> String {
        let mut url = self.photo_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("maxwidth", &max_width.to_string())
            .append_pair("photo_reference", photo_reference);
        url.to_string()
    }
}

fn map_transport_error(error: reqwest::Error) -> GeocoderError {
    let error = error.without_url();
    if error.is_timeout() {
        GeocoderError::timeout(error.to_string())
    } else {
        GeocoderError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> GeocoderError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::TOO_MANY_REQUESTS => GeocoderError::rate_limited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            GeocoderError::timeout(message)
        }
        _ if status.is_client_error() => GeocoderError::rejected(message),
        _ => GeocoderError::transport(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
