//! Google Maps geocoding adapter.

mod dto;
mod http_geocoder;

pub use http_geocoder::{DEFAULT_GOOGLE_MAPS_BASE_URL, GoogleMapsGeocoder, GoogleMapsSetupError};
