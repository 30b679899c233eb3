//! Table-driven geocoder double.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::GeoPoint;
use crate::domain::ports::{
    AddressComponent, GeocodeMatch, Geocoder, GeocoderError, PlaceDetails, PlacePhoto,
};

type PointKey = (u64, u64);

fn point_key(point: GeoPoint) -> PointKey {
    (point.longitude.to_bits(), point.latitude.to_bits())
}

/// Build one address component.
pub fn component(long_name: &str, short_name: &str, types: &[&str]) -> AddressComponent {
    AddressComponent {
        long_name: long_name.to_owned(),
        short_name: short_name.to_owned(),
        types: types.iter().map(|t| (*t).to_owned()).collect(),
    }
}

/// Components for a locality inside a country, as the provider returns them.
pub fn locality_address(city: &str, country_long: &str, country_short: &str) -> Vec<AddressComponent> {
    vec![
        component(city, city, &["locality", "political"]),
        component(country_long, country_short, &["country", "political"]),
    ]
}

/// Geocoder answering from preloaded tables; unknown inputs return `None`.
#[derive(Default)]
pub struct StaticGeocoder {
    reverse: Mutex<HashMap<PointKey, Result<Vec<AddressComponent>, GeocoderError>>>,
    places: Mutex<HashMap<String, Result<GeocodeMatch, GeocoderError>>>,
    details: Mutex<HashMap<String, PlaceDetails>>,
    reverse_calls: AtomicUsize,
    forward_calls: AtomicUsize,
}

impl StaticGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reverse(self, point: GeoPoint, components: Vec<AddressComponent>) -> Self {
        self.insert_reverse(point, Ok(components));
        self
    }

    pub fn with_reverse_error(self, point: GeoPoint, error: GeocoderError) -> Self {
        self.insert_reverse(point, Err(error));
        self
    }

    /// Map `text` to a place id.
    pub fn with_place(self, text: &str, place_id: &str) -> Self {
        match self.places.lock() {
            Ok(mut places) => {
                places.insert(
                    text.to_owned(),
                    Ok(GeocodeMatch {
                        place_id: place_id.to_owned(),
                        components: Vec::new(),
                    }),
                );
            }
            Err(_) => panic!("places mutex poisoned"),
        }
        self
    }

    pub fn with_place_error(self, text: &str, error: GeocoderError) -> Self {
        match self.places.lock() {
            Ok(mut places) => {
                places.insert(text.to_owned(), Err(error));
            }
            Err(_) => panic!("places mutex poisoned"),
        }
        self
    }

    /// Attach photo references to `place_id`.
    pub fn with_photos(self, place_id: &str, references: &[&str]) -> Self {
        let photos = references
            .iter()
            .map(|r| PlacePhoto {
                reference: (*r).to_owned(),
                width: Some(1600),
                height: Some(1200),
            })
            .collect();
        match self.details.lock() {
            Ok(mut details) => {
                details.insert(place_id.to_owned(), PlaceDetails { photos });
            }
            Err(_) => panic!("details mutex poisoned"),
        }
        self
    }

    pub fn reverse_calls(&self) -> usize {
        self.reverse_calls.load(Ordering::SeqCst)
    }

    pub fn forward_calls(&self) -> usize {
        self.forward_calls.load(Ordering::SeqCst)
    }

    fn insert_reverse(&self, point: GeoPoint, answer: Result<Vec<AddressComponent>, GeocoderError>) {
        match self.reverse.lock() {
            Ok(mut reverse) => {
                reverse.insert(point_key(point), answer);
            }
            Err(_) => panic!("reverse mutex poisoned"),
        }
    }
}

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn reverse_geocode(
        &self,
        point: GeoPoint,
    ) -> Result<Option<Vec<AddressComponent>>, GeocoderError> {
        self.reverse_calls.fetch_add(1, Ordering::SeqCst);
        let reverse = match self.reverse.lock() {
            Ok(reverse) => reverse,
            Err(_) => panic!("reverse mutex poisoned"),
        };
        reverse.get(&point_key(point)).cloned().transpose()
    }

    async fn geocode(&self, text: &str) -> Result<Option<GeocodeMatch>, GeocoderError> {
        self.forward_calls.fetch_add(1, Ordering::SeqCst);
        let places = match self.places.lock() {
            Ok(places) => places,
            Err(_) => panic!("places mutex poisoned"),
        };
        places.get(text).cloned().transpose()
    }

    async fn place_details(&self, place_id: &str) -> Result<Option<PlaceDetails>, GeocoderError> {
        let details = match self.details.lock() {
            Ok(details) => details,
            Err(_) => panic!("details mutex poisoned"),
        };
        Ok(details.get(place_id).cloned())
    }

    fn photo_url(&self, photo_reference: &str, max_width: u32) -> String {
        format!("https://photos.test/{photo_reference}?maxwidth={max_width}")
    }
}
