//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod city_event_publisher;
mod city_repository;
mod geocoder;
mod idempotency_lock;
mod remote_calls;

#[cfg(test)]
pub use city_event_publisher::MockCityEventPublisher;
pub use city_event_publisher::{
    CityEventPublishError, CityEventPublisher, NoOpCityEventPublisher,
};
#[cfg(test)]
pub use city_repository::MockCityRepository;
pub use city_repository::{CityRepository, CityRepositoryError, NewCity};
#[cfg(test)]
pub use geocoder::MockGeocoder;
pub use geocoder::{
    AddressComponent, GeocodeMatch, Geocoder, GeocoderError, PlaceDetails, PlacePhoto,
};
#[cfg(test)]
pub use idempotency_lock::MockIdempotencyLock;
pub use idempotency_lock::{IdempotencyLock, IdempotencyLockError};
#[cfg(test)]
pub use remote_calls::{MockCityResolutionClient, MockReferenceRecordService};
pub use remote_calls::{
    CityResolutionClient, CityResolutionRequest, ReferenceRecordService, RemoteCallError,
};
