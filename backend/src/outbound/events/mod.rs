//! Event sink adapters.

mod http_city_event_publisher;

pub use http_city_event_publisher::HttpCityEventPublisher;
