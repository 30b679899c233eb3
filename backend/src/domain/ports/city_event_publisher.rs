//! Driven port for emitting `cityCreated` events.
//!
//! Publishing is a best-effort side channel: callers log failures and move
//! on. Nothing here retries.

use async_trait::async_trait;
use tracing::debug;

use crate::domain::CityCreatedEvent;

use super::define_port_error;

define_port_error! {
    /// Errors surfaced while publishing city events.
    pub enum CityEventPublishError {
        /// The transport could not deliver the event.
        Transport { message: String } => "city event transport failed: {message}",
        /// The receiving side refused the event.
        Rejected { message: String } => "city event rejected: {message}",
    }
}

/// Port for publishing city lifecycle events.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CityEventPublisher: Send + Sync {
    /// Publish one `cityCreated` event.
    async fn publish_city_created(
        &self,
        event: &CityCreatedEvent,
    ) -> Result<(), CityEventPublishError>;
}

/// Publisher used when no event sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCityEventPublisher;

#[async_trait]
impl CityEventPublisher for NoOpCityEventPublisher {
    async fn publish_city_created(
        &self,
        event: &CityCreatedEvent,
    ) -> Result<(), CityEventPublishError> {
        debug!(event_id = %event.event_id, city_id = %event.city_id, "no event sink configured; dropping city event");
        Ok(())
    }
}
