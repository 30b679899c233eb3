//! Webhook publisher for `cityCreated` events.
//!
//! Events are POSTed as JSON to the configured sink. Any 2xx reply counts as
//! delivered; the sink (usually this service's own `/events/city-created`)
//! answers 5xx to ask for redelivery.

use async_trait::async_trait;
use tracing::debug;

use crate::domain::CityCreatedEvent;
use crate::domain::ports::{CityEventPublishError, CityEventPublisher, RemoteCallError};
use crate::outbound::rpc::JsonRpcTransport;

/// Path on the sink that receives `cityCreated` events.
pub const CITY_CREATED_PATH: &str = "events/city-created";

#[derive(Clone)]
pub struct HttpCityEventPublisher {
    transport: JsonRpcTransport,
}

impl HttpCityEventPublisher {
    pub fn new(transport: JsonRpcTransport) -> Self {
        Self { transport }
    }
}

fn map_remote_error(error: RemoteCallError) -> CityEventPublishError {
    match error {
        RemoteCallError::Remote { message } => CityEventPublishError::rejected(message),
        other => CityEventPublishError::transport(other.to_string()),
    }
}

#[async_trait]
impl CityEventPublisher for HttpCityEventPublisher {
    async fn publish_city_created(
        &self,
        event: &CityCreatedEvent,
    ) -> Result<(), CityEventPublishError> {
        let url = self
            .transport
            .url(CITY_CREATED_PATH)
            .map_err(map_remote_error)?;
        self.transport
            .send(self.transport.post_json(url, event))
            .await
            .map_err(map_remote_error)?;
        debug!(event_id = %event.event_id, city_id = %event.city_id, "published cityCreated");
        Ok(())
    }
}
