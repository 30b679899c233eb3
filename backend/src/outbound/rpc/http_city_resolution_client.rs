//! `CityResolutionClient` calling `POST /rpc/cities/resolve`.

use async_trait::async_trait;

use crate::domain::City;
use crate::domain::ports::{CityResolutionClient, CityResolutionRequest, RemoteCallError};

use super::transport::JsonRpcTransport;

const RESOLVE_PATH: &str = "rpc/cities/resolve";

/// HTTP client for a remote city resolution gateway.
#[derive(Clone)]
pub struct HttpCityResolutionClient {
    transport: JsonRpcTransport,
}

impl HttpCityResolutionClient {
    pub fn new(transport: JsonRpcTransport) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl CityResolutionClient for HttpCityResolutionClient {
    async fn resolve(
        &self,
        request: &CityResolutionRequest,
    ) -> Result<Option<City>, RemoteCallError> {
        let url = self.transport.url(RESOLVE_PATH)?;
        // A `null` body decodes to `None`.
        self.transport
            .call(self.transport.post_json(url, request))
            .await
    }
}
