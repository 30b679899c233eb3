//! Request/response façade over [`CityResolver`] for remote callers.
//!
//! The gateway validates wire requests, delegates to the resolver, and turns
//! every failure into the shared [`Error`] envelope so no transport-specific
//! type leaks into the domain.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::error;

use crate::domain::ports::{
    CityRepositoryError, CityResolutionClient, CityResolutionRequest, RemoteCallError,
};
use crate::domain::{City, CityId, CityResolutionError, CityResolver, Error};

/// Validating entry point for the `cityResolve` operation and its siblings.
#[derive(Clone)]
pub struct CityResolutionGateway {
    resolver: Arc<CityResolver>,
}

impl CityResolutionGateway {
    pub fn new(resolver: Arc<CityResolver>) -> Self {
        Self { resolver }
    }

    /// Validate `request` and resolve or create the city.
    ///
    /// Missing or blank `name`/`countryCode` fail with `invalid_request`
    /// without reaching the resolver.
    pub async fn resolve(&self, request: &CityResolutionRequest) -> Result<City, Error> {
        let name = required(request.name.as_deref(), "name")?;
        let country_code = required(request.country_code.as_deref(), "countryCode")?;
        self.resolver
            .resolve_or_create(name, country_code, request.location)
            .await
            .map_err(|err| map_resolution_error(err, "failed to resolve city"))
    }

    /// Fetch a city by identifier.
    pub async fn get(&self, id: &CityId) -> Result<City, Error> {
        self.resolver
            .get(id)
            .await
            .map_err(|err| map_resolution_error(err, "failed to load city"))
    }

    /// Apply a plan-count delta.
    pub async fn adjust_plan_count(&self, id: &CityId, delta: i64) -> Result<City, Error> {
        self.resolver
            .adjust_plan_count(id, delta)
            .await
            .map_err(|err| map_resolution_error(err, "failed to adjust plan count"))
    }
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, Error> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::invalid_request(format!("{field} is required"))
            .with_details(serde_json::json!({ "field": field }))),
    }
}

/// Map resolver failures onto the shared error envelope.
pub fn map_resolution_error(err: CityResolutionError, context: &str) -> Error {
    match err {
        CityResolutionError::Validation(inner) => Error::invalid_request(inner.to_string()),
        CityResolutionError::NotFound(id) => Error::not_found(format!("city {id} not found")),
        CityResolutionError::Storage(CityRepositoryError::Connection { message }) => {
            error!(%message, "{context}: city store unavailable");
            Error::service_unavailable(format!("{context}: city store unavailable"))
        }
        other => {
            error!(error = %other, "{context}");
            Error::internal(format!("{context}: {other}"))
        }
    }
}

/// [`CityResolutionClient`] that calls the gateway in-process.
///
/// Used when the backfill coordinators run inside the city service itself,
/// so no HTTP hop is needed.
#[derive(Clone)]
pub struct LocalCityResolutionClient {
    gateway: CityResolutionGateway,
}

impl LocalCityResolutionClient {
    pub fn new(gateway: CityResolutionGateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl CityResolutionClient for LocalCityResolutionClient {
    async fn resolve(
        &self,
        request: &CityResolutionRequest,
    ) -> Result<Option<City>, RemoteCallError> {
        self.gateway
            .resolve(request)
            .await
            .map(Some)
            .map_err(|err| RemoteCallError::remote(err.to_string()))
    }
}
