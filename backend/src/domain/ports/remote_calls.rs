//! Driven ports for synchronous calls into other services.
//!
//! Backfill coordination only ever reaches the city resolver and the
//! record-owning services through these traits, so the same orchestration
//! runs against HTTP clients in production and in-process doubles in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{City, CityId, GeoPoint, RecordKind, ReferenceRecord};

use super::define_port_error;

define_port_error! {
    /// Errors surfaced while calling a remote operation.
    pub enum RemoteCallError {
        /// Network transport failed before receiving a reply.
        Transport { message: String } => "remote call transport failed: {message}",
        /// The remote call exceeded its timeout.
        Timeout { message: String } => "remote call timed out: {message}",
        /// The remote side answered with an error envelope.
        Remote { message: String } => "remote call returned an error: {message}",
        /// The reply could not be decoded.
        Decode { message: String } => "remote call reply decode failed: {message}",
    }
}

/// Wire request for `cityResolve`.
///
/// Fields are optional on the wire so the gateway, not the decoder, decides
/// what a missing value means.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CityResolutionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
}

impl CityResolutionRequest {
    /// Build a request with every field present.
    pub fn new(
        name: impl Into<String>,
        country_code: impl Into<String>,
        location: Option<GeoPoint>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            country_code: Some(country_code.into()),
            location,
        }
    }
}

/// Port for the remote `cityResolve` operation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CityResolutionClient: Send + Sync {
    /// Resolve or create a city. `None` means the remote side returned no city.
    async fn resolve(
        &self,
        request: &CityResolutionRequest,
    ) -> Result<Option<City>, RemoteCallError>;
}

/// Port for the record-owning services (`fetchUnresolvedRecords`,
/// `updateRecordCity`).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReferenceRecordService: Send + Sync {
    /// Fetch one page of records of `kind` that lack a city id.
    async fn fetch_unresolved(
        &self,
        kind: RecordKind,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ReferenceRecord>, RemoteCallError>;

    /// Stamp `city_id` onto the record. Returns the remote `success` flag.
    async fn update_record_city(
        &self,
        kind: RecordKind,
        record_id: &str,
        city_id: &CityId,
    ) -> Result<bool, RemoteCallError>;
}
