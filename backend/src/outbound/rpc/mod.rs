//! HTTP clients for calls into sibling services.
//!
//! Every client forwards the active [`TraceId`](crate::domain::TraceId) in
//! the `trace-id` header and decodes the shared error envelope on non-2xx
//! replies.

mod http_city_resolution_client;
mod http_reference_record_service;
pub(crate) mod transport;

pub use http_city_resolution_client::HttpCityResolutionClient;
pub use http_reference_record_service::{HttpReferenceRecordService, RecordServiceEndpoints};
pub use transport::{JsonRpcTransport, RpcSetupError};
