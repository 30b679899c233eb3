//! `ReferenceRecordService` over the record-owning services' RPC routes.
//!
//! - `GET  {base}/rpc/{kind}/unresolved?limit=&offset=` returns
//!   `{"records": [...]}`, the records lacking a city id.
//! - `POST {base}/rpc/{kind}/{id}/city` with `{"cityId": ...}` returns
//!   `{"success": bool}`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::ports::{ReferenceRecordService, RemoteCallError};
use crate::domain::{CityId, RecordKind, ReferenceRecord};

use super::transport::JsonRpcTransport;

/// One transport per record-owning service. A missing endpoint makes every
/// call for that kind fail with a transport error.
#[derive(Clone, Default)]
pub struct RecordServiceEndpoints {
    pub venues: Option<JsonRpcTransport>,
    pub events: Option<JsonRpcTransport>,
}

impl RecordServiceEndpoints {
    fn for_kind(&self, kind: RecordKind) -> Result<&JsonRpcTransport, RemoteCallError> {
        let endpoint = match kind {
            RecordKind::Venues => self.venues.as_ref(),
            RecordKind::Events => self.events.as_ref(),
        };
        endpoint.ok_or_else(|| {
            RemoteCallError::transport(format!("no {kind} service endpoint configured"))
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateCityBody<'a> {
    city_id: &'a CityId,
}

#[derive(Deserialize)]
struct UnresolvedPage {
    #[serde(default)]
    records: Vec<ReferenceRecord>,
}

#[derive(Deserialize)]
struct UpdateCityReply {
    #[serde(default)]
    success: bool,
}

/// HTTP client for venue and event services.
#[derive(Clone)]
pub struct HttpReferenceRecordService {
    endpoints: RecordServiceEndpoints,
}

impl HttpReferenceRecordService {
    pub fn new(endpoints: RecordServiceEndpoints) -> Self {
        Self { endpoints }
    }
}

#[async_trait]
impl ReferenceRecordService for HttpReferenceRecordService {
    async fn fetch_unresolved(
        &self,
        kind: RecordKind,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ReferenceRecord>, RemoteCallError> {
        let transport = self.endpoints.for_kind(kind)?;
        let url = transport.segments_url(&["rpc", kind.as_str(), "unresolved"])?;
        let request = transport
            .get(url)
            .query(&[("limit", limit), ("offset", offset)]);
        let page: UnresolvedPage = transport.call(request).await?;
        Ok(page.records)
    }

    async fn update_record_city(
        &self,
        kind: RecordKind,
        record_id: &str,
        city_id: &CityId,
    ) -> Result<bool, RemoteCallError> {
        let transport = self.endpoints.for_kind(kind)?;
        let url = transport.segments_url(&["rpc", kind.as_str(), record_id, "city"])?;
        let reply: UpdateCityReply = transport
            .call(transport.post_json(url, &UpdateCityBody { city_id }))
            .await?;
        Ok(reply.success)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use rstest::rstest;
    use serde_json::json;

    // Port 9 (discard) on loopback: a request that got as far as the
    // network would fail with a connection error, not a routing one.
    fn unreachable_endpoints() -> RecordServiceEndpoints {
        let transport = JsonRpcTransport::new("http://127.0.0.1:9/records", Duration::from_secs(1))
            .expect("transport");
        RecordServiceEndpoints {
            venues: Some(transport.clone()),
            events: Some(transport),
        }
    }

    #[rstest]
    #[case::parent(RecordKind::Venues, "..")]
    #[case::current(RecordKind::Events, ".")]
    #[case::empty(RecordKind::Events, "")]
    #[tokio::test]
    async fn dot_record_ids_are_refused_before_sending(#[case] kind: RecordKind, #[case] id: &str) {
        let service = HttpReferenceRecordService::new(unreachable_endpoints());
        let err = service
            .update_record_city(kind, id, &CityId::random())
            .await
            .expect_err("unroutable id");
        assert_eq!(
            err,
            RemoteCallError::transport(format!("path segment {id:?} cannot be routed"))
        );
    }

    #[tokio::test]
    async fn unconfigured_kinds_fail_without_network() {
        let service = HttpReferenceRecordService::new(RecordServiceEndpoints::default());
        let err = service
            .fetch_unresolved(RecordKind::Events, 100, 0)
            .await
            .expect_err("no endpoint");
        assert_eq!(
            err,
            RemoteCallError::transport("no events service endpoint configured")
        );
    }

    #[rstest]
    fn update_body_uses_camel_case() {
        let city_id = CityId::random();
        let body = serde_json::to_value(UpdateCityBody { city_id: &city_id }).expect("serializes");
        assert_eq!(body, json!({ "cityId": city_id.to_string() }));
    }

    #[rstest]
    fn unresolved_pages_unwrap_the_records_envelope() {
        let page: UnresolvedPage = serde_json::from_value(json!({
            "records": [
                { "id": "venue-1", "location": { "type": "Point", "coordinates": [2.35, 48.85] } },
                { "id": "venue-2" }
            ]
        }))
        .expect("decodes");
        assert_eq!(page.records.len(), 2);
        assert!(page.records[0].point().is_some());
        assert!(page.records[1].point().is_none());
    }

    #[rstest]
    #[case(json!({ "success": true }), true)]
    #[case(json!({ "success": false }), false)]
    #[case(json!({}), false)]
    fn update_replies_default_to_unsuccessful(#[case] raw: serde_json::Value, #[case] expected: bool) {
        let reply: UpdateCityReply = serde_json::from_value(raw).expect("decodes");
        assert_eq!(reply.success, expected);
    }
}
