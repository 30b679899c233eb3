//! Envelope construction, trace capture, and wire format.

use super::*;
use crate::domain::TraceId;
use rstest::rstest;
use serde_json::json;

#[rstest]
#[case(Error::invalid_request("name is required"), "invalid_request")]
#[case(Error::not_found("city missing"), "not_found")]
#[case(Error::conflict("backfill already running"), "conflict")]
#[case(Error::service_unavailable("city store unreachable"), "service_unavailable")]
#[case(Error::internal("integrity violation"), "internal_error")]
fn codes_serialise_in_snake_case(#[case] error: Error, #[case] wire: &str) {
    assert_eq!(error.code().as_str(), wire);
    let value = serde_json::to_value(&error).expect("serialises");
    assert_eq!(value["code"], wire);
}

#[rstest]
fn display_prefixes_the_code() {
    let error = Error::not_found("city 42 not found");
    assert_eq!(error.to_string(), "not_found: city 42 not found");
}

#[rstest]
#[case("")]
#[case("   ")]
fn blank_messages_are_replaced(#[case] message: &str) {
    assert_eq!(Error::internal(message).message(), UNSPECIFIED_MESSAGE);
}

#[tokio::test]
async fn errors_built_in_a_trace_scope_carry_its_id() {
    let trace_id = TraceId::generate();
    let inside = TraceId::scope(trace_id, async { Error::internal("boom") }).await;
    let outside = Error::internal("boom");

    assert_eq!(inside.trace_id(), Some(trace_id.to_string().as_str()));
    assert!(outside.trace_id().is_none());
}

#[rstest]
fn decodes_remote_envelopes_with_either_trace_spelling() {
    let camel: Error = serde_json::from_value(json!({
        "code": "conflict",
        "message": "events backfill already running",
        "traceId": "abc",
        "details": { "kind": "events" }
    }))
    .expect("camelCase decodes");
    let snake: Error = serde_json::from_value(json!({
        "code": "conflict",
        "message": "events backfill already running",
        "trace_id": "abc",
        "details": { "kind": "events" }
    }))
    .expect("snake_case decodes");

    assert_eq!(camel, snake);
    assert_eq!(camel.details(), Some(&json!({ "kind": "events" })));
}

#[rstest]
fn optional_fields_are_omitted_when_absent() {
    let value = serde_json::to_value(Error::invalid_request("bad")).expect("serialises");
    assert!(value.get("traceId").is_none());
    assert!(value.get("details").is_none());
}
