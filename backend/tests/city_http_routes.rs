//! HTTP-level behaviour of the city service routes over in-memory adapters.

#[path = "support/city_harness.rs"]
mod city_harness;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use city_harness::Harness;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use city_service::domain::image_enrichment::lock_key;
use city_service::domain::{City, CityCreatedEvent, GeoPoint, RecordKind, TRACE_ID_HEADER};
use city_service::test_support::cities::{InMemoryCityRepository, stored_city};
use city_service::test_support::geocoding::{StaticGeocoder, locality_address};
use city_service::test_support::records::{
    InMemoryRecordService, record_without_location, unresolved_record,
};

const RESOLVE_PATH: &str = "/rpc/cities/resolve";

#[fixture]
fn harness() -> Harness {
    let geocoder = StaticGeocoder::new()
        .with_place("lisbon, pt", "place-lisbon")
        .with_photos("place-lisbon", &["photo-1", "photo-2"]);
    Harness::new(geocoder, InMemoryRecordService::new())
}

#[rstest]
#[actix_web::test]
async fn resolve_creates_then_reuses_the_normalized_city(harness: Harness) {
    let app = test::init_service(harness.app()).await;

    let first: City = test::call_and_read_body_json(
        &app,
        TestRequest::post()
            .uri(RESOLVE_PATH)
            .set_json(json!({
                "name": "  Paris ",
                "countryCode": "FR",
                "location": { "longitude": 2.3522, "latitude": 48.8566 }
            }))
            .to_request(),
    )
    .await;
    let second: City = test::call_and_read_body_json(
        &app,
        TestRequest::post()
            .uri(RESOLVE_PATH)
            .set_json(json!({ "name": "PARIS", "countryCode": "fr" }))
            .to_request(),
    )
    .await;

    assert_eq!(first.id, second.id);
    assert_eq!(first.name, "paris");
    assert_eq!(first.country_code, "fr");
    assert_eq!(harness.repository.snapshot().len(), 1);
    let events = harness.publisher.wait_for_events(1).await;
    assert_eq!(events.len(), 1, "only the insert publishes cityCreated");
    assert_eq!(events[0].city_id, first.id);
}

#[rstest]
#[case::missing_name(json!({ "countryCode": "fr" }), "name")]
#[case::blank_name(json!({ "name": "   ", "countryCode": "fr" }), "name")]
#[case::missing_country(json!({ "name": "Paris" }), "countryCode")]
#[case::blank_country(json!({ "name": "Paris", "countryCode": "" }), "countryCode")]
#[actix_web::test]
async fn resolve_rejects_missing_key_fields(
    harness: Harness,
    #[case] body: Value,
    #[case] field: &str,
) {
    let app = test::init_service(harness.app()).await;

    let res = test::call_service(
        &app,
        TestRequest::post().uri(RESOLVE_PATH).set_json(body).to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let header = res
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .expect("trace id header");
    let payload: Value = test::read_body_json(res).await;
    assert_eq!(payload["code"], "invalid_request");
    assert_eq!(payload["details"]["field"], field);
    assert_eq!(payload["traceId"], header.as_str());
    assert_eq!(harness.repository.insert_calls(), 0);
}

#[rstest]
#[actix_web::test]
async fn malformed_json_uses_the_error_envelope(harness: Harness) {
    let app = test::init_service(harness.app()).await;

    let res = test::call_service(
        &app,
        TestRequest::post()
            .uri(RESOLVE_PATH)
            .insert_header(("content-type", "application/json"))
            .set_payload("{\"name\": ")
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let payload: Value = test::read_body_json(res).await;
    assert_eq!(payload["code"], "invalid_request");
}

#[rstest]
#[actix_web::test]
async fn incoming_trace_ids_are_echoed(harness: Harness) {
    let app = test::init_service(harness.app()).await;
    let trace_id = "9b2f7c1e-6d0a-4c55-8f3e-1a2b3c4d5e6f";

    let res = test::call_service(
        &app,
        TestRequest::post()
            .uri(RESOLVE_PATH)
            .insert_header((TRACE_ID_HEADER, trace_id))
            .set_json(json!({ "name": "Rome", "countryCode": "IT" }))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get(TRACE_ID_HEADER).and_then(|v| v.to_str().ok()),
        Some(trace_id)
    );
}

#[rstest]
#[actix_web::test]
async fn get_and_plan_count_routes(harness: Harness) {
    let app = test::init_service(harness.app()).await;
    let city: City = test::call_and_read_body_json(
        &app,
        TestRequest::post()
            .uri(RESOLVE_PATH)
            .set_json(json!({ "name": "Oslo", "countryCode": "NO" }))
            .to_request(),
    )
    .await;

    let fetched: City = test::call_and_read_body_json(
        &app,
        TestRequest::get()
            .uri(&format!("/rpc/cities/{}", city.id))
            .to_request(),
    )
    .await;
    assert_eq!(fetched.id, city.id);

    let bumped: City = test::call_and_read_body_json(
        &app,
        TestRequest::post()
            .uri(&format!("/rpc/cities/{}/plan-count", city.id))
            .set_json(json!({ "delta": 2 }))
            .to_request(),
    )
    .await;
    assert_eq!(bumped.plan_count, 2);

    let clamped: City = test::call_and_read_body_json(
        &app,
        TestRequest::post()
            .uri(&format!("/rpc/cities/{}/plan-count", city.id))
            .set_json(json!({ "delta": -5 }))
            .to_request(),
    )
    .await;
    assert_eq!(clamped.plan_count, 0);
}

#[rstest]
#[case::unknown("/rpc/cities/0d7f7c7e-9b1e-4c4e-8b9a-0e6d2c1f4a11", StatusCode::NOT_FOUND)]
#[case::malformed("/rpc/cities/paris", StatusCode::BAD_REQUEST)]
#[actix_web::test]
async fn get_city_errors(harness: Harness, #[case] uri: &str, #[case] expected: StatusCode) {
    let app = test::init_service(harness.app()).await;
    let res = test::call_service(&app, TestRequest::get().uri(uri).to_request()).await;
    assert_eq!(res.status(), expected);
}

#[rstest]
#[actix_web::test]
async fn city_created_enriches_once_and_acknowledges_redelivery(harness: Harness) {
    let app = test::init_service(harness.app()).await;
    let city: City = test::call_and_read_body_json(
        &app,
        TestRequest::post()
            .uri(RESOLVE_PATH)
            .set_json(json!({ "name": "Lisbon", "countryCode": "PT" }))
            .to_request(),
    )
    .await;
    let event = CityCreatedEvent::for_city(&city);

    let first = test::call_service(
        &app,
        TestRequest::post()
            .uri("/events/city-created")
            .set_json(&event)
            .to_request(),
    )
    .await;
    assert_eq!(first.status(), StatusCode::ACCEPTED);
    let ack: Value = test::read_body_json(first).await;
    assert_eq!(ack["outcome"], "enriched");
    assert_eq!(ack["imageUrl"], "https://photos.test/photo-1?maxwidth=800");

    let redelivered = test::call_service(
        &app,
        TestRequest::post()
            .uri("/events/city-created")
            .set_json(&event)
            .to_request(),
    )
    .await;
    assert_eq!(redelivered.status(), StatusCode::ACCEPTED);
    let ack: Value = test::read_body_json(redelivered).await;
    assert_eq!(ack["outcome"], "already_enriched");

    assert_eq!(harness.geocoder.forward_calls(), 1);
    assert_eq!(harness.lock.releases(), vec![lock_key(&event.event_id); 2]);
    let stored = harness.repository.snapshot();
    assert_eq!(
        stored[0].image_url.as_deref(),
        Some("https://photos.test/photo-1?maxwidth=800")
    );
}

#[rstest]
#[actix_web::test]
async fn backfill_route_reports_counts_and_rejects_unknown_kinds() {
    let paris = GeoPoint::new(2.3522, 48.8566).expect("valid point");
    let geocoder =
        StaticGeocoder::new().with_reverse(paris, locality_address("Paris", "France", "FR"));
    let records = InMemoryRecordService::new().with_records(
        RecordKind::Venues,
        vec![
            unresolved_record("venue-1", 2.3522, 48.8566),
            record_without_location("venue-2"),
            unresolved_record("venue-3", 2.3522, 48.8566),
        ],
    );
    let harness = Harness::new(geocoder, records);
    let app = test::init_service(harness.app()).await;

    let report: Value = test::call_and_read_body_json(
        &app,
        TestRequest::post().uri("/admin/backfill/venues").to_request(),
    )
    .await;
    assert_eq!(report["kind"], "venues");
    assert_eq!(report["processed"], 3);
    assert_eq!(report["updated"], 2);
    assert_eq!(report["skipped"], 1);
    assert_eq!(report["failed"], 0);
    assert_eq!(harness.records.assigned_count(), 2);

    let unknown = test::call_service(
        &app,
        TestRequest::post().uri("/admin/backfill/plans").to_request(),
    )
    .await;
    assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
}

#[rstest]
#[actix_web::test]
async fn trending_route_scores_every_city() {
    let mut busy = stored_city("berlin", "de", None);
    busy.plan_count = 9;
    let quiet = stored_city("bonn", "de", None);
    let harness = Harness::with_repository(
        InMemoryCityRepository::with_cities(vec![busy, quiet]),
        StaticGeocoder::new(),
        InMemoryRecordService::new(),
    );
    let app = test::init_service(harness.app()).await;

    let report: Value = test::call_and_read_body_json(
        &app,
        TestRequest::post().uri("/admin/trending/run").to_request(),
    )
    .await;
    assert_eq!(report["updated"], 2);
    assert_eq!(report["errors"], 0);

    let scores: Vec<f64> = harness
        .repository
        .snapshot()
        .iter()
        .map(|c| c.trending_score)
        .collect();
    assert!((scores[0] - 10_f64.ln()).abs() < 1e-9);
    assert_eq!(scores[1], 0.0);
}

#[rstest]
#[actix_web::test]
async fn health_probes_answer(harness: Harness) {
    let app = test::init_service(harness.app()).await;
    for path in ["/health/live", "/health/ready"] {
        let res = test::call_service(&app, TestRequest::get().uri(path).to_request()).await;
        assert_eq!(res.status(), StatusCode::OK, "{path}");
    }
}
