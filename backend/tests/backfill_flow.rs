//! End-to-end backfill runs through the HTTP admin route.

// Shared harness exposes doubles this suite does not inspect.
#[allow(dead_code)]
#[path = "support/city_harness.rs"]
mod city_harness;

use actix_web::test::{self, TestRequest};
use city_harness::Harness;
use rstest::rstest;
use serde_json::Value;

use city_service::domain::{GeoPoint, RecordKind};
use city_service::test_support::geocoding::{StaticGeocoder, locality_address};
use city_service::test_support::records::{InMemoryRecordService, unresolved_record};

fn point(longitude: f64, latitude: f64) -> GeoPoint {
    GeoPoint::new(longitude, latitude).expect("valid point")
}

#[rstest]
#[actix_web::test]
async fn records_in_one_city_share_a_single_city_row() {
    let geocoder = StaticGeocoder::new()
        .with_reverse(point(4.90, 52.37), locality_address("Amsterdam", "Netherlands", "NL"))
        .with_reverse(point(4.91, 52.36), locality_address("AMSTERDAM", "Netherlands", "nl"))
        .with_reverse(point(5.12, 52.09), locality_address("Utrecht", "Netherlands", "NL"));
    let records = InMemoryRecordService::new().with_records(
        RecordKind::Venues,
        vec![
            unresolved_record("venue-a", 4.90, 52.37),
            unresolved_record("venue-b", 4.91, 52.36),
            unresolved_record("venue-c", 5.12, 52.09),
            unresolved_record("venue-d", 4.90, 52.37),
            unresolved_record("venue-e", 4.91, 52.36),
        ],
    );
    let harness = Harness::new(geocoder, records);
    let app = test::init_service(harness.app()).await;

    let report: Value = test::call_and_read_body_json(
        &app,
        TestRequest::post().uri("/admin/backfill/venues").to_request(),
    )
    .await;

    assert_eq!(report["processed"], 5);
    assert_eq!(report["updated"], 5);
    let cities = harness.repository.snapshot();
    assert_eq!(cities.len(), 2, "amsterdam and utrecht only");
    assert_eq!(harness.publisher.wait_for_events(2).await.len(), 2);

    let amsterdam = harness.records.city_of(RecordKind::Venues, "venue-a");
    for id in ["venue-b", "venue-d", "venue-e"] {
        assert_eq!(harness.records.city_of(RecordKind::Venues, id), amsterdam);
    }
    assert_ne!(harness.records.city_of(RecordKind::Venues, "venue-c"), amsterdam);

    // Page size 2 over five records: three full or partial pages plus the
    // empty terminator.
    let offsets: Vec<usize> = harness
        .records
        .fetch_calls()
        .iter()
        .map(|call| call.offset)
        .collect();
    assert_eq!(offsets, vec![0, 2, 4, 6]);
}

#[rstest]
#[actix_web::test]
async fn venue_and_event_backfills_run_independently() {
    let geocoder = StaticGeocoder::new()
        .with_reverse(point(-9.14, 38.72), locality_address("Lisbon", "Portugal", "PT"));
    let records = InMemoryRecordService::new()
        .with_records(
            RecordKind::Venues,
            vec![unresolved_record("venue-1", -9.14, 38.72)],
        )
        .with_records(
            RecordKind::Events,
            vec![
                unresolved_record("event-1", -9.14, 38.72),
                unresolved_record("event-2", -9.14, 38.72),
            ],
        )
        .reject_update_of("event-2");
    let harness = Harness::new(geocoder, records);
    let app = test::init_service(harness.app()).await;

    let venues: Value = test::call_and_read_body_json(
        &app,
        TestRequest::post().uri("/admin/backfill/venues").to_request(),
    )
    .await;
    let events: Value = test::call_and_read_body_json(
        &app,
        TestRequest::post().uri("/admin/backfill/events").to_request(),
    )
    .await;

    assert_eq!(venues["kind"], "venues");
    assert_eq!(venues["updated"], 1);
    assert_eq!(events["kind"], "events");
    assert_eq!(events["processed"], 2);
    assert_eq!(events["updated"], 1);
    assert_eq!(events["failed"], 1);

    assert_eq!(harness.repository.snapshot().len(), 1);
    assert_eq!(
        harness.records.city_of(RecordKind::Venues, "venue-1"),
        harness.records.city_of(RecordKind::Events, "event-1")
    );
    assert_eq!(harness.records.city_of(RecordKind::Events, "event-2"), None);
}
