//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] collects every inbound route and the wire shapes they exchange.
//! Export it with `cargo run --bin openapi-dump` for client generation.

use utoipa::OpenApi;

use crate::domain::ports::CityResolutionRequest;
use crate::domain::{
    BackfillReport, City, CityCreatedEvent, CityId, Error, ErrorCode, GeoPoint, RecordKind,
    TrendingReport,
};
use crate::inbound::http::cities::PlanCountDelta;
use crate::inbound::http::events::EnrichmentAck;

/// OpenAPI document for the HTTP surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "City service API",
        description = "City resolution RPC, cityCreated webhook, admin triggers and health probes."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::cities::resolve_city,
        crate::inbound::http::cities::get_city,
        crate::inbound::http::cities::adjust_plan_count,
        crate::inbound::http::events::city_created,
        crate::inbound::http::admin::run_backfill,
        crate::inbound::http::admin::run_trending,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        City,
        CityId,
        GeoPoint,
        CityResolutionRequest,
        CityCreatedEvent,
        PlanCountDelta,
        EnrichmentAck,
        BackfillReport,
        TrendingReport,
        RecordKind,
        Error,
        ErrorCode
    )),
    tags(
        (name = "cities", description = "City resolution RPC"),
        (name = "events", description = "Event listeners"),
        (name = "admin", description = "Operator triggers"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
