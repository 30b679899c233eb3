//! City RPC endpoints.
//!
//! ```text
//! POST /rpc/cities/resolve          {"name":"Paris","countryCode":"FR"}
//! GET  /rpc/cities/{id}
//! POST /rpc/cities/{id}/plan-count  {"delta":1}
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::ports::CityResolutionRequest;
use crate::domain::{ApiResult, City, CityId, Error};
use crate::inbound::http::state::HttpState;

/// Body for `POST /rpc/cities/{id}/plan-count`.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema)]
pub struct PlanCountDelta {
    /// Signed change; the stored counter never drops below zero.
    pub delta: i64,
}

fn parse_city_id(raw: &str) -> Result<CityId, Error> {
    Uuid::parse_str(raw).map(CityId::from_uuid).map_err(|_| {
        Error::invalid_request("city id must be a UUID")
            .with_details(json!({ "field": "id", "value": raw }))
    })
}

/// Resolve or create a city by normalized `(name, countryCode)`.
#[utoipa::path(
    post,
    path = "/rpc/cities/resolve",
    request_body = CityResolutionRequest,
    responses(
        (status = 200, description = "Existing or newly created city", body = City),
        (status = 400, description = "Missing or blank name/countryCode", body = Error),
        (status = 503, description = "City store unreachable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["cities"],
    operation_id = "cityResolve"
)]
#[post("/rpc/cities/resolve")]
pub async fn resolve_city(
    state: web::Data<HttpState>,
    payload: web::Json<CityResolutionRequest>,
) -> ApiResult<web::Json<City>> {
    let city = state.cities.resolve(&payload.into_inner()).await?;
    Ok(web::Json(city))
}

/// Fetch one city.
#[utoipa::path(
    get,
    path = "/rpc/cities/{id}",
    params(("id" = String, Path, description = "City identifier")),
    responses(
        (status = 200, description = "City", body = City),
        (status = 400, description = "Malformed id", body = Error),
        (status = 404, description = "Unknown city", body = Error)
    ),
    tags = ["cities"],
    operation_id = "getCity"
)]
#[get("/rpc/cities/{id}")]
pub async fn get_city(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<City>> {
    let id = parse_city_id(&path.into_inner())?;
    Ok(web::Json(state.cities.get(&id).await?))
}

/// Apply a signed plan-count delta.
#[utoipa::path(
    post,
    path = "/rpc/cities/{id}/plan-count",
    params(("id" = String, Path, description = "City identifier")),
    request_body = PlanCountDelta,
    responses(
        (status = 200, description = "Updated city", body = City),
        (status = 400, description = "Malformed id", body = Error),
        (status = 404, description = "Unknown city", body = Error)
    ),
    tags = ["cities"],
    operation_id = "adjustPlanCount"
)]
#[post("/rpc/cities/{id}/plan-count")]
pub async fn adjust_plan_count(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<PlanCountDelta>,
) -> ApiResult<HttpResponse> {
    let id = parse_city_id(&path.into_inner())?;
    let city = state.cities.adjust_plan_count(&id, payload.delta).await?;
    Ok(HttpResponse::Ok().json(city))
}
