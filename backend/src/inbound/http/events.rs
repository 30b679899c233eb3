//! Webhook receiving `cityCreated` events for image enrichment.
//!
//! Replies 202 whatever the business outcome, and 500 only when a downstream
//! call failed so the sender may redeliver. Redelivery is safe because the
//! enricher deduplicates on the event id.

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use utoipa::ToSchema;

use crate::domain::{ApiResult, CityCreatedEvent, EnrichmentOutcome, Error};
use crate::inbound::http::state::HttpState;

/// Acknowledgement body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentAck {
    /// Outcome label, e.g. `enriched` or `duplicate`.
    pub outcome: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[utoipa::path(
    post,
    path = "/events/city-created",
    request_body = CityCreatedEvent,
    responses(
        (status = 202, description = "Event handled", body = EnrichmentAck),
        (status = 500, description = "Downstream failure; safe to redeliver", body = Error)
    ),
    tags = ["events"],
    operation_id = "onCityCreated"
)]
#[post("/events/city-created")]
pub async fn city_created(
    state: web::Data<HttpState>,
    payload: web::Json<CityCreatedEvent>,
) -> ApiResult<HttpResponse> {
    let event = payload.into_inner();
    let outcome = state
        .enricher
        .handle_city_created(&event)
        .await
        .map_err(|err| {
            error!(event_id = %event.event_id, city_id = %event.city_id, error = %err, "image enrichment failed");
            Error::internal(format!("image enrichment failed: {err}"))
        })?;
    info!(event_id = %event.event_id, outcome = outcome.as_str(), "cityCreated handled");

    let image_url = match &outcome {
        EnrichmentOutcome::Enriched { image_url } => Some(image_url.clone()),
        _ => None,
    };
    Ok(HttpResponse::Accepted().json(EnrichmentAck {
        outcome: outcome.as_str().to_owned(),
        image_url,
    }))
}
