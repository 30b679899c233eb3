//! HTTP inbound adapter exposing RPC, event, admin, and probe endpoints.

pub mod admin;
pub mod cities;
pub mod error;
pub mod events;
pub mod health;
pub mod state;

use actix_web::web;
use serde_json::json;

use crate::domain::Error;

/// Malformed JSON bodies answer with the shared error envelope.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        Error::invalid_request("request body is not valid JSON")
            .with_details(json!({ "reason": err.to_string() }))
            .into()
    })
}

/// Register every route on `cfg`. Shared by the server and HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(cities::resolve_city)
        .service(cities::get_city)
        .service(cities::adjust_plan_count)
        .service(events::city_created)
        .service(admin::run_backfill)
        .service(admin::run_trending)
        .service(health::ready)
        .service(health::live);
}
