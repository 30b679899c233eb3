//! Wiring of adapters and domain services from settings.

use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr, eyre};
use mockable::{Clock, DefaultClock};
use reqwest::Url;
use tracing::{info, warn};

use city_service::domain::ports::{
    CityEventPublisher, CityRepository, CityResolutionClient, Geocoder, IdempotencyLock,
    NoOpCityEventPublisher, ReferenceRecordService,
};
use city_service::domain::{
    BackfillCoordinator, BackfillPorts, CityImageEnricher, CityResolutionGateway, CityResolver,
    LocalCityResolutionClient, PlanCountScorer, RecordKind, TrendingScoreScheduler,
};
use city_service::inbound::http::state::HttpState;
use city_service::outbound::events::HttpCityEventPublisher;
use city_service::outbound::google_maps::GoogleMapsGeocoder;
use city_service::outbound::lock::RedisIdempotencyLock;
use city_service::outbound::persistence::{DbPool, DieselCityRepository};
use city_service::outbound::rpc::{
    HttpCityResolutionClient, HttpReferenceRecordService, JsonRpcTransport,
    RecordServiceEndpoints,
};
use city_service::settings::CityServiceSettings;

/// Outbound adapters shared by the domain services.
struct Adapters {
    repository: Arc<dyn CityRepository>,
    publisher: Arc<dyn CityEventPublisher>,
    geocoder: Arc<dyn Geocoder>,
    lock: Arc<dyn IdempotencyLock>,
    records: Arc<dyn ReferenceRecordService>,
}

fn optional_transport(
    settings: &CityServiceSettings,
    url: Option<&str>,
    label: &str,
) -> Result<Option<JsonRpcTransport>> {
    match url {
        Some(url) => JsonRpcTransport::new(url, settings.http_timeout())
            .map(Some)
            .wrap_err_with(|| format!("invalid {label} URL")),
        None => {
            warn!(label, "no endpoint configured");
            Ok(None)
        }
    }
}

async fn connect_adapters(settings: &CityServiceSettings) -> Result<Adapters> {
    let pool = DbPool::connect(
        settings.database_url()?,
        settings.database_max_connections(),
    )
    .await
    .wrap_err("failed to create database pool")?;
    let repository: Arc<dyn CityRepository> = Arc::new(DieselCityRepository::new(pool));

    let lock = RedisIdempotencyLock::connect(settings.redis_url(), settings.redis_max_connections())
        .await
        .wrap_err("failed to connect to redis")?;

    let base_url = Url::parse(settings.google_maps_base_url())
        .map_err(|err| eyre!("invalid Google Maps base URL: {err}"))?;
    let geocoder = GoogleMapsGeocoder::new(
        base_url,
        settings.google_maps_api_key()?,
        settings.http_timeout(),
    )
    .wrap_err("failed to build Google Maps client")?;

    let publisher: Arc<dyn CityEventPublisher> =
        match optional_transport(settings, settings.event_sink_url.as_deref(), "event sink")? {
            Some(transport) => Arc::new(HttpCityEventPublisher::new(transport)),
            None => Arc::new(NoOpCityEventPublisher),
        };

    let endpoints = RecordServiceEndpoints {
        venues: optional_transport(
            settings,
            settings.venues_service_url.as_deref(),
            "venues service",
        )?,
        events: optional_transport(
            settings,
            settings.events_service_url.as_deref(),
            "events service",
        )?,
    };

    Ok(Adapters {
        repository,
        publisher,
        geocoder: Arc::new(geocoder),
        lock: Arc::new(lock),
        records: Arc::new(HttpReferenceRecordService::new(endpoints)),
    })
}

/// Build the handler state and every service behind it.
///
/// # Errors
///
/// Fails when a required setting is missing or an adapter cannot connect.
pub(crate) async fn build_http_state(settings: &CityServiceSettings) -> Result<HttpState> {
    let adapters = connect_adapters(settings).await?;
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    let resolver = Arc::new(CityResolver::new(
        adapters.repository.clone(),
        adapters.publisher.clone(),
    ));
    let gateway = CityResolutionGateway::new(resolver);

    let cities: Arc<dyn CityResolutionClient> =
        match optional_transport(settings, settings.city_resolver_url.as_deref(), "city resolver")? {
            Some(transport) => Arc::new(HttpCityResolutionClient::new(transport)),
            None => {
                info!("resolving cities in-process");
                Arc::new(LocalCityResolutionClient::new(gateway.clone()))
            }
        };

    let ports = BackfillPorts {
        records: adapters.records.clone(),
        geocoder: adapters.geocoder.clone(),
        cities,
    };
    let backfill = |kind| {
        Arc::new(BackfillCoordinator::new(
            kind,
            ports.clone(),
            clock.clone(),
            settings.backfill_config(),
        ))
    };

    Ok(HttpState {
        cities: Arc::new(gateway),
        enricher: Arc::new(CityImageEnricher::new(
            adapters.repository.clone(),
            adapters.geocoder,
            adapters.lock,
            settings.image_enrichment_config(),
        )),
        venue_backfill: backfill(RecordKind::Venues),
        event_backfill: backfill(RecordKind::Events),
        trending: Arc::new(TrendingScoreScheduler::new(
            adapters.repository,
            Arc::new(PlanCountScorer),
            clock.clone(),
            settings.trending_config(),
        )),
    })
}
