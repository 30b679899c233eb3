//! In-memory service graph for HTTP integration tests.
//!
//! Wires the real domain services over the `test-support` doubles so tests
//! drive the public routes without Postgres, Redis, or Google Maps.

use std::sync::Arc;
use std::time::Duration;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use mockable::DefaultClock;

use city_service::Trace;
use city_service::domain::{
    BackfillConfig, BackfillCoordinator, BackfillPorts, CityImageEnricher, CityResolutionGateway,
    CityResolver, ImageEnrichmentConfig, LocalCityResolutionClient, PlanCountScorer, RecordKind,
    TrendingConfig, TrendingScoreScheduler,
};
use city_service::inbound::http::configure;
use city_service::inbound::http::health::HealthState;
use city_service::inbound::http::state::HttpState;
use city_service::test_support::cities::{
    InMemoryCityRepository, InMemoryIdempotencyLock, RecordingCityEventPublisher,
};
use city_service::test_support::geocoding::StaticGeocoder;
use city_service::test_support::records::InMemoryRecordService;
use city_service::test_support::runtime::ImmediateSleeper;

/// Doubles behind one service graph, kept for assertions.
pub struct Harness {
    pub repository: Arc<InMemoryCityRepository>,
    pub publisher: Arc<RecordingCityEventPublisher>,
    pub geocoder: Arc<StaticGeocoder>,
    pub lock: Arc<InMemoryIdempotencyLock>,
    pub records: Arc<InMemoryRecordService>,
    pub state: HttpState,
    pub health: web::Data<HealthState>,
}

impl Harness {
    pub fn new(geocoder: StaticGeocoder, records: InMemoryRecordService) -> Self {
        Self::with_repository(InMemoryCityRepository::new(), geocoder, records)
    }

    pub fn with_repository(
        repository: InMemoryCityRepository,
        geocoder: StaticGeocoder,
        records: InMemoryRecordService,
    ) -> Self {
        let repository = Arc::new(repository);
        let publisher = Arc::new(RecordingCityEventPublisher::new());
        let geocoder = Arc::new(geocoder);
        let lock = Arc::new(InMemoryIdempotencyLock::new());
        let records = Arc::new(records);

        let resolver = Arc::new(CityResolver::new(repository.clone(), publisher.clone()));
        let gateway = CityResolutionGateway::new(resolver);
        let ports = BackfillPorts {
            records: records.clone(),
            geocoder: geocoder.clone(),
            cities: Arc::new(LocalCityResolutionClient::new(gateway.clone())),
        };
        let config = BackfillConfig {
            page_size: 2,
            inter_record_delay: Duration::from_millis(200),
        };
        let coordinator = |kind| {
            Arc::new(BackfillCoordinator::with_sleeper(
                kind,
                ports.clone(),
                Arc::new(DefaultClock),
                Arc::new(ImmediateSleeper),
                config,
            ))
        };

        let state = HttpState {
            cities: Arc::new(gateway.clone()),
            enricher: Arc::new(CityImageEnricher::new(
                repository.clone(),
                geocoder.clone(),
                lock.clone(),
                ImageEnrichmentConfig::default(),
            )),
            venue_backfill: coordinator(RecordKind::Venues),
            event_backfill: coordinator(RecordKind::Events),
            trending: Arc::new(TrendingScoreScheduler::new(
                repository.clone(),
                Arc::new(PlanCountScorer),
                Arc::new(DefaultClock),
                TrendingConfig::default(),
            )),
        };
        let health = web::Data::new(HealthState::new());
        health.mark_ready();

        Self {
            repository,
            publisher,
            geocoder,
            lock,
            records,
            state,
            health,
        }
    }

    /// The Actix app exactly as the server wires it.
    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        App::new()
            .app_data(self.health.clone())
            .app_data(web::Data::new(self.state.clone()))
            .wrap(Trace)
            .configure(configure)
    }
}
