//! Domain primitives, services, and ports.
//!
//! Purpose: keep city resolution, backfill coordination, image enrichment,
//! and trending recomputation free of transport and storage details. Inbound
//! adapters call the services here; outbound adapters implement [`ports`].
//!
//! Public surface:
//! - Error (alias to `error::Error`): shared error envelope.
//! - City, CityKey, CityId: the deduplicated city entity and its keys.
//! - CityResolver / CityResolutionGateway: get-or-create and its façade.
//! - BackfillCoordinator: per-kind single-flight backfill job.
//! - CityImageEnricher: idempotent `cityCreated` listener.
//! - TrendingScoreScheduler: periodic score recompute.

pub mod backfill;
pub mod city;
pub mod city_resolver;
pub mod error;
pub mod image_enrichment;
pub mod ports;
pub mod reference_record;
pub mod rpc_gateway;
pub mod single_flight;
pub mod sleeper;
pub mod trace_id;
pub mod trending;

pub use self::backfill::{
    BackfillConfig, BackfillCoordinator, BackfillError, BackfillPorts, BackfillReport,
};
pub use self::city::{City, CityCreatedEvent, CityId, CityKey, CityValidationError, GeoPoint};
pub use self::city_resolver::{CityResolutionError, CityResolver};
pub use self::error::{Error, ErrorCode};
pub use self::image_enrichment::{
    CityImageEnricher, EnrichmentOutcome, ImageEnrichmentConfig, ImageEnrichmentError,
};
pub use self::reference_record::{RecordKind, RecordLocation, ReferenceRecord, UnknownRecordKind};
pub use self::rpc_gateway::{CityResolutionGateway, LocalCityResolutionClient};
pub use self::single_flight::{FlightGuard, SingleFlight};
pub use self::sleeper::{Sleeper, TokioSleeper};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::trending::{
    PlanCountScorer, TrendingConfig, TrendingError, TrendingReport, TrendingScoreScheduler,
    TrendingScorer,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use city_service::domain::{ApiResult, Error};
///
/// fn lookup() -> ApiResult<()> {
///     Err(Error::not_found("city missing"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
