//! Backfill of city references for venues and events.
//!
//! One coordinator exists per record kind. A run pages through records that
//! lack a city id, reverse-geocodes each one, resolves the city through the
//! `cityResolve` RPC, and writes the id back through `updateRecordCity`.
//! Pages and records are handled strictly in order, one call at a time, with
//! a fixed pause between records to stay inside provider quotas.

use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::domain::ports::{
    CityResolutionClient, CityResolutionRequest, Geocoder, ReferenceRecordService,
    RemoteCallError,
};
use crate::domain::{RecordKind, ReferenceRecord, SingleFlight, Sleeper, TokioSleeper};

mod address;
mod report;

pub use address::{ParsedAddress, parse_city};
pub use report::{BackfillReport, BackfillTally, RecordOutcome};

/// Default number of records requested per page.
pub const DEFAULT_PAGE_SIZE: usize = 100;
/// Default pause between two records.
pub const DEFAULT_INTER_RECORD_DELAY: Duration = Duration::from_millis(200);

/// Paging and pacing knobs for a coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackfillConfig {
    pub page_size: usize,
    pub inter_record_delay: Duration,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            inter_record_delay: DEFAULT_INTER_RECORD_DELAY,
        }
    }
}

/// Failures that end a run before it completes.
#[derive(Debug, Error)]
pub enum BackfillError {
    /// Another run for the same kind holds the single-flight flag.
    #[error("{kind} backfill is already running")]
    AlreadyRunning { kind: RecordKind },
    /// A page could not be fetched; the run was aborted.
    #[error("failed to fetch unresolved {kind} at offset {offset}: {source}")]
    Fetch {
        kind: RecordKind,
        offset: usize,
        #[source]
        source: RemoteCallError,
    },
}

/// Port bundle required by a coordinator.
#[derive(Clone)]
pub struct BackfillPorts {
    /// Owner of the records being backfilled.
    pub records: Arc<dyn ReferenceRecordService>,
    pub geocoder: Arc<dyn Geocoder>,
    /// `cityResolve` RPC client.
    pub cities: Arc<dyn CityResolutionClient>,
}

/// Single-flight backfill job for one record kind.
pub struct BackfillCoordinator {
    kind: RecordKind,
    records: Arc<dyn ReferenceRecordService>,
    geocoder: Arc<dyn Geocoder>,
    cities: Arc<dyn CityResolutionClient>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    config: BackfillConfig,
    flight: SingleFlight,
}

impl BackfillCoordinator {
    /// Build a coordinator that paces itself with Tokio timers.
    pub fn new(
        kind: RecordKind,
        ports: BackfillPorts,
        clock: Arc<dyn Clock>,
        config: BackfillConfig,
    ) -> Self {
        Self::with_sleeper(kind, ports, clock, Arc::new(TokioSleeper), config)
    }

    /// Build a coordinator with an injected sleeper.
    pub fn with_sleeper(
        kind: RecordKind,
        ports: BackfillPorts,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn Sleeper>,
        config: BackfillConfig,
    ) -> Self {
        Self {
            kind,
            records: ports.records,
            geocoder: ports.geocoder,
            cities: ports.cities,
            clock,
            sleeper,
            config: BackfillConfig {
                page_size: config.page_size.max(1),
                ..config
            },
            flight: SingleFlight::new(),
        }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Whether a run is currently in progress in this process.
    pub fn is_running(&self) -> bool {
        self.flight.is_running()
    }

    /// Execute one full backfill pass.
    ///
    /// A concurrent call returns [`BackfillError::AlreadyRunning`] without
    /// issuing any remote call. The flag is released on every exit path.
    pub async fn run(&self) -> Result<BackfillReport, BackfillError> {
        let Some(_guard) = self.flight.try_begin() else {
            warn!(kind = %self.kind, "backfill already running; ignoring trigger");
            return Err(BackfillError::AlreadyRunning { kind: self.kind });
        };

        let started_at = self.clock.utc();
        info!(kind = %self.kind, page_size = self.config.page_size, "backfill started");

        let mut tally = BackfillTally::default();
        let mut offset = 0;
        loop {
            let page = match self
                .records
                .fetch_unresolved(self.kind, self.config.page_size, offset)
                .await
            {
                Ok(page) => page,
                Err(source) => {
                    error!(
                        kind = %self.kind,
                        offset,
                        processed = tally.processed,
                        error_kind = source.kind(),
                        error = %source,
                        "backfill aborted: page fetch failed"
                    );
                    return Err(BackfillError::Fetch {
                        kind: self.kind,
                        offset,
                        source,
                    });
                }
            };
            if page.is_empty() {
                break;
            }
            debug!(kind = %self.kind, offset, records = page.len(), "processing page");

            for record in &page {
                let outcome = self.process_record(record).await;
                tally.record(outcome);
                self.sleeper.sleep(self.config.inter_record_delay).await;
            }
            offset += self.config.page_size;
        }

        let report = BackfillReport::from_tally(self.kind, tally, started_at, self.clock.utc());
        info!(
            kind = %self.kind,
            processed = report.processed,
            updated = report.updated,
            failed = report.failed,
            skipped = report.skipped,
            "backfill finished"
        );
        Ok(report)
    }

    async fn process_record(&self, record: &ReferenceRecord) -> RecordOutcome {
        let kind = self.kind;
        let record_id = record.id.as_str();

        let Some(point) = record.point() else {
            warn!(%kind, record_id, "skipping record without a usable location");
            return RecordOutcome::Skipped;
        };

        let components = match self.geocoder.reverse_geocode(point).await {
            Ok(Some(components)) => components,
            Ok(None) => {
                warn!(%kind, record_id, "skipping record: reverse geocode found nothing");
                return RecordOutcome::Skipped;
            }
            Err(err) => {
                warn!(%kind, record_id, error_kind = err.kind(), error = %err, "reverse geocode failed");
                return RecordOutcome::Failed;
            }
        };

        let Some(address) = parse_city(&components) else {
            warn!(%kind, record_id, "skipping record: no city or country in address");
            return RecordOutcome::Skipped;
        };

        let request = CityResolutionRequest::new(address.name, address.country_code, Some(point));
        let city = match self.cities.resolve(&request).await {
            Ok(Some(city)) => city,
            Ok(None) => {
                warn!(%kind, record_id, "city resolution returned no city");
                return RecordOutcome::Failed;
            }
            Err(err) => {
                warn!(%kind, record_id, error_kind = err.kind(), error = %err, "city resolution call failed");
                return RecordOutcome::Failed;
            }
        };

        match self.records.update_record_city(kind, record_id, &city.id).await {
            Ok(true) => {
                debug!(%kind, record_id, city_id = %city.id, "record city updated");
                RecordOutcome::Updated
            }
            Ok(false) => {
                warn!(%kind, record_id, city_id = %city.id, "record update reported failure");
                RecordOutcome::Failed
            }
            Err(err) => {
                warn!(%kind, record_id, error_kind = err.kind(), error = %err, "record update call failed");
                RecordOutcome::Failed
            }
        }
    }
}
