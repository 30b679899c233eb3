//! Shared HTTP adapter state.
//!
//! Handlers accept this via `actix_web::web::Data` so they only depend on
//! domain services and remain testable without I/O.

use std::sync::Arc;

use crate::domain::{
    BackfillCoordinator, CityImageEnricher, CityResolutionGateway, RecordKind,
    TrendingScoreScheduler,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub cities: Arc<CityResolutionGateway>,
    pub enricher: Arc<CityImageEnricher>,
    pub venue_backfill: Arc<BackfillCoordinator>,
    pub event_backfill: Arc<BackfillCoordinator>,
    pub trending: Arc<TrendingScoreScheduler>,
}

impl HttpState {
    /// Coordinator responsible for `kind`.
    pub fn backfill_for(&self, kind: RecordKind) -> &Arc<BackfillCoordinator> {
        match kind {
            RecordKind::Venues => &self.venue_backfill,
            RecordKind::Events => &self.event_backfill,
        }
    }
}
