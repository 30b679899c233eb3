//! Periodic recomputation of per-city trending scores.
//!
//! A run walks every city page by page, scores it with the configured
//! [`TrendingScorer`], and writes the score back. A failed write is counted
//! and the run moves on; only a failed listing aborts. Runs share the same
//! single-flight guard as the backfill jobs.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::domain::SingleFlight;
use crate::domain::ports::{CityRepository, CityRepositoryError};

mod scorer;

pub use scorer::{PlanCountScorer, TrendingScorer};

pub const DEFAULT_TRENDING_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_TRENDING_PAGE_SIZE: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendingConfig {
    /// Pause between scheduled runs.
    pub interval: Duration,
    pub page_size: usize,
}

impl Default for TrendingConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_TRENDING_INTERVAL,
            page_size: DEFAULT_TRENDING_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Error)]
pub enum TrendingError {
    #[error("trending recompute is already running")]
    AlreadyRunning,
    #[error("failed to list cities at offset {offset}: {source}")]
    Listing {
        offset: usize,
        #[source]
        source: CityRepositoryError,
    },
}

/// Summary of one recompute run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrendingReport {
    pub updated: u64,
    pub errors: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Single-flight trending score job.
pub struct TrendingScoreScheduler {
    repository: Arc<dyn CityRepository>,
    scorer: Arc<dyn TrendingScorer>,
    clock: Arc<dyn Clock>,
    config: TrendingConfig,
    flight: SingleFlight,
}

impl TrendingScoreScheduler {
    pub fn new(
        repository: Arc<dyn CityRepository>,
        scorer: Arc<dyn TrendingScorer>,
        clock: Arc<dyn Clock>,
        config: TrendingConfig,
    ) -> Self {
        Self {
            repository,
            scorer,
            clock,
            config: TrendingConfig {
                page_size: config.page_size.max(1),
                ..config
            },
            flight: SingleFlight::new(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    pub fn is_running(&self) -> bool {
        self.flight.is_running()
    }

    /// Recompute every city's score once.
    pub async fn run_once(&self) -> Result<TrendingReport, TrendingError> {
        let Some(_guard) = self.flight.try_begin() else {
            warn!("trending recompute already running; ignoring trigger");
            return Err(TrendingError::AlreadyRunning);
        };
        let started_at = self.clock.utc();
        let page_size = self.config.page_size;
        let mut updated = 0_u64;
        let mut errors = 0_u64;
        let mut offset = 0;

        loop {
            let page = self
                .repository
                .list_page(page_size, offset)
                .await
                .map_err(|source| {
                    warn!(offset, error = %source, "trending recompute aborted: listing failed");
                    TrendingError::Listing { offset, source }
                })?;
            let fetched = page.len();

            for city in page {
                let score = self.scorer.score(&city);
                match self.repository.set_trending_score(&city.id, score).await {
                    Ok(()) => updated += 1,
                    Err(err) => {
                        warn!(city_id = %city.id, error = %err, "failed to store trending score");
                        errors += 1;
                    }
                }
            }

            if fetched < page_size {
                break;
            }
            offset += page_size;
        }

        let report = TrendingReport {
            updated,
            errors,
            started_at,
            finished_at: self.clock.utc(),
        };
        info!(updated, errors, "trending recompute finished");
        Ok(report)
    }
}

#[cfg(test)]
mod tests;
