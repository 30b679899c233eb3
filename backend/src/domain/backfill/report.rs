//! Run accounting for backfill jobs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::RecordKind;

/// Terminal outcome of one record within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The record now points at a city.
    Updated,
    /// A downstream call was attempted and did not succeed.
    Failed,
    /// The record was never actionable.
    Skipped,
}

/// Running totals. `processed` always equals the sum of the other three.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillTally {
    pub processed: u64,
    pub updated: u64,
    pub failed: u64,
    pub skipped: u64,
}

impl BackfillTally {
    pub fn record(&mut self, outcome: RecordOutcome) {
        self.processed += 1;
        match outcome {
            RecordOutcome::Updated => self.updated += 1,
            RecordOutcome::Failed => self.failed += 1,
            RecordOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// Summary returned by a completed backfill run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackfillReport {
    pub kind: RecordKind,
    pub processed: u64,
    pub updated: u64,
    pub failed: u64,
    pub skipped: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BackfillReport {
    pub fn from_tally(
        kind: RecordKind,
        tally: BackfillTally,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            processed: tally.processed,
            updated: tally.updated,
            failed: tally.failed,
            skipped: tally.skipped,
            started_at,
            finished_at,
        }
    }
}
