//! In-memory stand-in for the venue and event services.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::{Notify, mpsc};

use crate::domain::ports::{ReferenceRecordService, RemoteCallError};
use crate::domain::{CityId, RecordKind, RecordLocation, ReferenceRecord};

fn lock<'a, T>(mutex: &'a Mutex<T>, label: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("{label} mutex poisoned"),
    }
}

/// Record at `[lon, lat]` with no city.
pub fn unresolved_record(id: &str, longitude: f64, latitude: f64) -> ReferenceRecord {
    ReferenceRecord {
        id: id.to_owned(),
        city_id: None,
        location: Some(RecordLocation::point(longitude, latitude)),
    }
}

/// Record without any location.
pub fn record_without_location(id: &str) -> ReferenceRecord {
    ReferenceRecord {
        id: id.to_owned(),
        city_id: None,
        location: None,
    }
}

/// One `fetchUnresolvedRecords` call as observed by the double.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchCall {
    pub kind: RecordKind,
    pub limit: usize,
    pub offset: usize,
}

struct FetchGate {
    entered: mpsc::UnboundedSender<()>,
    release: Arc<Notify>,
}

/// Record service double.
///
/// Pages are cut from the records that were unresolved when seeded, so a
/// city id written during a run does not shift later offsets.
#[derive(Default)]
pub struct InMemoryRecordService {
    seeded: Mutex<HashMap<RecordKind, Vec<ReferenceRecord>>>,
    assigned: Mutex<HashMap<(RecordKind, String), CityId>>,
    fetch_calls: Mutex<Vec<FetchCall>>,
    failing_offsets: Mutex<HashSet<usize>>,
    rejected_updates: Mutex<HashSet<String>>,
    erroring_updates: Mutex<HashSet<String>>,
    gate: Mutex<Option<FetchGate>>,
}

impl InMemoryRecordService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(self, kind: RecordKind, records: Vec<ReferenceRecord>) -> Self {
        lock(&self.seeded, "seeded")
            .entry(kind)
            .or_default()
            .extend(records);
        self
    }

    /// Fail the page fetch at `offset` with a transport error.
    pub fn fail_fetch_at(self, offset: usize) -> Self {
        lock(&self.failing_offsets, "failing offsets").insert(offset);
        self
    }

    /// Answer `success: false` when updating `record_id`.
    pub fn reject_update_of(self, record_id: &str) -> Self {
        lock(&self.rejected_updates, "rejected updates").insert(record_id.to_owned());
        self
    }

    /// Fail with a transport error when updating `record_id`.
    pub fn error_on_update_of(self, record_id: &str) -> Self {
        lock(&self.erroring_updates, "erroring updates").insert(record_id.to_owned());
        self
    }

    /// Park the next fetch until `release` is notified; signal on `entered`.
    pub fn gate_next_fetch(&self, entered: mpsc::UnboundedSender<()>, release: Arc<Notify>) {
        *lock(&self.gate, "gate") = Some(FetchGate { entered, release });
    }

    pub fn fetch_calls(&self) -> Vec<FetchCall> {
        lock(&self.fetch_calls, "fetch calls").clone()
    }

    pub fn city_of(&self, kind: RecordKind, record_id: &str) -> Option<CityId> {
        lock(&self.assigned, "assigned")
            .get(&(kind, record_id.to_owned()))
            .copied()
    }

    pub fn assigned_count(&self) -> usize {
        lock(&self.assigned, "assigned").len()
    }
}

#[async_trait]
impl ReferenceRecordService for InMemoryRecordService {
    async fn fetch_unresolved(
        &self,
        kind: RecordKind,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ReferenceRecord>, RemoteCallError> {
        lock(&self.fetch_calls, "fetch calls").push(FetchCall {
            kind,
            limit,
            offset,
        });
        let gate = lock(&self.gate, "gate").take();
        if let Some(gate) = gate {
            let _ = gate.entered.send(());
            gate.release.notified().await;
        }
        if lock(&self.failing_offsets, "failing offsets").contains(&offset) {
            return Err(RemoteCallError::transport(format!(
                "{kind} service unreachable at offset {offset}"
            )));
        }
        let seeded = lock(&self.seeded, "seeded");
        Ok(seeded
            .get(&kind)
            .map(|records| records.iter().skip(offset).take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn update_record_city(
        &self,
        kind: RecordKind,
        record_id: &str,
        city_id: &CityId,
    ) -> Result<bool, RemoteCallError> {
        if lock(&self.erroring_updates, "erroring updates").contains(record_id) {
            return Err(RemoteCallError::timeout(format!("updating {record_id}")));
        }
        if lock(&self.rejected_updates, "rejected updates").contains(record_id) {
            return Ok(false);
        }
        lock(&self.assigned, "assigned").insert((kind, record_id.to_owned()), *city_id);
        Ok(true)
    }
}
