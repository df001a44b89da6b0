//! Reading store contract and an in-memory reference implementation.
//!
//! The pipeline only ever talks to storage through `ReadingStore`. Writes are
//! funnelled through a single `commit` so an ingest batch lands completely
//! or not at all.

use std::collections::BTreeMap;

use crate::types::{EventKind, Reading, SourceSensor, TherapyEvent};

pub type StoreResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Everything one ingest batch wants to write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    /// Upserts keyed by (timestamp, sensor); last writer wins.
    pub readings: Vec<Reading>,
    /// Insert-if-absent keyed by (kind, timestamp).
    pub events: Vec<TherapyEvent>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty() && self.events.is_empty()
    }
}

pub trait ReadingStore {
    fn find_reading(&self, timestamp: i64, sensor: SourceSensor) -> StoreResult<Option<Reading>>;

    /// Valid readings of `sensor` with `from_ms <= timestamp <= to_ms`, oldest first.
    fn readings_between(
        &self,
        sensor: SourceSensor,
        from_ms: i64,
        to_ms: i64,
    ) -> StoreResult<Vec<Reading>>;

    fn find_event(&self, kind: EventKind, timestamp: i64) -> StoreResult<Option<TherapyEvent>>;

    /// Apply a change set atomically.
    fn commit(&mut self, changes: ChangeSet) -> StoreResult<()>;
}

/// `BTreeMap`-backed store. Commit builds the new state aside and swaps it
/// in, so a rejected change set leaves the store untouched.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    readings: BTreeMap<(i64, SourceSensor), Reading>,
    events: BTreeMap<(EventKind, i64), TherapyEvent>,
    commits: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Number of non-empty commits applied so far.
    pub fn commit_count(&self) -> usize {
        self.commits
    }

    pub fn events(&self) -> impl Iterator<Item = &TherapyEvent> {
        self.events.values()
    }

    /// All stored readings, oldest first.
    pub fn readings(&self) -> impl Iterator<Item = &Reading> {
        self.readings.values()
    }

    /// Valid readings of every sensor within `lookback_ms` of `now_ms`, newest first.
    pub fn history(&self, now_ms: i64, lookback_ms: i64) -> Vec<Reading> {
        let from = now_ms.saturating_sub(lookback_ms);
        let mut out: Vec<Reading> = self
            .readings
            .values()
            .filter(|r| r.is_valid && r.timestamp >= from && r.timestamp <= now_ms)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        out
    }
}

impl ReadingStore for MemoryStore {
    fn find_reading(&self, timestamp: i64, sensor: SourceSensor) -> StoreResult<Option<Reading>> {
        Ok(self.readings.get(&(timestamp, sensor)).cloned())
    }

    fn readings_between(
        &self,
        sensor: SourceSensor,
        from_ms: i64,
        to_ms: i64,
    ) -> StoreResult<Vec<Reading>> {
        if from_ms > to_ms {
            return Ok(Vec::new());
        }
        Ok(self
            .readings
            .range((from_ms, SourceSensor::DexcomG5)..=(to_ms, SourceSensor::Unknown))
            .map(|(_, r)| r)
            .filter(|r| r.sensor == sensor && r.is_valid)
            .cloned()
            .collect())
    }

    fn find_event(&self, kind: EventKind, timestamp: i64) -> StoreResult<Option<TherapyEvent>> {
        Ok(self.events.get(&(kind, timestamp)).cloned())
    }

    fn commit(&mut self, changes: ChangeSet) -> StoreResult<()> {
        if changes.is_empty() {
            return Ok(());
        }
        let mut readings = self.readings.clone();
        for r in changes.readings {
            if !r.value.is_finite() {
                return Err(format!(
                    "rejected reading at {} ({}): non-finite value",
                    r.timestamp, r.sensor
                )
                .into());
            }
            readings.insert(r.key(), r);
        }
        let mut events = self.events.clone();
        for e in changes.events {
            events.entry((e.kind, e.timestamp)).or_insert(e);
        }
        self.readings = readings;
        self.events = events;
        self.commits += 1;
        Ok(())
    }
}
