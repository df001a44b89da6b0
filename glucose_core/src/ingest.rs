//! Ingest & reconciliation of CGM batches.
//!
//! Every incoming sample is reconciled against what the store (and the batch
//! so far) already holds: new samples are inserted, materially changed ones
//! updated, and samples that only gained an annotation id get that field
//! patched. High-frequency samples are smoothed against the preceding
//! 125 minutes of the same sensor, and the smoothed tail of that window is
//! staged as well. Changes land in the store in atomic commits of at most
//! `max_batch` readings.

use std::collections::{BTreeMap, BTreeSet};

use eyre::WrapErr;

use crate::config::{IngestCfg, SmoothingCfg};
use crate::error::Result;
use crate::smoothing::smooth;
use crate::store::{ChangeSet, ReadingStore};
use crate::store_error::map_store_error;
use crate::types::{
    Calibration, EventKind, GlucoseUnit, IncomingReading, Reading, SourceSensor, TherapyEvent,
};

type Key = (i64, SourceSensor);

/// One delivery from a CGM source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestBatch {
    pub readings: Vec<IncomingReading>,
    pub calibrations: Vec<Calibration>,
    /// Epoch ms of a sensor insertion reported with this batch.
    pub sensor_insertion: Option<i64>,
}

impl IngestBatch {
    pub fn from_readings(readings: Vec<IncomingReading>) -> Self {
        Self {
            readings,
            ..Self::default()
        }
    }
}

/// What an ingest run changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestResult {
    pub inserted: Vec<Reading>,
    pub updated: Vec<Reading>,
    /// Existing readings whose only change was a newly supplied annotation id.
    pub updated_nightscout_id: Vec<Reading>,
    /// Readings outside the batch whose smoothed value was rewritten.
    pub resmoothed: Vec<Reading>,
    pub calibrations_inserted: Vec<TherapyEvent>,
    pub sensor_insertions_inserted: Vec<TherapyEvent>,
    /// Samples dropped for a non-finite value or timestamp outside the epoch range.
    pub skipped: usize,
}

impl IngestResult {
    /// True when the run wrote nothing.
    pub fn is_noop(&self) -> bool {
        self.inserted.is_empty()
            && self.updated.is_empty()
            && self.updated_nightscout_id.is_empty()
            && self.resmoothed.is_empty()
            && self.calibrations_inserted.is_empty()
            && self.sensor_insertions_inserted.is_empty()
    }
}

/// Reconciles batches into a `ReadingStore`.
#[derive(Debug, Clone, Default)]
pub struct Ingestor {
    smoothing: SmoothingCfg,
    limits: IngestCfg,
}

impl Ingestor {
    pub fn new(smoothing: SmoothingCfg, limits: IngestCfg) -> Self {
        Self { smoothing, limits }
    }

    pub fn smoothing_cfg(&self) -> &SmoothingCfg {
        &self.smoothing
    }

    /// Reconcile `batch` into `store`.
    ///
    /// Readings are processed oldest first and committed in chunks of at
    /// most `max_batch`; each chunk lands atomically and events go with the
    /// last one. Re-ingesting a batch that is already stored commits nothing.
    pub fn ingest<S: ReadingStore>(&self, store: &mut S, batch: &IngestBatch) -> Result<IngestResult> {
        let mut result = IngestResult::default();
        let mut touched: BTreeSet<Key> = BTreeSet::new();
        let mut resmoothed: BTreeMap<Key, Reading> = BTreeMap::new();

        let mut incoming: Vec<&IncomingReading> = batch.readings.iter().collect();
        incoming.sort_by_key(|r| r.timestamp);

        let chunk_len = self.limits.max_batch.max(1);
        let mut chunks: Vec<&[&IncomingReading]> = incoming.chunks(chunk_len).collect();
        if chunks.is_empty() {
            chunks.push(&[]);
        }
        if chunks.len() > 1 {
            tracing::info!(
                readings = incoming.len(),
                chunks = chunks.len(),
                max_batch = chunk_len,
                "splitting batch"
            );
        }

        let last = chunks.len() - 1;
        let mut commits = 0usize;
        for (i, chunk) in chunks.into_iter().enumerate() {
            let staged =
                self.stage_readings(store, chunk, &mut result, &mut touched, &mut resmoothed)?;
            let events = if i == last {
                self.stage_events(store, batch, &mut result)?
            } else {
                Vec::new()
            };
            let changes = ChangeSet {
                readings: staged.into_values().collect(),
                events,
            };
            if changes.is_empty() {
                continue;
            }
            store
                .commit(changes)
                .map_err(|e| eyre::Report::new(map_store_error(&*e)))
                .wrap_err("committing ingest batch")?;
            commits += 1;
        }

        result.resmoothed = resmoothed
            .into_iter()
            .filter(|(k, _)| !touched.contains(k))
            .map(|(_, r)| r)
            .collect();

        if commits == 0 {
            tracing::debug!(samples = batch.readings.len(), "batch already stored");
            return Ok(result);
        }
        tracing::info!(
            inserted = result.inserted.len(),
            updated = result.updated.len(),
            annotated = result.updated_nightscout_id.len(),
            resmoothed = result.resmoothed.len(),
            calibrations = result.calibrations_inserted.len(),
            sensor_insertions = result.sensor_insertions_inserted.len(),
            skipped = result.skipped,
            commits,
            "ingest committed"
        );
        Ok(result)
    }

    /// Stage one oldest-first chunk of samples; returns the changes to commit.
    fn stage_readings<S: ReadingStore>(
        &self,
        store: &S,
        chunk: &[&IncomingReading],
        result: &mut IngestResult,
        touched: &mut BTreeSet<Key>,
        resmoothed: &mut BTreeMap<Key, Reading>,
    ) -> Result<BTreeMap<Key, Reading>> {
        let mut staged: BTreeMap<Key, Reading> = BTreeMap::new();

        for &sample in chunk {
            if !sample.value.is_finite() || sample.timestamp < 0 {
                tracing::warn!(
                    timestamp = sample.timestamp,
                    value = sample.value,
                    "skipping malformed sample"
                );
                result.skipped += 1;
                continue;
            }
            let key = (sample.timestamp, sample.sensor);
            let current = match staged.get(&key) {
                Some(r) => Some(r.clone()),
                None => store
                    .find_reading(sample.timestamp, sample.sensor)
                    .map_err(|e| eyre::Report::new(map_store_error(&*e)))
                    .wrap_err("looking up reading")?,
            };

            let mut reading = sample.to_reading();
            if let Some(cur) = &current {
                if reading.nightscout_id.is_none() {
                    reading.nightscout_id = cur.nightscout_id.clone();
                }
                // user invalidation survives re-delivery
                reading.is_valid = cur.is_valid;

                let mut candidate = reading.clone();
                candidate.smoothed = cur.smoothed;
                if candidate.content_equals(cur) {
                    if cur.nightscout_id.is_none() && sample.nightscout_id.is_some() {
                        let mut patched = cur.clone();
                        patched.nightscout_id = sample.nightscout_id.clone();
                        tracing::debug!(timestamp = key.0, sensor = %key.1, "annotation id patched");
                        result.updated_nightscout_id.push(patched.clone());
                        staged.insert(key, patched);
                    }
                    continue;
                }
            }

            if reading.filled_gap {
                tracing::debug!(timestamp = key.0, sensor = %key.1, "stored gap placeholder");
            } else {
                let mut window = self.window_for(store, &staged, &reading)?;
                let before: Vec<Option<f64>> = window.iter().map(|r| r.smoothed).collect();
                let outcome = smooth(&mut window, &self.smoothing);
                tracing::debug!(
                    timestamp = key.0,
                    sensor = %key.1,
                    value = reading.value,
                    window = window.len(),
                    ?outcome,
                    "ingested sample"
                );
                reading.smoothed = window[0].smoothed;

                for (r, old) in window.iter().zip(&before).take(outcome.written()).skip(1) {
                    if r.smoothed != *old {
                        resmoothed.insert(r.key(), r.clone());
                        staged.insert(r.key(), r.clone());
                    }
                }
            }

            match current {
                None => result.inserted.push(reading.clone()),
                Some(_) => result.updated.push(reading.clone()),
            }
            touched.insert(key);
            staged.insert(key, reading);
        }
        Ok(staged)
    }

    /// Newest-first smoothing window ending at `reading`: stored readings of
    /// the same sensor within the look-back, overlaid with staged changes.
    /// Gap placeholders are left out, so a filled minute reads as a clock gap.
    fn window_for<S: ReadingStore>(
        &self,
        store: &S,
        staged: &BTreeMap<Key, Reading>,
        reading: &Reading,
    ) -> Result<Vec<Reading>> {
        let from = reading.timestamp.saturating_sub(self.smoothing.lookback_ms);
        let mut by_ts: BTreeMap<i64, Reading> = store
            .readings_between(reading.sensor, from, reading.timestamp)
            .map_err(|e| eyre::Report::new(map_store_error(&*e)))
            .wrap_err("loading smoothing window")?
            .into_iter()
            .filter(|r| !r.filled_gap)
            .map(|r| (r.timestamp, r))
            .collect();
        for ((ts, sensor), r) in staged.range((from, SourceSensor::DexcomG5)..=(reading.timestamp, SourceSensor::Unknown)) {
            if *sensor != reading.sensor {
                continue;
            }
            if r.is_valid && !r.filled_gap {
                by_ts.insert(*ts, r.clone());
            } else {
                by_ts.remove(ts);
            }
        }
        by_ts.insert(reading.timestamp, reading.clone());
        Ok(by_ts.into_values().rev().collect())
    }

    fn stage_events<S: ReadingStore>(
        &self,
        store: &S,
        batch: &IngestBatch,
        result: &mut IngestResult,
    ) -> Result<Vec<TherapyEvent>> {
        let mut seen: BTreeSet<(EventKind, i64)> = BTreeSet::new();
        let mut events = Vec::new();

        let wanted = batch
            .calibrations
            .iter()
            .map(|c| TherapyEvent {
                timestamp: c.timestamp,
                kind: EventKind::FingerStickBgValue,
                glucose: Some(c.value),
                glucose_unit: c.glucose_unit,
            })
            .chain(batch.sensor_insertion.map(|ts| TherapyEvent {
                timestamp: ts,
                kind: EventKind::SensorChange,
                glucose: None,
                glucose_unit: GlucoseUnit::MgDl,
            }));

        for event in wanted {
            let key = (event.kind, event.timestamp);
            if !seen.insert(key) {
                tracing::warn!(kind = ?event.kind, timestamp = event.timestamp, "duplicate event in batch");
                continue;
            }
            let exists = store
                .find_event(event.kind, event.timestamp)
                .map_err(|e| eyre::Report::new(map_store_error(&*e)))
                .wrap_err("looking up therapy event")?
                .is_some();
            if exists {
                continue;
            }
            match event.kind {
                EventKind::FingerStickBgValue => result.calibrations_inserted.push(event.clone()),
                EventKind::SensorChange => result.sensor_insertions_inserted.push(event.clone()),
            }
            events.push(event);
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn staged_invalid_reading_leaves_the_window() {
        let ing = Ingestor::default();
        let store = MemoryStore::new();
        let mut staged = BTreeMap::new();
        let mut hidden = Reading::new(60_000, 100.0, SourceSensor::Libre2);
        hidden.is_valid = false;
        staged.insert(hidden.key(), hidden);
        staged.insert((0, SourceSensor::Libre2), Reading::new(0, 99.0, SourceSensor::Libre2));
        staged.insert((0, SourceSensor::DexcomG6), Reading::new(0, 150.0, SourceSensor::DexcomG6));
        let newest = Reading::new(120_000, 101.0, SourceSensor::Libre2);
        let w = ing.window_for(&store, &staged, &newest).unwrap();
        let ts: Vec<i64> = w.iter().map(|r| r.timestamp).collect();
        assert_eq!(ts, vec![120_000, 0]);
    }
}
