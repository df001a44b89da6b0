//! Test and helper mocks for glucose_core

use glucose_traits::{ActivityMonitor, Clock};

use crate::store::{ChangeSet, ReadingStore, StoreResult};
use crate::types::{EventKind, Reading, SourceSensor, TherapyEvent};

/// Clock frozen at a fixed epoch-ms instant.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.0
    }
}

/// Activity monitor returning canned answers; steps scale with the window.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedActivity {
    pub steps_per_minute: u32,
    pub phone_moved: bool,
}

impl ActivityMonitor for FixedActivity {
    fn recent_steps(&self, minutes: u32) -> u32 {
        self.steps_per_minute.saturating_mul(minutes)
    }

    fn phone_moved(&self) -> bool {
        self.phone_moved
    }
}

/// A store whose every operation fails with `message`; useful for driving
/// error paths in ingest.
#[derive(Debug, Clone)]
pub struct FailingStore {
    pub message: String,
}

impl FailingStore {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    fn fail<T>(&self) -> StoreResult<T> {
        Err(Box::new(std::io::Error::other(self.message.clone())))
    }
}

impl ReadingStore for FailingStore {
    fn find_reading(&self, _timestamp: i64, _sensor: SourceSensor) -> StoreResult<Option<Reading>> {
        self.fail()
    }

    fn readings_between(
        &self,
        _sensor: SourceSensor,
        _from_ms: i64,
        _to_ms: i64,
    ) -> StoreResult<Vec<Reading>> {
        self.fail()
    }

    fn find_event(&self, _kind: EventKind, _timestamp: i64) -> StoreResult<Option<TherapyEvent>> {
        self.fail()
    }

    fn commit(&mut self, _changes: ChangeSet) -> StoreResult<()> {
        self.fail()
    }
}
