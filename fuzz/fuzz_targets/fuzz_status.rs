#![no_main]
use glucose_core::mocks::FixedClock;
use glucose_core::types::{IncomingReading, SourceSensor};
use glucose_core::{GlucoseHistory, IngestBatch, MemoryStore, PipelineCfg};
use libfuzzer_sys::arbitrary::{self, Arbitrary};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Sample {
    /// Offset from the previous sample, in seconds.
    step_s: u16,
    /// Tenths of mg/dL; covers sensor error codes through the top of the range.
    value: u16,
    libre: bool,
    filled_gap: bool,
}

#[derive(Debug, Arbitrary)]
struct Input {
    samples: Vec<Sample>,
    now_offset_s: u16,
    allow_old: bool,
}

fuzz_target!(|input: Input| {
    let mut ts = 1_700_000_000_000i64;
    let readings: Vec<IncomingReading> = input
        .samples
        .iter()
        .take(500)
        .map(|s| {
            ts += i64::from(s.step_s) * 1000;
            let sensor = if s.libre {
                SourceSensor::Libre2
            } else {
                SourceSensor::DexcomG6
            };
            IncomingReading::new(ts, f64::from(s.value % 6000) / 10.0, sensor)
                .with_filled_gap(s.filled_gap)
        })
        .collect();

    let cfg = PipelineCfg::default();
    let mut store = MemoryStore::new();
    if cfg
        .ingestor()
        .ingest(&mut store, &IngestBatch::from_readings(readings))
        .is_err()
    {
        return;
    }
    // Smoothed values must stay finite whatever the input
    for r in store.readings() {
        if let Some(s) = r.smoothed {
            assert!(s.is_finite(), "non-finite smoothed value {s}");
        }
    }

    let now = ts + i64::from(input.now_offset_s) * 1000;
    let history = GlucoseHistory::from_readings(&store.history(now, 24 * 60 * 60 * 1000));
    if let Some(status) = cfg
        .status_provider(FixedClock(now))
        .glucose_status(&history, input.allow_old)
    {
        assert!(status.glucose.is_finite());
        assert_eq!(status.noise, 0.0);
    }
});
