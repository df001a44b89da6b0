use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use glucose_core::mocks::FixedClock;
use glucose_core::regression::{FitMode, fit};
use glucose_core::smoothing::smooth;
use glucose_core::types::{IncomingReading, Reading, SourceSensor};
use glucose_core::{
    GlucoseHistory, GlucoseStatusProvider, IngestBatch, Ingestor, MemoryStore, RegressionCfg,
    SmoothingCfg,
};

const MINUTE: i64 = 60_000;
const NOW: i64 = 1_700_000_000_000;

// Synthetic 1-minute CGM trace, newest first: slow sine with additive noise
fn synth_trace(n: usize, noise_mgdl: f64, seed: u32) -> Vec<Reading> {
    // tiny PRNG
    let mut state = seed.max(1);
    let mut next_f64 = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        f64::from(x) / (f64::from(u32::MAX) + 1.0)
    };
    (0..n)
        .map(|i| {
            let t = i as f64 / 60.0;
            let noise = (next_f64() * 2.0 - 1.0) * noise_mgdl;
            let v = 140.0 + 40.0 * t.sin() + noise;
            Reading::new(NOW - i as i64 * MINUTE, v, SourceSensor::Libre2)
        })
        .collect()
}

fn group_from_env<'a>(
    c: &'a mut Criterion,
    name: &str,
) -> criterion::BenchmarkGroup<'a, criterion::measurement::WallTime> {
    let mut g = c.benchmark_group(name);
    // BENCH_SAMPLE_SIZE=10 BENCH_MEAS_MS=50 cargo bench -p glucose_core --bench pipeline
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE") {
        if let Ok(n) = ss.parse::<usize>() {
            g.sample_size(n.max(10));
        }
    } else {
        g.sample_size(50);
    }
    if let Ok(ms) = std::env::var("BENCH_MEAS_MS")
        && let Ok(ms_u64) = ms.parse::<u64>()
    {
        g.measurement_time(std::time::Duration::from_millis(ms_u64));
    }
    g
}

pub fn bench_smoothing(c: &mut Criterion) {
    let mut g = group_from_env(c, "smoothing");
    let cfg = SmoothingCfg::default();
    for &noise in &[2.0f64, 8.0] {
        let trace = synth_trace(125, noise, 0xC0FFEE);
        g.bench_function(format!("window_125_noise_{noise}"), |b| {
            b.iter_batched(
                || trace.clone(),
                |mut r| {
                    let outcome = smooth(black_box(&mut r), &cfg);
                    black_box(outcome);
                },
                BatchSize::SmallInput,
            )
        });
    }
    g.finish();
}

pub fn bench_regression(c: &mut Criterion) {
    let mut g = group_from_env(c, "regression");
    let cfg = RegressionCfg::default();
    let trace = synth_trace(60, 4.0, 0xBADC0DE);
    g.bench_function("raw_1min_fit", |b| {
        b.iter(|| black_box(fit(black_box(&trace), FitMode::HighFrequencyRaw, &cfg)))
    });
    let five: Vec<Reading> = trace.iter().step_by(5).cloned().collect();
    g.bench_function("standard_5min_fit", |b| {
        b.iter(|| black_box(fit(black_box(&five), FitMode::StandardSmoothed, &cfg)))
    });
    g.finish();
}

pub fn bench_pipeline(c: &mut Criterion) {
    let mut g = group_from_env(c, "pipeline");
    let trace = synth_trace(180, 4.0, 0x5EED);
    let batch = IngestBatch::from_readings(
        trace
            .iter()
            .map(|r| IncomingReading::new(r.timestamp, r.value, r.sensor))
            .collect(),
    );
    let ingestor = Ingestor::default();
    g.bench_function("ingest_180", |b| {
        b.iter_batched(
            MemoryStore::new,
            |mut store| {
                let res = ingestor.ingest(&mut store, black_box(&batch));
                black_box(res.is_ok());
            },
            BatchSize::SmallInput,
        )
    });

    let history = GlucoseHistory::from_readings(&trace);
    let provider = GlucoseStatusProvider::new(FixedClock(NOW));
    g.bench_function("status", |b| {
        b.iter(|| black_box(provider.glucose_status(black_box(&history), false)))
    });
    g.finish();
}

criterion_group!(benches, bench_smoothing, bench_regression, bench_pipeline);
criterion_main!(benches);
