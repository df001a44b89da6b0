use glucose_core::mocks::FixedClock;
use glucose_core::types::{Reading, SourceSensor};
use glucose_core::{GlucoseHistory, GlucoseStatusProvider, StatusCfg};
use rstest::{fixture, rstest};

const MINUTE: i64 = 60_000;
const NOW: i64 = 1_700_000_000_000;

/// Newest first on a 5-minute cadence ending at `NOW`.
fn five_minute(values: &[f64]) -> Vec<Reading> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| Reading::new(NOW - (i as i64) * 5 * MINUTE, *v, SourceSensor::DexcomG6))
        .collect()
}

fn history(values: &[f64]) -> GlucoseHistory {
    let r = five_minute(values);
    GlucoseHistory::new(r.clone(), r)
}

#[fixture]
fn provider() -> GlucoseStatusProvider<FixedClock> {
    GlucoseStatusProvider::new(FixedClock(NOW))
}

#[rstest]
fn constant_series_has_no_trend(provider: GlucoseStatusProvider<FixedClock>) {
    let s = provider.glucose_status(&history(&[100.0; 10]), false).unwrap();
    assert_eq!(s.glucose, 100.0);
    assert_eq!(s.delta, 0.0);
    assert_eq!(s.short_avg_delta, 0.0);
    assert_eq!(s.long_avg_delta, 0.0);
    assert_eq!(s.a1, 0.0);
    assert_eq!(s.a2, 0.0);
    assert_eq!(s.dura_isf_minutes, 45.0);
    assert_eq!(s.dura_isf_average, 100.0);
    assert_eq!(s.corr_squ, 0.64);
    assert!(!s.use_1minute_raw);
    assert_eq!(s.date, NOW);
}

#[rstest]
fn linear_ramp_reports_its_slope(provider: GlucoseStatusProvider<FixedClock>) {
    // +2 mg/dL per minute
    let values: Vec<f64> = (0..10).map(|i| 200.0 - 10.0 * i as f64).collect();
    let s = provider.glucose_status(&history(&values), false).unwrap();
    assert_eq!(s.delta, 10.0);
    assert_eq!(s.short_avg_delta, 10.0);
    assert_eq!(s.long_avg_delta, 10.0);
    assert_eq!(s.a1, 10.0);
    assert_eq!(s.a2.abs(), 0.0);
    assert_eq!(s.delta_pn, 10.0);
    assert_eq!(s.delta_pl, 10.0);
    assert_eq!(s.corr_squ, 1.0);
    // 190 sits on the edge of the 5% band around 200
    assert_eq!(s.dura_isf_minutes, 0.0);
}

#[rstest]
fn empty_history_has_no_status(provider: GlucoseStatusProvider<FixedClock>) {
    assert!(provider.glucose_status(&GlucoseHistory::default(), true).is_none());
}

#[rstest]
#[case::fresh(7 * MINUTE, false, true)]
#[case::stale(7 * MINUTE + 1, false, false)]
#[case::stale_but_allowed(60 * MINUTE, true, true)]
fn staleness(#[case] age_ms: i64, #[case] allow_old: bool, #[case] available: bool) {
    let provider = GlucoseStatusProvider::new(FixedClock(NOW + age_ms));
    let got = provider.glucose_status(&history(&[120.0, 118.0, 116.0]), allow_old);
    assert_eq!(got.is_some(), available);
}

#[rstest]
fn stale_threshold_is_configurable() {
    let provider = GlucoseStatusProvider::new(FixedClock(NOW + 10 * MINUTE)).with_status_cfg(
        StatusCfg {
            stale_after_ms: 15 * MINUTE,
            ..StatusCfg::default()
        },
    );
    assert!(provider.glucose_status(&history(&[120.0, 118.0]), false).is_some());
}

#[rstest]
fn single_reading_gives_minimal_status(provider: GlucoseStatusProvider<FixedClock>) {
    let mut r = Reading::new(NOW, 140.0, SourceSensor::DexcomG6);
    r.recalculated = 142.04;
    let s = provider
        .glucose_status(&GlucoseHistory::new(vec![r.clone()], vec![r]), false)
        .unwrap();
    assert_eq!(s.glucose, 142.0);
    assert_eq!(s.dura_isf_average, 140.0);
    assert_eq!((s.delta, s.short_avg_delta, s.long_avg_delta), (0.0, 0.0, 0.0));
    assert_eq!((s.a0, s.a1, s.a2, s.corr_squ), (0.0, 0.0, 0.0, 0.0));
    assert_eq!(
        (s.parabola_minutes, s.delta_pl, s.delta_pn, s.bg_acceleration),
        (0.0, 0.0, 0.0, 0.0)
    );
}

#[rstest]
fn dense_libre_stream_switches_to_raw_fit(provider: GlucoseStatusProvider<FixedClock>) {
    let raw: Vec<Reading> = (0..30)
        .map(|i| Reading::new(NOW - i * MINUTE, 150.0 - i as f64, SourceSensor::Libre2))
        .collect();
    let h = GlucoseHistory::from_readings(&raw);
    let s = provider.glucose_status(&h, false).unwrap();
    assert!(s.use_1minute_raw);
    assert_eq!(s.a1, 5.0);
    assert_eq!(s.delta, 5.0);
}

#[rstest]
fn history_prefers_smoothed_values() {
    let mut a = Reading::new(NOW - MINUTE, 100.0, SourceSensor::Libre2);
    a.smoothed = Some(104.0);
    let mut hidden = Reading::new(NOW - 2 * MINUTE, 90.0, SourceSensor::Libre2);
    hidden.is_valid = false;
    let b = Reading::new(NOW, 101.0, SourceSensor::Libre2);
    let h = GlucoseHistory::from_readings(&[a, hidden, b]);
    assert_eq!(h.bucketed.len(), 2);
    assert_eq!(h.bucketed[0].timestamp, NOW);
    assert_eq!(h.bucketed[1].recalculated, 104.0);
    assert_eq!(h.raw[1].recalculated, 100.0);
}

#[rstest]
fn log_string_mentions_glucose(provider: GlucoseStatusProvider<FixedClock>) {
    let s = provider.glucose_status(&history(&[100.0; 4]), false).unwrap();
    assert!(s.log_string().starts_with("Glucose: 100.0 mg/dl"));
}
