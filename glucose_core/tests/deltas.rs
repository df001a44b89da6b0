use glucose_core::deltas::aggregate;
use glucose_core::types::{Reading, SourceSensor};
use rstest::rstest;

const MINUTE: i64 = 60_000;

fn at(age_ms: i64, value: f64) -> Reading {
    Reading::new(-age_ms, value, SourceSensor::DexcomG6)
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[rstest]
#[case::immediate(5 * MINUTE, 10.0, 10.0, 0.0)]
#[case::short_only(10 * MINUTE, 5.0, 5.0, 0.0)]
#[case::short_edge_of_immediate(15 * MINUTE / 2, 10.0 / 7.5 * 5.0, 10.0 / 7.5 * 5.0, 0.0)]
#[case::long(20 * MINUTE, 0.0, 0.0, 2.5)]
#[case::at_lower_bound(5 * MINUTE / 2, 0.0, 0.0, 0.0)]
#[case::between_short_and_long(35 * MINUTE / 2, 0.0, 0.0, 0.0)]
#[case::beyond_long(85 * MINUTE / 2, 0.0, 0.0, 0.0)]
fn bucket_bounds_are_open(
    #[case] age_ms: i64,
    #[case] delta: f64,
    #[case] short: f64,
    #[case] long: f64,
) {
    let d = aggregate(&[at(0, 100.0), at(age_ms, 90.0)]);
    assert!(close(d.delta, delta), "delta {}", d.delta);
    assert!(close(d.short_avg_delta, short), "short {}", d.short_avg_delta);
    assert!(close(d.long_avg_delta, long), "long {}", d.long_avg_delta);
}

#[rstest]
fn exact_seventeen_and_a_half_does_not_stop_the_scan() {
    let d = aggregate(&[
        at(0, 100.0),
        at(35 * MINUTE / 2, 95.0),
        at(25 * MINUTE, 90.0),
    ]);
    assert!(close(d.long_avg_delta, 2.0));
    assert_eq!(d.short_avg_delta, 0.0);
}

#[rstest]
fn filled_gaps_and_sensor_errors_are_ignored() {
    let mut filled = at(5 * MINUTE, 50.0);
    filled.filled_gap = true;
    let d = aggregate(&[
        at(0, 100.0),
        filled,
        at(6 * MINUTE, 38.0),
        at(10 * MINUTE, 90.0),
    ]);
    assert!(close(d.short_avg_delta, 5.0));
    // immediate bucket empty, falls back to short average
    assert!(close(d.delta, 5.0));
}

#[rstest]
fn single_sample_yields_zero_deltas() {
    let d = aggregate(&[at(0, 123.0)]);
    assert_eq!((d.delta, d.short_avg_delta, d.long_avg_delta), (0.0, 0.0, 0.0));
    let d = aggregate(&[]);
    assert_eq!(d.delta, 0.0);
}

#[rstest]
fn uses_recalculated_values() {
    let mut now = at(0, 100.0);
    now.recalculated = 110.0;
    let d = aggregate(&[now, at(5 * MINUTE, 100.0)]);
    assert!(close(d.delta, 10.0));
}
