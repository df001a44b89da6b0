//! Common time and rounding helpers for glucose_core.

/// Number of milliseconds in one second.
pub const MILLIS_PER_SEC: i64 = 1_000;
/// Number of milliseconds in one minute.
pub const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SEC;

/// Elapsed minutes from `then_ms` to `now_ms`, unrounded.
#[inline]
pub fn minutes_between(now_ms: i64, then_ms: i64) -> f64 {
    (now_ms - then_ms) as f64 / MILLIS_PER_MINUTE as f64
}

/// Elapsed whole minutes from `then_ms` to `now_ms`, rounded half up.
#[inline]
pub fn whole_minutes_between(now_ms: i64, then_ms: i64) -> i64 {
    (minutes_between(now_ms, then_ms) + 0.5).floor() as i64
}

/// Round to `digits` decimal places, ties away from zero.
/// Non-finite values pass through unchanged; negative zero comes out as 0.0.
#[inline]
pub fn round_to(x: f64, digits: i32) -> f64 {
    if !x.is_finite() {
        return x;
    }
    let p = 10f64.powi(digits);
    (x * p).round() / p + 0.0
}

/// Arithmetic mean, 0 for an empty slice.
#[inline]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_minutes_round_half_up() {
        assert_eq!(whole_minutes_between(150_000, 0), 3); // 2.5 min
        assert_eq!(whole_minutes_between(149_999, 0), 2);
        assert_eq!(whole_minutes_between(13 * MILLIS_PER_MINUTE + 29_999, 0), 13);
        assert_eq!(whole_minutes_between(0, 0), 0);
    }

    #[test]
    fn tiny_negatives_round_to_positive_zero() {
        let r = round_to(-0.004, 2);
        assert_eq!(r, 0.0);
        assert!(r.is_sign_positive());
        assert_eq!(format!("{r:?}"), "0.0");
    }

    #[test]
    fn round_to_digits() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(-1.25, 1), -1.3);
        assert_eq!(round_to(0.125, 2), 0.13);
        assert!(round_to(f64::NAN, 2).is_nan());
    }

    #[test]
    fn mean_of_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[1.0, 2.0, 6.0]), 3.0);
    }
}
