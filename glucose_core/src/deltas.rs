//! Short, immediate and long average deltas over bucketed history.
//!
//! Every usable earlier sample contributes one rate, normalised to mg/dL per
//! 5 minutes, to the bucket its age falls in. Bucket bounds are open
//! intervals on unrounded minutes.

use crate::types::Reading;
use crate::util::{mean, minutes_between};

/// Ages (minutes) strictly inside this interval feed the short average.
pub const SHORT_BUCKET_MIN: (f64, f64) = (2.5, 17.5);
/// Subset of the short bucket reported as `delta`.
pub const IMMEDIATE_BUCKET_MIN: (f64, f64) = (2.5, 7.5);
/// Ages strictly inside this interval feed the long average.
pub const LONG_BUCKET_MIN: (f64, f64) = (17.5, 42.5);

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeltaSummary {
    /// Mean of the immediate bucket, or the short average when it is empty.
    pub delta: f64,
    pub short_avg_delta: f64,
    pub long_avg_delta: f64,
}

#[inline]
fn inside(x: f64, (lo, hi): (f64, f64)) -> bool {
    lo < x && x < hi
}

/// Aggregate deltas over newest-first `data`; `data[0]` is "now".
pub fn aggregate(data: &[Reading]) -> DeltaSummary {
    let Some(now) = data.first() else {
        return DeltaSummary::default();
    };

    let mut immediate = Vec::new();
    let mut short = Vec::new();
    let mut long = Vec::new();

    for then in data.iter().skip(1).filter(|r| r.is_usable()) {
        let minutes_ago = minutes_between(now.timestamp, then.timestamp);
        if minutes_ago >= LONG_BUCKET_MIN.1 {
            break;
        }
        if minutes_ago <= 0.0 {
            continue;
        }
        let avg_delta = (now.recalculated - then.recalculated) / minutes_ago * 5.0;
        tracing::trace!(
            timestamp = then.timestamp,
            minutes_ago,
            recalculated = then.recalculated,
            avg_delta,
            "delta sample"
        );

        if inside(minutes_ago, SHORT_BUCKET_MIN) {
            short.push(avg_delta);
            if inside(minutes_ago, IMMEDIATE_BUCKET_MIN) {
                immediate.push(avg_delta);
            }
        } else if inside(minutes_ago, LONG_BUCKET_MIN) {
            long.push(avg_delta);
        }
    }

    let short_avg_delta = mean(&short);
    let delta = if immediate.is_empty() {
        short_avg_delta
    } else {
        mean(&immediate)
    };
    DeltaSummary {
        delta,
        short_avg_delta,
        long_avg_delta: mean(&long),
    }
}
