//! Adaptive quadratic regression over recent glucose history.
//!
//! Fits `y = a·t² + b·t + c` by least squares while scanning backwards from
//! the newest sample, one sample at a time. Every prefix long enough to be
//! meaningful is solved and scored by its coefficient of determination; the
//! best-scoring prefix wins, ties going to the longer one. The look-back
//! therefore adapts to data quality on its own: a clock gap or an error
//! sentinel simply ends the scan.
//!
//! Axes are rescaled for conditioning: `t` counts 5-minute units relative to
//! the newest sample (0, -1, -2, ...) and `y` is glucose / 50, which keeps
//! both axes of similar magnitude across the usual glucose range.
//!
//! The normal equations are accumulated as running power sums and solved with
//! Cramer's rule, so each additional sample costs O(1) to add and O(n) to
//! score.

use crate::config::RegressionCfg;
use crate::types::{Reading, SENSOR_ERROR_MAX_MGDL};
use crate::util::MILLIS_PER_SEC;

/// Seconds per unit of the time axis.
pub const SCALE_TIME_S: f64 = 300.0;
/// mg/dL per unit of the glucose axis.
pub const SCALE_BG: f64 = 50.0;
/// Score given to a fit over a perfectly flat series, where R² is undefined.
pub const FLAT_R_SQUARED: f64 = 0.64;

/// Extrapolation step for the last/next deltas: 5 minutes in time units.
const DELTA_5MIN: f64 = 5.0 * 60.0 / SCALE_TIME_S;

/// Which history the fit ran on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitMode {
    /// Unsmoothed 1-minute sensor values.
    HighFrequencyRaw,
    /// Smoothed, bucketed 5-minute values.
    #[default]
    StandardSmoothed,
}

impl FitMode {
    pub fn min_fit_minutes(self, cfg: &RegressionCfg) -> f64 {
        match self {
            Self::HighFrequencyRaw => cfg.min_fit_min_high_frequency,
            Self::StandardSmoothed => cfg.min_fit_min_standard,
        }
    }
}

/// Best parabola found by the scan, in mg/dL and minutes.
///
/// All-zero coefficients mean no usable fit; `minutes` still reports how far
/// back the scan got.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParabolaFit {
    /// Look-back covered by the winning fit (minutes, positive).
    pub minutes: f64,
    /// Fitted change over the 5 minutes ending now (mg/dL).
    pub delta_last: f64,
    /// Fitted change over the next 5 minutes (mg/dL).
    pub delta_next: f64,
    /// Second derivative, mg/dL per (5 min)².
    pub acceleration: f64,
    pub a0: f64,
    pub a1: f64,
    pub a2: f64,
    /// Coefficient of determination of the winning fit.
    pub r_squared: f64,
}

impl ParabolaFit {
    /// Convert scaled coefficients into the reported quantities.
    fn from_scaled(a: f64, b: f64, c: f64, r_squared: f64, minutes: f64) -> Self {
        Self {
            minutes,
            delta_last: -SCALE_BG * (a * DELTA_5MIN.powi(2) - b * DELTA_5MIN),
            delta_next: SCALE_BG * (a * DELTA_5MIN.powi(2) + b * DELTA_5MIN),
            acceleration: 2.0 * a * SCALE_BG,
            a0: c * SCALE_BG,
            a1: b * SCALE_BG,
            a2: a * SCALE_BG,
            r_squared,
        }
    }

    fn degenerate(minutes: f64) -> Self {
        Self {
            minutes,
            ..Self::default()
        }
    }
}

/// Running sums for the 3×3 normal equations.
#[derive(Debug, Clone, Copy, Default)]
struct PowerSums {
    n: f64,
    st: f64,
    st2: f64,
    st3: f64,
    st4: f64,
    sy: f64,
    sty: f64,
    st2y: f64,
}

impl PowerSums {
    fn push(&mut self, t: f64, y: f64) {
        let t2 = t * t;
        self.n += 1.0;
        self.st += t;
        self.st2 += t2;
        self.st3 += t2 * t;
        self.st4 += t2 * t2;
        self.sy += y;
        self.sty += t * y;
        self.st2y += t2 * y;
    }

    /// Solve for (a, b, c) with Cramer's rule. `None` when the system is singular.
    fn solve(&self) -> Option<(f64, f64, f64)> {
        let Self {
            n,
            st,
            st2,
            st3,
            st4,
            sy,
            sty,
            st2y,
        } = *self;
        let det_h =
            st4 * (st2 * n - st * st) - st3 * (st3 * n - st * st2) + st2 * (st3 * st - st2 * st2);
        if det_h == 0.0 || !det_h.is_finite() {
            return None;
        }
        let det_a =
            st2y * (st2 * n - st * st) - sty * (st3 * n - st * st2) + sy * (st3 * st - st2 * st2);
        let det_b = st4 * (sty * n - sy * st) - st3 * (st2y * n - sy * st2)
            + st2 * (st2y * st - sty * st2);
        let det_c = st4 * (st2 * sy - st * sty) - st3 * (st3 * sy - st * st2y)
            + st2 * (st3 * sty - st2 * st2y);
        Some((det_a / det_h, det_b / det_h, det_c / det_h))
    }

    fn mean_y(&self) -> f64 {
        self.sy / self.n
    }
}

/// R² of `y = a·t² + b·t + c` over `points`.
fn r_squared(points: &[(f64, f64)], y_mean: f64, a: f64, b: f64, c: f64) -> f64 {
    let mut ss_tot = 0.0;
    let mut ss_res = 0.0;
    for &(t, y) in points {
        ss_tot += (y - y_mean).powi(2);
        ss_res += (y - (a * t * t + b * t + c)).powi(2);
    }
    if ss_tot == 0.0 {
        FLAT_R_SQUARED
    } else {
        1.0 - ss_res / ss_tot
    }
}

/// Pick raw 1-minute mode when the newest raw readings come from a
/// high-frequency sensor and the newest and third-newest are less than
/// `high_frequency_span_min` apart.
pub fn select_mode(raw: &[Reading], cfg: &RegressionCfg) -> FitMode {
    if raw.len() > 2
        && raw[0].sensor.is_high_frequency()
        && ((raw[0].timestamp - raw[2].timestamp) as f64)
            < cfg.high_frequency_span_min * 60.0 * MILLIS_PER_SEC as f64
    {
        FitMode::HighFrequencyRaw
    } else {
        FitMode::StandardSmoothed
    }
}

/// Fit a parabola to newest-first `samples`.
///
/// In `HighFrequencyRaw` mode the sensor `value` is fitted; otherwise the
/// `recalculated` value. Filled gaps are skipped in both modes. The scan stops past
/// `max_lookback_min`, and ends early at a gap longer than `max_gap_min`
/// between accepted samples or at an error sentinel.
pub fn fit(samples: &[Reading], mode: FitMode, cfg: &RegressionCfg) -> ParabolaFit {
    let Some(first) = samples.first() else {
        return ParabolaFit::default();
    };
    let time0 = first.timestamp;
    let min_fit = mode.min_fit_minutes(cfg);
    let max_gap_units = cfg.max_gap_min * 60.0 / SCALE_TIME_S;

    let mut sums = PowerSums::default();
    let mut points: Vec<(f64, f64)> = Vec::with_capacity(samples.len().min(64));
    let mut t_last = 0.0;
    let mut best: Option<ParabolaFit> = None;

    for s in samples {
        if s.filled_gap {
            continue;
        }
        let t = (s.timestamp - time0) as f64 / MILLIS_PER_SEC as f64 / SCALE_TIME_S;
        let age_min = -t * SCALE_TIME_S / 60.0;
        if age_min > cfg.max_lookback_min {
            break;
        }
        let bg = match mode {
            FitMode::HighFrequencyRaw => s.value,
            FitMode::StandardSmoothed => s.recalculated,
        };
        if bg <= SENSOR_ERROR_MAX_MGDL || s.value <= SENSOR_ERROR_MAX_MGDL {
            tracing::debug!(timestamp = s.timestamp, bg, "fit scan stopped at sensor error");
            break;
        }
        if t < t_last - max_gap_units {
            tracing::debug!(timestamp = s.timestamp, age_min, "fit scan stopped at gap");
            break;
        }
        t_last = t;
        let y = bg / SCALE_BG;
        sums.push(t, y);
        points.push((t, y));

        if points.len() > 3 && age_min > min_fit {
            let Some((a, b, c)) = sums.solve() else {
                continue;
            };
            let r2 = r_squared(&points, sums.mean_y(), a, b, c);
            if best.is_none_or(|f| r2 >= f.r_squared) {
                best = Some(ParabolaFit::from_scaled(a, b, c, r2, age_min));
            }
        }
    }

    best.unwrap_or_else(|| ParabolaFit::degenerate(-t_last * SCALE_TIME_S / 60.0))
}
