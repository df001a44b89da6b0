//! Double-exponential smoothing for high-frequency sensor streams.
//!
//! A weighted blend of first-order exponential smoothing (fast to follow a
//! change, noisy) and second-order smoothing (trend aware, slower to react).
//! The window only covers the unbroken run of valid readings ending at the
//! newest one: a clock gap or a sensor error sentinel truncates it.
//!
//! Estimation error is largest at the window edges, so only the newest
//! `update_window` blended values are written back.
//!
//! Eligibility is decided by the sensor of the newest reading. Ingest builds
//! every window from a single sensor stream, so a sensor swap starts a fresh
//! window rather than smoothing across the change.

use crate::config::SmoothingCfg;
use crate::types::{Reading, SENSOR_ERROR_MAX_MGDL};
use crate::util::minutes_between;

/// Smallest value ever written to `Reading::smoothed`; lower values are
/// sensor error codes downstream.
pub const SMOOTHED_FLOOR_MGDL: f64 = 40.0;

/// What a smoothing pass did to the readings it was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmoothingOutcome {
    /// Not a high-frequency stream, fewer than two readings, or the newest
    /// two are too far apart. Nothing was written.
    PassThrough,
    /// Blended values written to the newest `written` readings.
    Smoothed { window: usize, written: usize },
    /// The valid window was too short; raw values (floored) were copied into
    /// the newest `written` readings instead.
    InsufficientData { window: usize, written: usize },
}

impl SmoothingOutcome {
    pub fn written(&self) -> usize {
        match *self {
            Self::PassThrough => 0,
            Self::Smoothed { written, .. } | Self::InsufficientData { written, .. } => written,
        }
    }
}

/// Length of the valid smoothing window over newest-first `readings`.
///
/// Starts at `cfg.window` (or one less than the number of readings, so there
/// is always an older reading to compare against) and shrinks at the first
/// gap, keeping the newer reading, or at the first error sentinel, dropping it.
pub fn valid_window(readings: &[Reading], cfg: &SmoothingCfg) -> usize {
    let mut window = cfg.window;
    if readings.len() <= window {
        window = readings.len().saturating_sub(1);
    }
    for i in 0..window {
        if minutes_between(readings[i].timestamp, readings[i + 1].timestamp) > cfg.max_gap_min {
            return i + 1;
        }
        if readings[i].value <= SENSOR_ERROR_MAX_MGDL {
            return i;
        }
    }
    window
}

/// Blend first- and second-order exponential smoothing over newest-first
/// `values`. Returns one blended value per input, newest first.
///
/// `values` must hold at least two entries.
pub fn blend(values: &[f64], cfg: &SmoothingCfg) -> Vec<f64> {
    let w = values.len();
    debug_assert!(w >= 2, "blend needs at least two values");
    let oldest = w - 1;

    // First order, seeded with the oldest value
    let mut first = vec![0.0; w];
    let mut level = values[oldest];
    for k in (0..w).rev() {
        level += cfg.first_order_alpha * (values[k] - level);
        first[k] = level;
    }

    // Second order, seeded with the oldest value and the oldest delta
    let mut second = vec![0.0; w];
    let mut trend = vec![0.0; w];
    second[oldest] = values[oldest];
    trend[oldest] = values[oldest - 1] - values[oldest];
    for k in (0..oldest).rev() {
        second[k] = cfg.second_order_alpha * values[k]
            + (1.0 - cfg.second_order_alpha) * (second[k + 1] + trend[k + 1]);
        trend[k] = cfg.second_order_beta * (second[k] - second[k + 1])
            + (1.0 - cfg.second_order_beta) * trend[k + 1];
    }

    first
        .iter()
        .zip(&second)
        .map(|(f, s)| cfg.first_order_weight * f + (1.0 - cfg.first_order_weight) * s)
        .collect()
}

/// Smooth a newest-first run of readings of one sensor in place.
///
/// Only `readings[0].sensor` is consulted; older readings are assumed to
/// share it.
///
/// Touches `smoothed` on at most `cfg.update_window` of the newest readings
/// and nothing else. Running it twice over the same values writes the same
/// result.
pub fn smooth(readings: &mut [Reading], cfg: &SmoothingCfg) -> SmoothingOutcome {
    let n = readings.len();
    if n < 2
        || !readings[0].sensor.is_high_frequency()
        || (readings[0].timestamp - readings[1].timestamp).abs() > cfg.max_cadence_gap_ms
    {
        return SmoothingOutcome::PassThrough;
    }

    let window = valid_window(readings, cfg);
    if window < cfg.min_window.max(2) {
        let written = n.min(cfg.update_window);
        for r in readings.iter_mut().take(written) {
            r.smoothed = Some(r.value.max(SMOOTHED_FLOOR_MGDL));
        }
        tracing::debug!(window, written, "insufficient data for smoothing");
        return SmoothingOutcome::InsufficientData { window, written };
    }

    let values: Vec<f64> = readings[..window].iter().map(|r| r.value).collect();
    let blended = blend(&values, cfg);
    let written = window.min(cfg.update_window);
    for (r, b) in readings.iter_mut().zip(&blended).take(written) {
        r.smoothed = Some(b.round_ties_even().max(SMOOTHED_FLOOR_MGDL));
    }
    tracing::debug!(window, written, newest = blended[0], "smoothed window");
    SmoothingOutcome::Smoothed { window, written }
}
