//! `From` implementations bridging `glucose_config` types to `glucose_core` types.

use crate::config::{IngestCfg, RegressionCfg, SmoothingCfg, StabilityCfg, StatusCfg};
use crate::types::{IncomingReading, SourceSensor};
use crate::util::{MILLIS_PER_MINUTE, MILLIS_PER_SEC};

// ── SmoothingCfg ─────────────────────────────────────────────────────────────

impl From<&glucose_config::SmoothingCfg> for SmoothingCfg {
    fn from(c: &glucose_config::SmoothingCfg) -> Self {
        Self {
            window: c.window,
            update_window: c.update_window,
            min_window: c.min_window,
            max_cadence_gap_ms: (c.max_cadence_gap_s * MILLIS_PER_SEC as f64).round() as i64,
            max_gap_min: c.max_gap_min,
            first_order_alpha: c.first_order_alpha,
            second_order_alpha: c.second_order_alpha,
            second_order_beta: c.second_order_beta,
            first_order_weight: c.first_order_weight,
            lookback_ms: i64::from(c.lookback_min) * MILLIS_PER_MINUTE,
        }
    }
}

// ── StatusCfg ────────────────────────────────────────────────────────────────

impl From<&glucose_config::StatusCfg> for StatusCfg {
    fn from(c: &glucose_config::StatusCfg) -> Self {
        Self {
            stale_after_ms: i64::from(c.stale_after_min) * MILLIS_PER_MINUTE,
            always_use_short_avg: c.always_use_short_avg,
        }
    }
}

// ── RegressionCfg ────────────────────────────────────────────────────────────

impl From<&glucose_config::RegressionCfg> for RegressionCfg {
    fn from(c: &glucose_config::RegressionCfg) -> Self {
        Self {
            max_lookback_min: c.max_lookback_min,
            max_gap_min: c.max_gap_min,
            min_fit_min_standard: c.min_fit_min_standard,
            min_fit_min_high_frequency: c.min_fit_min_high_frequency,
            high_frequency_span_min: c.high_frequency_span_min,
        }
    }
}

// ── StabilityCfg ─────────────────────────────────────────────────────────────

impl From<&glucose_config::StabilityCfg> for StabilityCfg {
    fn from(c: &glucose_config::StabilityCfg) -> Self {
        Self {
            band: c.band,
            max_gap_min: c.max_gap_min,
        }
    }
}

// ── IngestCfg ────────────────────────────────────────────────────────────────

impl From<&glucose_config::IngestCfg> for IngestCfg {
    fn from(c: &glucose_config::IngestCfg) -> Self {
        Self {
            max_batch: c.max_batch,
        }
    }
}

// ── Readings ─────────────────────────────────────────────────────────────────

/// CSV rows become incoming samples; an unrecognised sensor name maps to
/// `Unknown` (standard cadence) rather than failing the whole history.
impl From<&glucose_config::ReadingRow> for IncomingReading {
    fn from(row: &glucose_config::ReadingRow) -> Self {
        let sensor = row.sensor.parse().unwrap_or(SourceSensor::Unknown);
        let mut r =
            IncomingReading::new(row.timestamp, row.value, sensor).with_filled_gap(row.filled_gap);
        r.nightscout_id = row.nightscout_id.clone();
        r
    }
}
