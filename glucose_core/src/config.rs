//! Configuration types for the glucose pipeline.
//!
//! These are the runtime configuration structs used by the pipeline stages.
//! They are separate from the TOML-deserialized config in `glucose_config`.

use crate::util::MILLIS_PER_MINUTE;

/// Double-exponential smoothing parameters.
#[derive(Debug, Clone)]
pub struct SmoothingCfg {
    /// Nominal window length in readings (45 one-minute readings).
    pub window: usize,
    /// Number of most recent blended values persisted per cycle.
    pub update_window: usize,
    /// Minimum valid readings for a smoothing pass.
    pub min_window: usize,
    /// Smoothing only runs when the newest two readings are at most this far apart (ms).
    pub max_cadence_gap_ms: i64,
    /// Window truncates at a gap longer than this (minutes).
    pub max_gap_min: f64,
    /// First-order smoothing factor.
    pub first_order_alpha: f64,
    /// Second-order level smoothing factor.
    pub second_order_alpha: f64,
    /// Second-order trend damping. At 1.0 the trend is the plain first difference.
    pub second_order_beta: f64,
    /// Blend weight of the first-order series.
    pub first_order_weight: f64,
    /// History pulled around each ingested reading (ms).
    pub lookback_ms: i64,
}

impl Default for SmoothingCfg {
    fn default() -> Self {
        Self {
            window: 45,
            update_window: 10,
            min_window: 4,
            max_cadence_gap_ms: 90_000,
            max_gap_min: 2.5,
            first_order_alpha: 0.5,
            second_order_alpha: 0.4,
            second_order_beta: 1.0,
            first_order_weight: 0.4,
            lookback_ms: 125 * MILLIS_PER_MINUTE,
        }
    }
}

/// Status assembly and staleness.
#[derive(Debug, Clone)]
pub struct StatusCfg {
    /// Newest reading older than this makes the status unavailable (ms).
    pub stale_after_ms: i64,
    /// Send the short average delta as `delta` to the decision engine.
    pub always_use_short_avg: bool,
}

impl Default for StatusCfg {
    fn default() -> Self {
        Self {
            stale_after_ms: 7 * MILLIS_PER_MINUTE,
            always_use_short_avg: false,
        }
    }
}

/// Quadratic regression scan limits.
#[derive(Debug, Clone)]
pub struct RegressionCfg {
    /// Samples older than this are not scanned (minutes).
    pub max_lookback_min: f64,
    /// A gap longer than this between accepted samples ends the scan (minutes).
    pub max_gap_min: f64,
    /// Minimum fit duration on smoothed 5-minute data (minutes).
    pub min_fit_min_standard: f64,
    /// Minimum fit duration on raw 1-minute data (minutes).
    pub min_fit_min_high_frequency: f64,
    /// Raw mode requires newest and third-newest raw readings within this span (minutes).
    pub high_frequency_span_min: f64,
}

impl Default for RegressionCfg {
    fn default() -> Self {
        Self {
            max_lookback_min: 47.5,
            max_gap_min: 7.5,
            min_fit_min_standard: 15.0,
            min_fit_min_high_frequency: 20.0,
            high_frequency_span_min: 3.0,
        }
    }
}

/// Stability window band.
#[derive(Debug, Clone)]
pub struct StabilityCfg {
    /// Relative half-width of the accepted band around the running mean.
    pub band: f64,
    /// Gap between accepted samples that ends the run (whole minutes).
    pub max_gap_min: i64,
}

impl Default for StabilityCfg {
    fn default() -> Self {
        Self {
            band: 0.05,
            max_gap_min: 13,
        }
    }
}

/// Ingest limits.
#[derive(Debug, Clone)]
pub struct IngestCfg {
    /// Readings per store commit.
    pub max_batch: usize,
}

impl Default for IngestCfg {
    fn default() -> Self {
        Self { max_batch: 10_000 }
    }
}
