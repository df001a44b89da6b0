//! Status assembly: runs the read-only stages over a history snapshot.

use glucose_traits::Clock;

use crate::config::{RegressionCfg, StabilityCfg, StatusCfg};
use crate::deltas;
use crate::regression::{self, FitMode};
use crate::stability::stability_window;
use crate::status::GlucoseStatus;
use crate::types::Reading;

/// The two newest-first views a status is computed from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlucoseHistory {
    /// Standard-cadence readings; `recalculated` carries the display value.
    pub bucketed: Vec<Reading>,
    /// Sensor readings as received.
    pub raw: Vec<Reading>,
}

impl GlucoseHistory {
    /// Build from two windows in any order; both end up newest first.
    pub fn new(mut bucketed: Vec<Reading>, mut raw: Vec<Reading>) -> Self {
        bucketed.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        raw.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Self { bucketed, raw }
    }

    /// Derive both views from stored readings. The bucketed view takes the
    /// smoothed value as its display value where smoothing has run and keeps
    /// gap placeholders flagged; the raw view holds sensor readings only.
    pub fn from_readings(readings: &[Reading]) -> Self {
        let valid: Vec<&Reading> = readings.iter().filter(|r| r.is_valid).collect();
        let raw: Vec<Reading> = valid
            .iter()
            .filter(|r| !r.filled_gap)
            .map(|r| (*r).clone())
            .collect();
        let bucketed = valid
            .iter()
            .map(|r| {
                let mut b = (*r).clone();
                b.recalculated = r.smoothed.unwrap_or(r.recalculated);
                b
            })
            .collect();
        Self::new(bucketed, raw)
    }

    pub fn is_empty(&self) -> bool {
        self.bucketed.is_empty()
    }
}

/// Computes `GlucoseStatus` snapshots on demand.
#[derive(Debug, Clone)]
pub struct GlucoseStatusProvider<C: Clock> {
    clock: C,
    status: StatusCfg,
    regression: RegressionCfg,
    stability: StabilityCfg,
}

impl<C: Clock> GlucoseStatusProvider<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            status: StatusCfg::default(),
            regression: RegressionCfg::default(),
            stability: StabilityCfg::default(),
        }
    }

    pub fn with_status_cfg(mut self, cfg: StatusCfg) -> Self {
        self.status = cfg;
        self
    }

    pub fn with_regression_cfg(mut self, cfg: RegressionCfg) -> Self {
        self.regression = cfg;
        self
    }

    pub fn with_stability_cfg(mut self, cfg: StabilityCfg) -> Self {
        self.stability = cfg;
        self
    }

    pub fn status_cfg(&self) -> &StatusCfg {
        &self.status
    }

    /// Rounded status for `history`, or `None` when there is no history or
    /// the newest reading is stale and `allow_old_data` is not set.
    pub fn glucose_status(
        &self,
        history: &GlucoseHistory,
        allow_old_data: bool,
    ) -> Option<GlucoseStatus> {
        let data = &history.bucketed;
        let Some(now) = data.first() else {
            tracing::debug!("no glucose history");
            return None;
        };
        let age_ms = self.clock.ms_since(now.timestamp);
        if age_ms > self.status.stale_after_ms && !allow_old_data {
            tracing::warn!(timestamp = now.timestamp, age_ms, "newest reading is stale");
            return None;
        }
        if data.len() == 1 {
            tracing::debug!(timestamp = now.timestamp, "single reading");
            return Some(GlucoseStatus::single(now.recalculated, now.value, now.timestamp).as_rounded());
        }

        let d = deltas::aggregate(data);
        let stable = stability_window(data, &self.stability);
        let mode = regression::select_mode(&history.raw, &self.regression);
        let samples = match mode {
            FitMode::HighFrequencyRaw => &history.raw,
            FitMode::StandardSmoothed => data,
        };
        let fit = regression::fit(samples, mode, &self.regression);

        let status = GlucoseStatus {
            glucose: now.recalculated,
            noise: 0.0,
            delta: d.delta,
            short_avg_delta: d.short_avg_delta,
            long_avg_delta: d.long_avg_delta,
            date: now.timestamp,
            dura_isf_minutes: stable.minutes,
            dura_isf_average: stable.average,
            use_1minute_raw: mode == FitMode::HighFrequencyRaw,
            parabola_minutes: fit.minutes,
            delta_pl: fit.delta_last,
            delta_pn: fit.delta_next,
            bg_acceleration: fit.acceleration,
            a0: fit.a0,
            a1: fit.a1,
            a2: fit.a2,
            corr_squ: fit.r_squared,
        }
        .as_rounded();
        tracing::debug!(
            glucose = status.glucose,
            delta = status.delta,
            fit_minutes = status.parabola_minutes,
            corr = status.corr_squ,
            raw_mode = status.use_1minute_raw,
            "glucose status"
        );
        Some(status)
    }
}
