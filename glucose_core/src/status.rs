//! Glucose status snapshot handed to the decision engine.

use serde::{Deserialize, Serialize};

use crate::util::round_to;

/// Current glucose, short-term trend and curve-fit summary.
///
/// Built by `GlucoseStatusProvider`. Values are unrounded until
/// [`GlucoseStatus::as_rounded`] is applied.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GlucoseStatus {
    /// Newest smoothed (or recalculated) value, mg/dL.
    pub glucose: f64,
    /// Reserved; always 0.
    pub noise: f64,
    pub delta: f64,
    pub short_avg_delta: f64,
    pub long_avg_delta: f64,
    /// Epoch ms of the newest reading.
    pub date: i64,
    /// Minutes glucose has stayed within the stability band.
    pub dura_isf_minutes: f64,
    /// Mean glucose over that run.
    pub dura_isf_average: f64,
    /// The curve fit ran on unsmoothed 1-minute readings.
    pub use_1minute_raw: bool,
    pub parabola_minutes: f64,
    pub delta_pl: f64,
    pub delta_pn: f64,
    pub bg_acceleration: f64,
    pub a0: f64,
    pub a1: f64,
    pub a2: f64,
    pub corr_squ: f64,
}

impl GlucoseStatus {
    /// Minimal status for a history holding a single reading: the display
    /// value as `glucose`, the sensor value as stability average, every
    /// trend and fit field zero.
    pub fn single(glucose: f64, value: f64, date: i64) -> Self {
        Self {
            glucose,
            date,
            dura_isf_average: value,
            ..Self::default()
        }
    }

    /// Round every field to its reporting precision.
    pub fn as_rounded(&self) -> Self {
        Self {
            glucose: round_to(self.glucose, 1),
            noise: round_to(self.noise, 2),
            delta: round_to(self.delta, 2),
            short_avg_delta: round_to(self.short_avg_delta, 2),
            long_avg_delta: round_to(self.long_avg_delta, 2),
            date: self.date,
            dura_isf_minutes: round_to(self.dura_isf_minutes, 1),
            dura_isf_average: round_to(self.dura_isf_average, 1),
            use_1minute_raw: self.use_1minute_raw,
            parabola_minutes: round_to(self.parabola_minutes, 1),
            delta_pl: round_to(self.delta_pl, 1),
            delta_pn: round_to(self.delta_pn, 1),
            bg_acceleration: round_to(self.bg_acceleration, 2),
            a0: round_to(self.a0, 1),
            a1: round_to(self.a1, 2),
            a2: round_to(self.a2, 2),
            corr_squ: round_to(self.corr_squ, 4),
        }
    }

    /// One-line human summary.
    pub fn log_string(&self) -> String {
        format!(
            "Glucose: {:.1} mg/dl Noise: {:.0} Delta: {:.2} mg/dl Short avg. delta: {:.2} mg/dl \
             Long avg. delta: {:.2} mg/dl Range: {:.1} min Avg: {:.1} mg/dl \
             Fit: {:.1} min R2: {:.4} Accel: {:.2}",
            self.glucose,
            self.noise,
            self.delta,
            self.short_avg_delta,
            self.long_avg_delta,
            self.dura_isf_minutes,
            self.dura_isf_average,
            self.parabola_minutes,
            self.corr_squ,
            self.bg_acceleration,
        )
    }
}
