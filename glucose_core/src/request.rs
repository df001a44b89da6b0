//! Immutable input for the external dosing decision engine.
//!
//! A `DeterminationRequest` bundles the glucose status with the other
//! signals the engine reads. It is assembled once by
//! [`RequestBuilder`](crate::builder::RequestBuilder) and never mutated
//! afterwards; the engine itself sits behind [`DecisionEngine`].

use glucose_traits::ActivityMonitor;
use serde::{Deserialize, Serialize};

use crate::error::{GlucoseError, Result};
use crate::status::GlucoseStatus;
use crate::util::round_to;

/// Glucose status in the engine's wire format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlucoseStatusParams {
    pub glucose: f64,
    pub noise: f64,
    pub delta: f64,
    pub short_avgdelta: f64,
    pub long_avgdelta: f64,
    pub date: i64,
    #[serde(rename = "dura_ISF_minutes")]
    pub dura_isf_minutes: f64,
    #[serde(rename = "dura_ISF_average")]
    pub dura_isf_average: f64,
    #[serde(rename = "useFSL1minuteSmooth")]
    pub use_fsl_1minute_smooth: bool,
    pub parabola_fit_correlation: f64,
    pub parabola_fit_minutes: f64,
    pub parabola_fit_last_delta: f64,
    pub parabola_fit_next_delta: f64,
    pub parabola_fit_a0: f64,
    pub parabola_fit_a1: f64,
    pub parabola_fit_a2: f64,
    pub bg_acceleration: f64,
}

impl GlucoseStatusParams {
    /// Wire view of `status`. With `always_use_short_avg` the short average
    /// delta is sent as `delta`.
    pub fn from_status(status: &GlucoseStatus, always_use_short_avg: bool) -> Self {
        Self {
            glucose: status.glucose,
            noise: status.noise,
            delta: if always_use_short_avg {
                status.short_avg_delta
            } else {
                status.delta
            },
            short_avgdelta: status.short_avg_delta,
            long_avgdelta: status.long_avg_delta,
            date: status.date,
            dura_isf_minutes: status.dura_isf_minutes,
            dura_isf_average: status.dura_isf_average,
            use_fsl_1minute_smooth: status.use_1minute_raw,
            parabola_fit_correlation: round_to(status.corr_squ, 4),
            parabola_fit_minutes: status.parabola_minutes,
            parabola_fit_last_delta: round_to(status.delta_pl, 1),
            parabola_fit_next_delta: round_to(status.delta_pn, 1),
            parabola_fit_a0: round_to(status.a0, 1),
            parabola_fit_a1: round_to(status.a1, 2),
            parabola_fit_a2: round_to(status.a2, 2),
            bg_acceleration: round_to(status.bg_acceleration, 2),
        }
    }
}

/// Therapy profile fields the engine needs. Glucose values in mg/dL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub max_iob: f64,
    pub max_daily_basal: f64,
    pub max_basal: f64,
    pub min_bg: f64,
    pub max_bg: f64,
    pub target_bg: f64,
    pub carb_ratio: f64,
    /// Insulin sensitivity factor.
    pub sens: f64,
    pub current_basal: f64,
    #[serde(rename = "enableSMB_always")]
    pub enable_smb_always: bool,
    #[serde(rename = "enableUAM")]
    pub enable_uam: bool,
    pub out_units: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            max_iob: 0.0,
            max_daily_basal: 1.0,
            max_basal: 1.0,
            min_bg: 100.0,
            max_bg: 100.0,
            target_bg: 100.0,
            carb_ratio: 10.0,
            sens: 50.0,
            current_basal: 1.0,
            enable_smb_always: false,
            enable_uam: false,
            out_units: "mg/dl".to_string(),
        }
    }
}

impl Profile {
    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> std::result::Result<(), &'static str> {
        if !(self.sens.is_finite() && self.sens > 0.0) {
            return Err("profile sens must be > 0");
        }
        if !(self.carb_ratio.is_finite() && self.carb_ratio > 0.0) {
            return Err("profile carb_ratio must be > 0");
        }
        if self.min_bg > self.max_bg {
            return Err("profile min_bg must be <= max_bg");
        }
        if self.max_iob.is_sign_negative() || self.max_basal.is_sign_negative() {
            return Err("profile limits must be >= 0");
        }
        Ok(())
    }
}

/// Temporary basal currently running on the pump.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CurrentTemp {
    /// Remaining minutes.
    pub duration: u32,
    /// Absolute rate, U/h.
    pub rate: f64,
    #[serde(rename = "minutesrunning", skip_serializing_if = "Option::is_none")]
    pub minutes_running: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealData {
    pub carbs: f64,
    #[serde(rename = "mealCOB")]
    pub meal_cob: f64,
    pub slope_from_max_deviation: f64,
    pub slope_from_min_deviation: f64,
    pub last_bolus_time: i64,
    pub last_carb_time: i64,
}

/// Recent activity captured once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActivitySnapshot {
    #[serde(rename = "recentSteps5Minutes")]
    pub steps_5m: u32,
    #[serde(rename = "recentSteps10Minutes")]
    pub steps_10m: u32,
    #[serde(rename = "recentSteps15Minutes")]
    pub steps_15m: u32,
    #[serde(rename = "recentSteps30Minutes")]
    pub steps_30m: u32,
    #[serde(rename = "recentSteps60Minutes")]
    pub steps_60m: u32,
    pub phone_moved: bool,
}

impl ActivitySnapshot {
    pub fn capture<A: ActivityMonitor + ?Sized>(monitor: &A) -> Self {
        Self {
            steps_5m: monitor.recent_steps(5),
            steps_10m: monitor.recent_steps(10),
            steps_15m: monitor.recent_steps(15),
            steps_30m: monitor.recent_steps(30),
            steps_60m: monitor.recent_steps(60),
            phone_moved: monitor.phone_moved(),
        }
    }
}

/// Everything one decision run consumes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeterminationRequest {
    pub glucose_status: GlucoseStatusParams,
    pub profile: Profile,
    pub current_temp: CurrentTemp,
    pub meal_data: MealData,
    pub autosens_ratio: f64,
    pub activity: ActivitySnapshot,
    pub micro_bolus_allowed: bool,
    pub flat_bgs_detected: bool,
    /// Epoch ms the request was assembled at.
    pub current_time: i64,
}

impl DeterminationRequest {
    /// Serialize for engines that take JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| eyre::Report::new(GlucoseError::InvalidInput(e.to_string())))
    }
}

/// Outcome of a decision run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Decision {
    /// Temporary basal rate to set (U/h), if any.
    pub rate: Option<f64>,
    /// Duration of that rate (minutes).
    pub duration: Option<u32>,
    /// Micro-bolus to deliver (U), if any.
    pub units: Option<f64>,
    pub reason: String,
}

/// External dosing decision algorithm. Implementations must not mutate
/// anything reachable from the request.
pub trait DecisionEngine {
    fn determine(&self, request: &DeterminationRequest) -> Result<Decision>;
}

impl<F> DecisionEngine for F
where
    F: Fn(&DeterminationRequest) -> Result<Decision>,
{
    fn determine(&self, request: &DeterminationRequest) -> Result<Decision> {
        self(request)
    }
}
