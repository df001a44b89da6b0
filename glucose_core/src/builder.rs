//! Type-state builder for `DeterminationRequest`.
//!
//! The builder enforces at compile time that the glucose status and the
//! profile are provided before `build()` is available. `try_build()` is
//! always available for dynamic checks.

use std::marker::PhantomData;

use glucose_traits::{ActivityMonitor, Clock};

use crate::error::{BuildError, Result};
use crate::request::{
    ActivitySnapshot, CurrentTemp, DeterminationRequest, GlucoseStatusParams, MealData, Profile,
};
use crate::status::GlucoseStatus;

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `DeterminationRequest`. Validated on `build()`.
pub struct RequestBuilder<G, P> {
    glucose_status: Option<GlucoseStatus>,
    profile: Option<Profile>,
    current_temp: CurrentTemp,
    meal_data: MealData,
    autosens_ratio: f64,
    activity: ActivitySnapshot,
    micro_bolus_allowed: bool,
    flat_bgs_detected: bool,
    always_use_short_avg: bool,
    current_time: Option<i64>,
    _g: PhantomData<G>,
    _p: PhantomData<P>,
}

impl Default for RequestBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            glucose_status: None,
            profile: None,
            current_temp: CurrentTemp::default(),
            meal_data: MealData::default(),
            autosens_ratio: 1.0,
            activity: ActivitySnapshot::default(),
            micro_bolus_allowed: false,
            flat_bgs_detected: false,
            always_use_short_avg: false,
            current_time: None,
            _g: PhantomData,
            _p: PhantomData,
        }
    }
}

impl DeterminationRequest {
    /// Start building a request.
    pub fn builder() -> RequestBuilder<Missing, Missing> {
        RequestBuilder::default()
    }
}

impl<G, P> RequestBuilder<G, P> {
    /// Fallible build available in any type-state; reports the first missing piece.
    pub fn try_build(self) -> Result<DeterminationRequest> {
        let status = self
            .glucose_status
            .ok_or_else(|| eyre::Report::new(BuildError::MissingGlucoseStatus))?;
        let profile = self
            .profile
            .ok_or_else(|| eyre::Report::new(BuildError::MissingProfile))?;

        profile
            .validate()
            .map_err(|msg| eyre::Report::new(BuildError::InvalidConfig(msg)))?;
        if !(self.autosens_ratio.is_finite() && self.autosens_ratio > 0.0) {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "autosens ratio must be > 0",
            )));
        }

        Ok(DeterminationRequest {
            glucose_status: GlucoseStatusParams::from_status(&status, self.always_use_short_avg),
            profile,
            current_temp: self.current_temp,
            meal_data: self.meal_data,
            autosens_ratio: self.autosens_ratio,
            activity: self.activity,
            micro_bolus_allowed: self.micro_bolus_allowed,
            flat_bgs_detected: self.flat_bgs_detected,
            current_time: self.current_time.unwrap_or(status.date),
        })
    }

    fn with_state<G2, P2>(self) -> RequestBuilder<G2, P2> {
        RequestBuilder {
            glucose_status: self.glucose_status,
            profile: self.profile,
            current_temp: self.current_temp,
            meal_data: self.meal_data,
            autosens_ratio: self.autosens_ratio,
            activity: self.activity,
            micro_bolus_allowed: self.micro_bolus_allowed,
            flat_bgs_detected: self.flat_bgs_detected,
            always_use_short_avg: self.always_use_short_avg,
            current_time: self.current_time,
            _g: PhantomData,
            _p: PhantomData,
        }
    }
}

/// Chainable setters that do not affect type-state.
impl<G, P> RequestBuilder<G, P> {
    pub fn with_current_temp(mut self, temp: CurrentTemp) -> Self {
        self.current_temp = temp;
        self
    }
    pub fn with_meal_data(mut self, meal: MealData) -> Self {
        self.meal_data = meal;
        self
    }
    pub fn with_autosens_ratio(mut self, ratio: f64) -> Self {
        self.autosens_ratio = ratio;
        self
    }
    pub fn with_activity(mut self, activity: ActivitySnapshot) -> Self {
        self.activity = activity;
        self
    }
    /// Capture step counts and phone movement from `monitor` now.
    pub fn with_activity_from<A: ActivityMonitor + ?Sized>(mut self, monitor: &A) -> Self {
        self.activity = ActivitySnapshot::capture(monitor);
        self
    }
    pub fn with_micro_bolus_allowed(mut self, allowed: bool) -> Self {
        self.micro_bolus_allowed = allowed;
        self
    }
    pub fn with_flat_bgs_detected(mut self, flat: bool) -> Self {
        self.flat_bgs_detected = flat;
        self
    }
    /// Send the short average delta as `delta`.
    pub fn with_always_use_short_avg(mut self, on: bool) -> Self {
        self.always_use_short_avg = on;
        self
    }
    /// Stamp the request with `clock`'s time; defaults to the status date.
    pub fn with_clock<C: Clock + ?Sized>(mut self, clock: &C) -> Self {
        self.current_time = Some(clock.now_ms());
        self
    }
}

// Setters that advance type-state
impl<P> RequestBuilder<Missing, P> {
    pub fn with_glucose_status(mut self, status: GlucoseStatus) -> RequestBuilder<Set, P> {
        self.glucose_status = Some(status);
        self.with_state()
    }
}

impl<G> RequestBuilder<G, Missing> {
    pub fn with_profile(mut self, profile: Profile) -> RequestBuilder<G, Set> {
        self.profile = Some(profile);
        self.with_state()
    }
}

impl RequestBuilder<Set, Set> {
    /// Validate and build. Only available once status and profile are set.
    pub fn build(self) -> Result<DeterminationRequest> {
        self.try_build()
    }
}
