#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::similar_names,
    clippy::many_single_char_names
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Glucose status pipeline (storage- and engine-agnostic).
//!
//! Turns a gap-prone, error-prone CGM reading stream into a compact
//! `GlucoseStatus` snapshot for an external dosing decision engine. Storage
//! goes through the `store::ReadingStore` trait, time through
//! `glucose_traits::Clock`, activity through `glucose_traits::ActivityMonitor`.
//!
//! ## Architecture
//!
//! - **Ingest**: reconciles batches into the store, bounded atomic commits (`ingest`)
//! - **Smoothing**: double-exponential blend for 1-minute sensors (`smoothing`)
//! - **Deltas**: short, immediate and long average deltas (`deltas`)
//! - **Stability**: duration within ±5% of the running mean (`stability`)
//! - **Regression**: adaptive quadratic fit, velocity and acceleration (`regression`)
//! - **Status**: assembly and rounding (`provider`, `status`)
//! - **Request**: immutable engine input and its builder (`request`, `builder`)
//!
//! ## Units
//!
//! Glucose in mg/dL, timestamps in epoch milliseconds, deltas in mg/dL per
//! 5 minutes, durations in minutes.

pub mod builder;
pub mod config;
pub mod conversions;
pub mod deltas;
pub mod error;
pub mod ingest;
pub mod mocks;
pub mod provider;
pub mod regression;
pub mod request;
pub mod smoothing;
pub mod stability;
pub mod status;
pub mod store;
pub mod store_error;
pub mod types;
pub mod util;

pub use builder::RequestBuilder;
pub use config::{IngestCfg, RegressionCfg, SmoothingCfg, StabilityCfg, StatusCfg};
pub use error::{BuildError, GlucoseError, Result};
pub use ingest::{IngestBatch, IngestResult, Ingestor};
pub use provider::{GlucoseHistory, GlucoseStatusProvider};
pub use regression::{FitMode, ParabolaFit};
pub use request::{
    ActivitySnapshot, CurrentTemp, Decision, DecisionEngine, DeterminationRequest,
    GlucoseStatusParams, MealData, Profile,
};
pub use status::GlucoseStatus;
pub use store::{ChangeSet, MemoryStore, ReadingStore};
pub use types::{
    Calibration, EventKind, GlucoseUnit, IncomingReading, Reading, SourceSensor, TherapyEvent,
    TrendArrow,
};

/// Runtime configuration for the whole pipeline.
#[derive(Debug, Clone, Default)]
pub struct PipelineCfg {
    pub smoothing: SmoothingCfg,
    pub status: StatusCfg,
    pub regression: RegressionCfg,
    pub stability: StabilityCfg,
    pub ingest: IngestCfg,
}

impl From<&glucose_config::Config> for PipelineCfg {
    fn from(c: &glucose_config::Config) -> Self {
        Self {
            smoothing: (&c.smoothing).into(),
            status: (&c.status).into(),
            regression: (&c.regression).into(),
            stability: (&c.stability).into(),
            ingest: (&c.ingest).into(),
        }
    }
}

impl PipelineCfg {
    pub fn ingestor(&self) -> Ingestor {
        Ingestor::new(self.smoothing.clone(), self.ingest.clone())
    }

    pub fn status_provider<C: glucose_traits::Clock>(&self, clock: C) -> GlucoseStatusProvider<C> {
        GlucoseStatusProvider::new(clock)
            .with_status_cfg(self.status.clone())
            .with_regression_cfg(self.regression.clone())
            .with_stability_cfg(self.stability.clone())
    }
}
