#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and reading-history parsing for the glucose pipeline.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Every section has defaults, so an empty document is a valid config.
//! - The reading CSV loader enforces headers before any row is parsed.
use serde::Deserialize;

/// Reading history CSV schema.
///
/// Expected headers (the trailing two are optional, in this order):
/// timestamp,value,sensor[,filled_gap[,nightscout_id]]
///
/// Example:
/// timestamp,value,sensor
/// 1700000000000,112,libre2
/// 1700000060000,113,libre2
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ReadingRow {
    /// Epoch milliseconds.
    pub timestamp: i64,
    /// Sensor value in mg/dL.
    pub value: f64,
    pub sensor: String,
    #[serde(default)]
    pub filled_gap: bool,
    #[serde(default)]
    pub nightscout_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SmoothingCfg {
    /// Nominal number of readings in the smoothing window (1-minute data).
    pub window: usize,
    /// Number of most recent smoothed values written back per cycle.
    pub update_window: usize,
    /// Minimum valid readings required before smoothing kicks in.
    pub min_window: usize,
    /// Newest two readings must be at most this far apart (seconds).
    pub max_cadence_gap_s: f64,
    /// Gap between consecutive readings that truncates the window (minutes).
    pub max_gap_min: f64,
    pub first_order_alpha: f64,
    pub second_order_alpha: f64,
    /// Damping of the second-order trend term. 1.0 collapses it to a plain difference.
    pub second_order_beta: f64,
    /// Weight of the first-order series in the blend; the rest goes to second order.
    pub first_order_weight: f64,
    /// History pulled from the store around each ingested reading (minutes).
    pub lookback_min: u32,
}

impl Default for SmoothingCfg {
    fn default() -> Self {
        Self {
            window: 45,
            update_window: 10,
            min_window: 4,
            max_cadence_gap_s: 90.0,
            max_gap_min: 2.5,
            first_order_alpha: 0.5,
            second_order_alpha: 0.4,
            second_order_beta: 1.0,
            first_order_weight: 0.4,
            lookback_min: 125,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StatusCfg {
    /// Newest reading older than this makes the status unavailable (minutes).
    pub stale_after_min: u32,
    /// Report delta as the short average delta to the decision engine.
    pub always_use_short_avg: bool,
}

impl Default for StatusCfg {
    fn default() -> Self {
        Self {
            stale_after_min: 7,
            always_use_short_avg: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RegressionCfg {
    /// Look-back limit for the parabola fit (minutes).
    pub max_lookback_min: f64,
    /// Gap between consecutive fit points that ends the scan (minutes).
    pub max_gap_min: f64,
    /// Minimum fit duration for standard 5-minute data (minutes).
    pub min_fit_min_standard: f64,
    /// Minimum fit duration for raw 1-minute data (minutes).
    pub min_fit_min_high_frequency: f64,
    /// Newest and third-newest raw readings closer than this enable 1-minute mode (minutes).
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

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StabilityCfg {
    /// Relative half-width of the band around the running mean.
    pub band: f64,
    /// Gap that ends the stable run (minutes).
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

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IngestCfg {
    /// Upper bound on readings per store commit; larger batches are split.
    pub max_batch: usize,
}

impl Default for IngestCfg {
    fn default() -> Self {
        Self { max_batch: 10_000 }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub smoothing: SmoothingCfg,
    pub status: StatusCfg,
    pub regression: RegressionCfg,
    pub stability: StabilityCfg,
    pub ingest: IngestCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

const READING_HEADERS: [&str; 5] = ["timestamp", "value", "sensor", "filled_gap", "nightscout_id"];

/// Load a reading history CSV. Rows may come in any order; ordering is the
/// caller's concern.
pub fn load_readings_csv(path: &std::path::Path) -> eyre::Result<Vec<ReadingRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open readings CSV {:?}: {}", path, e))?;

    // Headers must be a prefix of the known columns, at least the first three
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    let known_prefix = actual.len() >= 3
        && actual.len() <= READING_HEADERS.len()
        && actual.iter().zip(READING_HEADERS).all(|(a, e)| a == e);
    if !known_prefix {
        eyre::bail!(
            "readings CSV must have headers 'timestamp,value,sensor[,filled_gap[,nightscout_id]]', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<ReadingRow>().enumerate() {
        match rec {
            Ok(mut row) => {
                if !row.value.is_finite() {
                    eyre::bail!("invalid CSV row {}: value is not finite", idx + 2);
                }
                if row.nightscout_id.as_deref() == Some("") {
                    row.nightscout_id = None;
                }
                rows.push(row);
            }
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }
    Ok(rows)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Smoothing
        let s = &self.smoothing;
        if s.window < 2 {
            eyre::bail!("smoothing.window must be >= 2");
        }
        if s.min_window < 2 || s.min_window > s.window {
            eyre::bail!("smoothing.min_window must be in [2, smoothing.window]");
        }
        if s.update_window == 0 {
            eyre::bail!("smoothing.update_window must be >= 1");
        }
        if !(s.max_cadence_gap_s > 0.0) {
            eyre::bail!("smoothing.max_cadence_gap_s must be > 0");
        }
        if !(s.max_gap_min > 0.0) {
            eyre::bail!("smoothing.max_gap_min must be > 0");
        }
        for (name, v) in [
            ("first_order_alpha", s.first_order_alpha),
            ("second_order_alpha", s.second_order_alpha),
            ("second_order_beta", s.second_order_beta),
        ] {
            if !(v > 0.0 && v <= 1.0) {
                eyre::bail!("smoothing.{name} must be in (0.0, 1.0]");
            }
        }
        if !(0.0..=1.0).contains(&s.first_order_weight) {
            eyre::bail!("smoothing.first_order_weight must be in [0.0, 1.0]");
        }
        if s.lookback_min == 0 || s.lookback_min > 24 * 60 {
            eyre::bail!("smoothing.lookback_min must be in [1, 1440]");
        }

        // Status
        if self.status.stale_after_min == 0 {
            eyre::bail!("status.stale_after_min must be >= 1");
        }

        // Regression
        let r = &self.regression;
        if !(r.max_lookback_min > 0.0 && r.max_lookback_min <= 24.0 * 60.0) {
            eyre::bail!("regression.max_lookback_min must be in (0, 1440]");
        }
        if !(r.max_gap_min > 0.0) {
            eyre::bail!("regression.max_gap_min must be > 0");
        }
        if r.min_fit_min_standard < 0.0 || r.min_fit_min_standard >= r.max_lookback_min {
            eyre::bail!("regression.min_fit_min_standard must be in [0, regression.max_lookback_min)");
        }
        if r.min_fit_min_high_frequency < 0.0 || r.min_fit_min_high_frequency >= r.max_lookback_min
        {
            eyre::bail!(
                "regression.min_fit_min_high_frequency must be in [0, regression.max_lookback_min)"
            );
        }
        if !(r.high_frequency_span_min > 0.0) {
            eyre::bail!("regression.high_frequency_span_min must be > 0");
        }

        // Stability
        if !(self.stability.band > 0.0 && self.stability.band < 1.0) {
            eyre::bail!("stability.band must be in (0.0, 1.0)");
        }
        if self.stability.max_gap_min <= 0 {
            eyre::bail!("stability.max_gap_min must be >= 1");
        }

        // Ingest
        if self.ingest.max_batch == 0 {
            eyre::bail!("ingest.max_batch must be >= 1");
        }

        // Logging: rotation is checked here so a typo fails before any file is opened
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never, daily, hourly");
        }

        Ok(())
    }
}
