//! Commands that push a CSV reading history through the pipeline.

use std::path::Path;

use eyre::{Result, WrapErr};
use glucose_core::types::IncomingReading;
use glucose_core::{
    GlucoseHistory, GlucoseStatus, IngestBatch, IngestResult, MemoryStore, PipelineCfg,
};
use glucose_traits::Clock;

/// Readings older than this relative to "now" never reach the status stages.
const HISTORY_LOOKBACK_MS: i64 = 24 * 60 * 60 * 1000;

/// Clock pinned to a caller-supplied instant (`status --now`).
#[derive(Debug, Clone, Copy)]
pub struct AsOf(pub i64);

impl Clock for AsOf {
    fn now_ms(&self) -> i64 {
        self.0
    }
}

/// A fresh in-memory store holding one CSV history.
pub struct LoadedHistory {
    pub store: MemoryStore,
    pub report: IngestResult,
}

pub fn load(path: &Path, cfg: &PipelineCfg) -> Result<LoadedHistory> {
    let rows = glucose_config::load_readings_csv(path)?;
    let batch = IngestBatch::from_readings(rows.iter().map(IncomingReading::from).collect());

    let mut store = MemoryStore::new();
    let report = cfg
        .ingestor()
        .ingest(&mut store, &batch)
        .wrap_err_with(|| format!("ingest {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        rows = rows.len(),
        stored = store.len(),
        filled_gaps = rows.iter().filter(|r| r.filled_gap).count(),
        "history loaded"
    );
    Ok(LoadedHistory { store, report })
}

impl LoadedHistory {
    /// Newest-first status windows as of `now_ms`.
    pub fn history(&self, now_ms: i64) -> GlucoseHistory {
        GlucoseHistory::from_readings(&self.store.history(now_ms, HISTORY_LOOKBACK_MS))
    }
}

pub fn run_status<C: Clock>(
    path: &Path,
    cfg: &PipelineCfg,
    clock: C,
    allow_old_data: bool,
) -> Result<Option<GlucoseStatus>> {
    let loaded = load(path, cfg)?;
    let history = loaded.history(clock.now_ms());
    Ok(cfg.status_provider(clock).glucose_status(&history, allow_old_data))
}

pub fn render_status(status: &GlucoseStatus, json: bool) -> Result<String> {
    if json {
        return serde_json::to_string(status).wrap_err("serialize status");
    }
    Ok(status.log_string())
}

pub fn render_report(report: &IngestResult, json: bool) -> String {
    let counts = [
        ("inserted", report.inserted.len()),
        ("updated", report.updated.len()),
        ("updated_nightscout_id", report.updated_nightscout_id.len()),
        ("resmoothed", report.resmoothed.len()),
        ("calibrations_inserted", report.calibrations_inserted.len()),
        (
            "sensor_insertions_inserted",
            report.sensor_insertions_inserted.len(),
        ),
        ("skipped", report.skipped),
    ];
    if json {
        let obj: serde_json::Map<String, serde_json::Value> = counts
            .iter()
            .map(|(k, v)| ((*k).to_string(), serde_json::Value::from(*v)))
            .collect();
        return serde_json::Value::Object(obj).to_string();
    }
    counts
        .iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}
