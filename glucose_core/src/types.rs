//! Data model shared by every pipeline stage.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sensor values at or below this are error sentinels, never glucose.
pub const SENSOR_ERROR_MAX_MGDL: f64 = 39.0;

/// Which CGM produced a reading. High-frequency sensors report every minute,
/// everything else on the standard 5-minute cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceSensor {
    DexcomG5,
    DexcomG6,
    DexcomG7,
    Medtronic,
    Eversense,
    Libre1,
    Libre2,
    Libre3,
    Xdrip,
    Random,
    #[default]
    Unknown,
}

impl SourceSensor {
    /// 1-minute sensors (the Libre family when read directly).
    pub fn is_high_frequency(self) -> bool {
        matches!(self, Self::Libre1 | Self::Libre2 | Self::Libre3)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DexcomG5 => "dexcom_g5",
            Self::DexcomG6 => "dexcom_g6",
            Self::DexcomG7 => "dexcom_g7",
            Self::Medtronic => "medtronic",
            Self::Eversense => "eversense",
            Self::Libre1 => "libre1",
            Self::Libre2 => "libre2",
            Self::Libre3 => "libre3",
            Self::Xdrip => "xdrip",
            Self::Random => "random",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SourceSensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceSensor {
    type Err = String;

    /// Case-insensitive; dashes, spaces and underscores are interchangeable.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        Ok(match norm.as_str() {
            "dexcomg5" | "g5" => Self::DexcomG5,
            "dexcomg6" | "g6" => Self::DexcomG6,
            "dexcomg7" | "g7" => Self::DexcomG7,
            "medtronic" => Self::Medtronic,
            "eversense" => Self::Eversense,
            "libre1" | "libre" => Self::Libre1,
            "libre2" => Self::Libre2,
            "libre3" => Self::Libre3,
            "xdrip" => Self::Xdrip,
            "random" => Self::Random,
            "unknown" | "" => Self::Unknown,
            _ => return Err(format!("unknown sensor '{s}'")),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendArrow {
    #[default]
    None,
    TripleUp,
    DoubleUp,
    SingleUp,
    FortyFiveUp,
    Flat,
    FortyFiveDown,
    SingleDown,
    DoubleDown,
    TripleDown,
}

/// One stored CGM sample, unique per (timestamp, sensor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub utc_offset_ms: i64,
    /// Value reported by the sensor (mg/dL).
    pub value: f64,
    /// Display value after recalculation (mg/dL).
    pub recalculated: f64,
    /// Output of the smoothing engine, when it has run over this reading.
    pub smoothed: Option<f64>,
    pub trend_arrow: TrendArrow,
    pub noise: Option<f64>,
    pub sensor: SourceSensor,
    /// Interpolated placeholder covering a missing sample.
    pub filled_gap: bool,
    /// Soft-delete flag; the user may invalidate a reading.
    pub is_valid: bool,
    /// External annotation id (Nightscout).
    pub nightscout_id: Option<String>,
}

impl Reading {
    /// A valid reading with `recalculated == value` and nothing else set.
    pub fn new(timestamp: i64, value: f64, sensor: SourceSensor) -> Self {
        Self {
            timestamp,
            utc_offset_ms: 0,
            value,
            recalculated: value,
            smoothed: None,
            trend_arrow: TrendArrow::None,
            noise: None,
            sensor,
            filled_gap: false,
            is_valid: true,
            nightscout_id: None,
        }
    }

    /// Sensor error sentinel (value at or below 39 mg/dL).
    #[inline]
    pub fn is_sensor_error(&self) -> bool {
        self.value <= SENSOR_ERROR_MAX_MGDL
    }

    /// Usable for trend math: not an error sentinel and not a filled gap.
    #[inline]
    pub fn is_usable(&self) -> bool {
        !self.is_sensor_error() && !self.filled_gap
    }

    /// Compare every value-bearing field. The annotation id is deliberately
    /// left out so an id-only change is recognised as a patch.
    pub fn content_equals(&self, other: &Reading) -> bool {
        self.timestamp == other.timestamp
            && self.utc_offset_ms == other.utc_offset_ms
            && self.smoothed == other.smoothed
            && self.value == other.value
            && self.trend_arrow == other.trend_arrow
            && self.noise == other.noise
            && self.sensor == other.sensor
            && self.filled_gap == other.filled_gap
            && self.is_valid == other.is_valid
    }

    #[inline]
    pub fn key(&self) -> (i64, SourceSensor) {
        (self.timestamp, self.sensor)
    }
}

/// A sample as delivered by a CGM source, before reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingReading {
    pub timestamp: i64,
    pub utc_offset_ms: i64,
    pub value: f64,
    pub trend_arrow: TrendArrow,
    pub noise: Option<f64>,
    pub sensor: SourceSensor,
    /// Interpolated placeholder from the source; stored but never smoothed or fitted.
    pub filled_gap: bool,
    pub is_valid: bool,
    pub nightscout_id: Option<String>,
}

impl IncomingReading {
    pub fn new(timestamp: i64, value: f64, sensor: SourceSensor) -> Self {
        Self {
            timestamp,
            utc_offset_ms: 0,
            value,
            trend_arrow: TrendArrow::None,
            noise: None,
            sensor,
            filled_gap: false,
            is_valid: true,
            nightscout_id: None,
        }
    }

    pub fn with_filled_gap(mut self, filled_gap: bool) -> Self {
        self.filled_gap = filled_gap;
        self
    }

    pub fn with_nightscout_id(mut self, id: impl Into<String>) -> Self {
        self.nightscout_id = Some(id.into());
        self
    }

    pub(crate) fn to_reading(&self) -> Reading {
        Reading {
            timestamp: self.timestamp,
            utc_offset_ms: self.utc_offset_ms,
            value: self.value,
            recalculated: self.value,
            smoothed: None,
            trend_arrow: self.trend_arrow,
            noise: self.noise,
            sensor: self.sensor,
            filled_gap: self.filled_gap,
            is_valid: self.is_valid,
            nightscout_id: self.nightscout_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    FingerStickBgValue,
    SensorChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GlucoseUnit {
    #[default]
    #[serde(rename = "mg/dl")]
    MgDl,
    #[serde(rename = "mmol")]
    Mmol,
}

/// Calibration or sensor-insertion marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TherapyEvent {
    pub timestamp: i64,
    pub kind: EventKind,
    pub glucose: Option<f64>,
    pub glucose_unit: GlucoseUnit,
}

/// Finger-stick calibration delivered alongside a CGM batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub timestamp: i64,
    pub value: f64,
    pub glucose_unit: GlucoseUnit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensor_parsing_is_lenient_about_separators() {
        assert_eq!("Libre-2".parse::<SourceSensor>(), Ok(SourceSensor::Libre2));
        assert_eq!("dexcom_g6".parse::<SourceSensor>(), Ok(SourceSensor::DexcomG6));
        assert_eq!("".parse::<SourceSensor>(), Ok(SourceSensor::Unknown));
        assert!("omnipod".parse::<SourceSensor>().is_err());
        for s in [SourceSensor::Libre3, SourceSensor::Xdrip, SourceSensor::DexcomG7] {
            assert_eq!(s.as_str().parse::<SourceSensor>(), Ok(s));
        }
    }

    #[test]
    fn content_equality_ignores_annotation_id() {
        let a = Reading::new(1_000, 120.0, SourceSensor::DexcomG6);
        let mut b = a.clone();
        b.nightscout_id = Some("ns-1".into());
        assert!(a.content_equals(&b));
        b.is_valid = false;
        assert!(!a.content_equals(&b));
    }

    #[test]
    fn sentinel_and_filled_gap_are_unusable() {
        let mut r = Reading::new(0, 39.0, SourceSensor::Libre2);
        assert!(r.is_sensor_error());
        assert!(!r.is_usable());
        r.value = 40.0;
        assert!(r.is_usable());
        r.filled_gap = true;
        assert!(!r.is_usable());
    }
}
