//! Reading normalizer: raw API record to typed `SensorReading`.
//!
//! Absent or unparseable numeric fields default to `0`; nothing here can
//! fail. Values are rounded to the per-metric display precision.

use crate::models::{Metric, RawField, RawRecord, SensorReading};

/// Label used when the firmware did not report a water quality verdict.
pub const UNKNOWN_WATER_QUALITY: &str = "UNKNOWN";

// ---

/// Parse a raw field as a finite number, defaulting to `0`.
pub fn field_value(field: Option<&RawField>) -> f64 {
    field.and_then(RawField::as_f64).unwrap_or(0.0)
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: usize) -> f64 {
    // ---
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    if rounded.is_finite() {
        rounded
    } else {
        value
    }
}

/// Build a `SensorReading` from one raw record.
pub fn normalize(raw: &RawRecord) -> SensorReading {
    // ---
    let value = |metric: Metric| round_to(field_value(raw.metric_field(metric)), metric.precision());

    let water_quality = RawRecord::text(&raw.water_quality)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNKNOWN_WATER_QUALITY.to_string());

    SensorReading {
        temperature: value(Metric::Temperature),
        turbidity: value(Metric::Turbidity),
        current: value(Metric::Current),
        dissolved_oxygen: value(Metric::DissolvedOxygen),
        water_level: value(Metric::WaterLevel),
        water_quality,
        created_at: raw.timestamp(),
    }
}
