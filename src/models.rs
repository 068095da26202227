//! Data models for the aquarium monitoring pipeline.
//!
//! `RawRecord` mirrors one row returned by the aquabox PHP endpoints. Every
//! field is optional and loosely typed because the firmware posts form data
//! that the server echoes back as strings, numbers or nulls. The typed
//! `SensorReading` is only ever built through the normalizer.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// ---

/// A loosely typed scalar as it appears on the wire.
///
/// Deserialization never fails: anything that is neither a number nor a
/// string lands in `Other` and is treated as absent by the accessors.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawField {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl RawField {
    /// Numeric view of the field. Non-finite results are rejected so a
    /// `"NaN"` string can never leak into classification.
    pub fn as_f64(&self) -> Option<f64> {
        // ---
        let value = match self {
            RawField::Number(n) => Some(*n),
            RawField::Text(s) => s.trim().parse::<f64>().ok(),
            RawField::Other(_) => None,
        };
        value.filter(|v| v.is_finite())
    }

    /// Textual view of the field; numbers are rendered without a trailing `.0`.
    pub fn as_text(&self) -> Option<String> {
        // ---
        match self {
            RawField::Text(s) => Some(s.clone()),
            RawField::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                Some(format!("{}", *n as i64))
            }
            RawField::Number(n) => Some(n.to_string()),
            RawField::Other(_) => None,
        }
    }
}

/// One record from the sensor or image endpoint.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawRecord {
    // ---
    pub id: Option<RawField>,
    pub device_id: Option<RawField>,
    pub created_at: Option<RawField>,
    pub temperature_c: Option<RawField>,
    pub turbidity_ntu: Option<RawField>,
    pub current_a: Option<RawField>,
    pub dissolved_oxygen: Option<RawField>,
    pub water_level_cm: Option<RawField>,
    pub water_quality: Option<RawField>,
    pub ai_alive_count: Option<RawField>,
    pub ai_dead_count: Option<RawField>,
    pub ai_status: Option<RawField>,
    pub ai_result_json: Option<RawField>,
    pub local_path: Option<RawField>,
    pub ai_conf_avg: Option<RawField>,
}

impl RawRecord {
    /// Parsed `created_at`, if present and in a recognised format.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        // ---
        self.created_at
            .as_ref()
            .and_then(RawField::as_text)
            .and_then(|s| parse_timestamp(&s))
    }

    /// Numeric value of the metric's source column.
    pub fn metric_field(&self, metric: Metric) -> Option<&RawField> {
        // ---
        match metric {
            Metric::Temperature => self.temperature_c.as_ref(),
            Metric::Turbidity => self.turbidity_ntu.as_ref(),
            Metric::Current => self.current_a.as_ref(),
            Metric::DissolvedOxygen => self.dissolved_oxygen.as_ref(),
            Metric::WaterLevel => self.water_level_cm.as_ref(),
        }
    }

    pub fn text(field: &Option<RawField>) -> Option<String> {
        field.as_ref().and_then(RawField::as_text)
    }
}

/// Response envelope shared by every endpoint: `{ success, data, count? }`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    // ---
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub count: Option<u64>,
}

/// `data` payload that may be one record or a list of them.
///
/// `Many` is tried first: a derived struct also accepts a JSON array as a
/// positional sequence, so the object arm would otherwise swallow lists.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl OneOrMany<RawRecord> {
    /// The record itself, or the newest of a list by `created_at`.
    ///
    /// Ties and unparseable timestamps resolve to the later list entry.
    /// An empty list yields `None`.
    pub fn into_newest(self) -> Option<RawRecord> {
        // ---
        match self {
            OneOrMany::One(record) => Some(record),
            OneOrMany::Many(records) => records.into_iter().max_by_key(RawRecord::timestamp),
        }
    }
}

/// Parse the timestamp formats the aquabox server emits.
///
/// MySQL `DATETIME` columns come back as `YYYY-MM-DD HH:MM:SS` without a
/// zone; those are taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    // ---
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

// ---

/// The five monitored quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    Temperature,
    Turbidity,
    Current,
    DissolvedOxygen,
    WaterLevel,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Temperature,
        Metric::Turbidity,
        Metric::Current,
        Metric::DissolvedOxygen,
        Metric::WaterLevel,
    ];

    /// Display precision (decimal places) of the normalized value.
    pub fn precision(self) -> usize {
        match self {
            Metric::Temperature | Metric::Turbidity => 1,
            Metric::Current => 3,
            Metric::DissolvedOxygen | Metric::WaterLevel => 2,
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Metric::Temperature => "°C",
            Metric::Turbidity => "NTU",
            Metric::Current => "A",
            Metric::DissolvedOxygen => "mg/L",
            Metric::WaterLevel => "cm",
        }
    }

    /// Human readable sensor name shown on cards and chart legends.
    pub fn label(self) -> &'static str {
        match self {
            Metric::Temperature => "Nhiệt độ nước",
            Metric::Turbidity => "Độ đục nước",
            Metric::Current => "Dòng điện máy bơm",
            Metric::DissolvedOxygen => "Oxy hòa tan",
            Metric::WaterLevel => "Mực nước",
        }
    }

    pub fn location(self) -> &'static str {
        match self {
            Metric::Current => "Máy bơm nước",
            _ => "Hồ cá chính",
        }
    }
}

/// Threshold band a value falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorStatus {
    Normal,
    Warning,
    Danger,
}

/// One normalized snapshot of all sensor values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    // ---
    pub temperature: f64,
    pub turbidity: f64,
    pub current: f64,
    pub dissolved_oxygen: f64,
    pub water_level: f64,
    pub water_quality: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl SensorReading {
    pub fn value(&self, metric: Metric) -> f64 {
        // ---
        match metric {
            Metric::Temperature => self.temperature,
            Metric::Turbidity => self.turbidity,
            Metric::Current => self.current,
            Metric::DissolvedOxygen => self.dissolved_oxygen,
            Metric::WaterLevel => self.water_level,
        }
    }

    /// Value rendered at the metric's display precision.
    pub fn formatted(&self, metric: Metric) -> String {
        format!("{:.*}", metric.precision(), self.value(metric))
    }
}

/// Status of every metric in one reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricStatuses {
    pub temperature: SensorStatus,
    pub turbidity: SensorStatus,
    pub current: SensorStatus,
    pub dissolved_oxygen: SensorStatus,
    pub water_level: SensorStatus,
}

impl MetricStatuses {
    pub fn get(&self, metric: Metric) -> SensorStatus {
        // ---
        match metric {
            Metric::Temperature => self.temperature,
            Metric::Turbidity => self.turbidity,
            Metric::Current => self.current,
            Metric::DissolvedOxygen => self.dissolved_oxygen,
            Metric::WaterLevel => self.water_level,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, SensorStatus)> + '_ {
        Metric::ALL.into_iter().map(move |m| (m, self.get(m)))
    }
}
