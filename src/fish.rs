//! Fish-count image log.
//!
//! Each camera upload is scored by the AI service, which fills in the
//! alive/dead counts and a JSON blob that may carry the annotated image path.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::{RawField, RawRecord};

pub const ALL_DEVICES: &str = "all";

// ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FishRecord {
    // ---
    pub id: Option<String>,
    pub device_id: Option<String>,
    pub created_at: Option<String>,
    pub alive: u32,
    pub dead: u32,
    pub status: String,
    pub local_path: Option<String>,
    pub annotated_path: Option<String>,
    pub conf_avg: Option<f64>,
}

/// Pull `annotated_path` out of the `ai_result_json` string.
///
/// Malformed JSON is not an error; it simply yields no path.
pub fn annotated_path(ai_result_json: &str) -> Option<String> {
    // ---
    let value: serde_json::Value = serde_json::from_str(ai_result_json).ok()?;
    value
        .get("annotated_path")
        .and_then(serde_json::Value::as_str)
        .map(String::from)
}

fn count(field: &Option<RawField>) -> u32 {
    field
        .as_ref()
        .and_then(RawField::as_f64)
        .map_or(0, |v| v.max(0.0).round() as u32)
}

impl FishRecord {
    pub fn from_raw(raw: &RawRecord) -> Self {
        // ---
        FishRecord {
            id: RawRecord::text(&raw.id),
            device_id: RawRecord::text(&raw.device_id).filter(|d| !d.is_empty()),
            created_at: RawRecord::text(&raw.created_at),
            alive: count(&raw.ai_alive_count),
            dead: count(&raw.ai_dead_count),
            status: RawRecord::text(&raw.ai_status)
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "pending".to_string()),
            local_path: RawRecord::text(&raw.local_path),
            annotated_path: RawRecord::text(&raw.ai_result_json).and_then(|s| annotated_path(&s)),
            conf_avg: raw.ai_conf_avg.as_ref().and_then(RawField::as_f64),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FishTotals {
    pub alive: u32,
    pub dead: u32,
}

/// Filtered view over the log plus the selectable device list.
#[derive(Debug, Clone, Serialize)]
pub struct FishSummary {
    pub rows: Vec<FishRecord>,
    pub devices: Vec<String>,
    pub totals: FishTotals,
}

/// Filter `records` to one device (or `all`) and total the counts.
pub fn summarize(records: &[FishRecord], device: &str) -> FishSummary {
    // ---
    let distinct: BTreeSet<&str> = records.iter().filter_map(|r| r.device_id.as_deref()).collect();
    let devices = std::iter::once(ALL_DEVICES)
        .chain(distinct)
        .map(String::from)
        .collect();

    let rows: Vec<FishRecord> = records
        .iter()
        .filter(|r| device == ALL_DEVICES || r.device_id.as_deref() == Some(device))
        .cloned()
        .collect();

    let totals = rows.iter().fold(FishTotals::default(), |acc, r| FishTotals {
        alive: acc.alive + r.alive,
        dead: acc.dead + r.dead,
    });

    FishSummary {
        rows,
        devices,
        totals,
    }
}
