//! Chart series builder.
//!
//! Turns a batch of raw records into one `[timestamp_ms, value]` series per
//! metric, time ascending, capped to the most recent `SERIES_CAP` records.

use serde::Serialize;

use crate::models::{Metric, RawRecord};
use crate::normalize::field_value;

pub const SERIES_CAP: usize = 100;

// ---

/// One chart sample, serialized as a two element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint(pub i64, pub f64);

impl ChartPoint {
    pub fn timestamp_ms(&self) -> i64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub metric: Metric,
    pub name: &'static str,
    pub unit: &'static str,
    pub data: Vec<ChartPoint>,
}

/// All per-metric series built from one history fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSet {
    pub series: Vec<ChartSeries>,
    /// Records received before capping.
    pub total_records: usize,
    /// Records dropped for lacking a parseable `created_at`.
    pub skipped: usize,
}

impl ChartSet {
    pub fn get(&self, metric: Metric) -> Option<&ChartSeries> {
        self.series.iter().find(|s| s.metric == metric)
    }

    pub fn len(&self) -> usize {
        self.series.first().map_or(0, |s| s.data.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Build chart series from `records`.
///
/// Records are re-sorted ascending by `created_at` with a stable sort, so
/// equal timestamps keep their input order. Missing numeric fields plot as
/// `0` rather than being dropped or interpolated.
pub fn build(records: &[RawRecord]) -> ChartSet {
    // ---
    let mut stamped: Vec<(i64, &RawRecord)> = records
        .iter()
        .filter_map(|r| r.timestamp().map(|ts| (ts.timestamp_millis(), r)))
        .collect();
    let skipped = records.len() - stamped.len();
    if skipped > 0 {
        tracing::debug!("Skipping {} records without a usable created_at", skipped);
    }

    stamped.sort_by_key(|(ts, _)| *ts);
    let recent = &stamped[stamped.len().saturating_sub(SERIES_CAP)..];

    let series = Metric::ALL
        .into_iter()
        .map(|metric| ChartSeries {
            metric,
            name: metric.label(),
            unit: metric.unit(),
            data: recent
                .iter()
                .map(|(ts, r)| ChartPoint(*ts, field_value(r.metric_field(metric))))
                .collect(),
        })
        .collect();

    ChartSet {
        series,
        total_records: records.len(),
        skipped,
    }
}
