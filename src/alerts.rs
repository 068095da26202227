//! Alert deriver.
//!
//! Every non-normal metric produces one alert with a fixed title per
//! metric and severity. Merging replaces alerts by title and keeps the
//! newest `MAX_ALERTS` entries in insertion order.

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Metric, MetricStatuses, SensorReading, SensorStatus};
use crate::normalize::UNKNOWN_WATER_QUALITY;

pub const MAX_ALERTS: usize = 5;

/// Marker the firmware puts in `water_quality` for turbid water.
const TURBID_MARKER: &str = "DUC";

// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Danger,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    // ---
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// Fixed alert title for a metric in a non-normal band.
pub fn alert_title(metric: Metric, status: SensorStatus) -> Option<&'static str> {
    // ---
    let title = match (metric, status) {
        (_, SensorStatus::Normal) => return None,
        (Metric::Temperature, SensorStatus::Danger) => "Nhiệt độ nước nguy hiểm",
        (Metric::Temperature, SensorStatus::Warning) => "Nhiệt độ nước bất thường",
        (Metric::Turbidity, SensorStatus::Danger) => "Nước quá đục",
        (Metric::Turbidity, SensorStatus::Warning) => "Nước hơi đục",
        (Metric::Current, SensorStatus::Danger) => "Dòng điện máy bơm quá cao",
        (Metric::Current, SensorStatus::Warning) => "Dòng điện máy bơm cao",
        (Metric::DissolvedOxygen, SensorStatus::Danger) => "Oxy hòa tan quá thấp",
        (Metric::DissolvedOxygen, SensorStatus::Warning) => "Oxy hòa tan bất thường",
        (Metric::WaterLevel, SensorStatus::Danger) => "Mực nước quá thấp",
        (Metric::WaterLevel, SensorStatus::Warning) => "Mực nước thấp",
    };
    Some(title)
}

fn alert_message(metric: Metric, status: SensorStatus, value: &str) -> String {
    // ---
    let danger = status == SensorStatus::Danger;
    match metric {
        Metric::Temperature if danger => {
            format!("Nhiệt độ nước hiện tại là {value}°C, ngoài khoảng an toàn 24-30°C")
        }
        Metric::Temperature => format!("Nhiệt độ nước {value}°C, mức lý tưởng là 25-29°C"),
        Metric::Turbidity if danger => {
            format!("Độ đục {value} NTU vượt ngưỡng 500 NTU, cần thay nước ngay")
        }
        Metric::Turbidity => format!("Độ đục hiện tại là {value} NTU, nên kiểm tra hệ thống lọc"),
        Metric::Current if danger => {
            format!("Dòng điện máy bơm {value} A vượt 1.0 A, cần kiểm tra máy bơm")
        }
        Metric::Current => format!("Dòng điện máy bơm {value} A, cao hơn mức bình thường"),
        Metric::DissolvedOxygen if danger => {
            format!("Nồng độ oxy {value} mg/L dưới 5 mg/L, nên bật máy sục khí ngay")
        }
        Metric::DissolvedOxygen => {
            format!("Nồng độ oxy {value} mg/L ngoài khoảng lý tưởng 6-12 mg/L")
        }
        Metric::WaterLevel if danger => format!("Mực nước {value} cm dưới 5 cm, cần bổ sung nước"),
        Metric::WaterLevel => format!("Mực nước {value} cm dưới mức an toàn 10 cm"),
    }
}

/// Alerts for the current reading alone, in metric order.
pub fn generate(
    reading: &SensorReading,
    statuses: &MetricStatuses,
    now: DateTime<Utc>,
) -> Vec<Alert> {
    // ---
    let mut alerts: Vec<Alert> = statuses
        .iter()
        .filter_map(|(metric, status)| {
            let title = alert_title(metric, status)?;
            let kind = match status {
                SensorStatus::Danger => AlertKind::Danger,
                _ => AlertKind::Warning,
            };
            Some(Alert {
                kind,
                title: title.to_string(),
                message: alert_message(metric, status, &reading.formatted(metric)),
                timestamp: now,
            })
        })
        .collect();

    let quality = reading.water_quality.as_str();
    if quality != UNKNOWN_WATER_QUALITY && quality.to_uppercase().contains(TURBID_MARKER) {
        alerts.push(Alert {
            kind: AlertKind::Info,
            title: format!("Chất lượng nước: {quality}"),
            message: "Đánh giá tự động từ cảm biến độ đục".to_string(),
            timestamp: now,
        });
    }

    alerts
}

// ---

/// Bounded, title-deduplicated alert list held by a view.
#[derive(Debug, Clone, Default)]
pub struct AlertLog {
    entries: VecDeque<Alert>,
}

impl AlertLog {
    /// Merge freshly generated alerts into the log.
    ///
    /// Existing entries sharing a title with a fresh one are removed, the
    /// fresh ones are appended, and the oldest entries beyond
    /// `MAX_ALERTS` are evicted.
    pub fn merge(&mut self, fresh: Vec<Alert>) {
        // ---
        let titles: HashSet<&str> = fresh.iter().map(|a| a.title.as_str()).collect();
        self.entries.retain(|a| !titles.contains(a.title.as_str()));

        for alert in fresh {
            if let Some(pos) = self.entries.iter().position(|a| a.title == alert.title) {
                self.entries.remove(pos);
            }
            self.entries.push_back(alert);
        }

        while self.entries.len() > MAX_ALERTS {
            self.entries.pop_front();
        }
    }

    /// Generate alerts for `reading` and merge them in.
    pub fn derive(&mut self, reading: &SensorReading, statuses: &MetricStatuses, now: DateTime<Utc>) {
        self.merge(generate(reading, statuses, now));
    }

    /// Remove the alert at `index`, returning it.
    pub fn dismiss(&mut self, index: usize) -> Option<Alert> {
        self.entries.remove(index)
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_vec(&self) -> Vec<Alert> {
        self.entries.iter().cloned().collect()
    }

    #[cfg(test)]
    pub fn titles(&self) -> Vec<&str> {
        self.entries.iter().map(|a| a.title.as_str()).collect()
    }
}
