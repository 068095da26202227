//! Threshold classifier.
//!
//! Fixed per-metric status bands. Classification is stateless: every poll
//! re-derives statuses from the current reading alone, with no hysteresis.

use serde::Serialize;

use crate::models::{Metric, MetricStatuses, RawRecord, SensorStatus};
use crate::normalize::field_value;

// ---

pub fn temperature_status(celsius: f64) -> SensorStatus {
    // ---
    if !(24.0..=30.0).contains(&celsius) {
        SensorStatus::Danger
    } else if !(25.0..=29.0).contains(&celsius) {
        SensorStatus::Warning
    } else {
        SensorStatus::Normal
    }
}

pub fn turbidity_status(ntu: f64) -> SensorStatus {
    // ---
    if ntu > 500.0 {
        SensorStatus::Danger
    } else if ntu > 100.0 {
        SensorStatus::Warning
    } else {
        SensorStatus::Normal
    }
}

pub fn current_status(amps: f64) -> SensorStatus {
    // ---
    if amps > 1.0 {
        SensorStatus::Danger
    } else if amps > 0.7 {
        SensorStatus::Warning
    } else {
        SensorStatus::Normal
    }
}

pub fn dissolved_oxygen_status(mg_per_l: f64) -> SensorStatus {
    // ---
    if mg_per_l < 5.0 {
        SensorStatus::Danger
    } else if mg_per_l < 6.0 || mg_per_l > 12.0 {
        SensorStatus::Warning
    } else {
        SensorStatus::Normal
    }
}

pub fn water_level_status(cm: f64) -> SensorStatus {
    // ---
    if cm < 5.0 {
        SensorStatus::Danger
    } else if cm < 10.0 {
        SensorStatus::Warning
    } else {
        SensorStatus::Normal
    }
}

/// Classify a single value against the metric's bands.
pub fn classify(metric: Metric, value: f64) -> SensorStatus {
    match metric {
        Metric::Temperature => temperature_status(value),
        Metric::Turbidity => turbidity_status(value),
        Metric::Current => current_status(value),
        Metric::DissolvedOxygen => dissolved_oxygen_status(value),
        Metric::WaterLevel => water_level_status(value),
    }
}

/// Classify every metric, reading values through `value`.
pub fn classify_with(value: impl Fn(Metric) -> f64) -> MetricStatuses {
    // ---
    let status = |metric| classify(metric, value(metric));
    MetricStatuses {
        temperature: status(Metric::Temperature),
        turbidity: status(Metric::Turbidity),
        current: status(Metric::Current),
        dissolved_oxygen: status(Metric::DissolvedOxygen),
        water_level: status(Metric::WaterLevel),
    }
}

/// Classify a raw record at full precision.
///
/// Runs on the parsed values before display rounding, so a reading such as
/// 23.96 °C stays below the 24 °C danger bound even though it shows as 24.0.
pub fn classify_record(raw: &RawRecord) -> MetricStatuses {
    classify_with(|metric| field_value(raw.metric_field(metric)))
}

// ---

/// Recommended operating range shown next to each sensor card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SafeRange {
    pub min: f64,
    pub max: f64,
}

pub fn safe_range(metric: Metric) -> SafeRange {
    // ---
    let (min, max) = match metric {
        Metric::Temperature => (24.0, 30.0),
        Metric::Turbidity => (0.0, 100.0),
        Metric::Current => (0.3, 1.0),
        Metric::DissolvedOxygen => (6.0, 12.0),
        Metric::WaterLevel => (10.0, 40.0),
    };
    SafeRange { min, max }
}

/// Position of `value` inside `range` as a 0..=100 gauge fill.
pub fn gauge_percent(value: f64, range: SafeRange) -> f64 {
    // ---
    let span = range.max - range.min;
    if span <= 0.0 || !value.is_finite() {
        return 0.0;
    }
    ((value - range.min) / span * 100.0).clamp(0.0, 100.0)
}

/// Count of metrics in each band, as shown in the sensor overview panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusOverview {
    pub total: usize,
    pub normal: usize,
    pub warning: usize,
    pub danger: usize,
}

impl StatusOverview {
    pub fn from_statuses(statuses: &MetricStatuses) -> Self {
        // ---
        statuses.iter().fold(Self::default(), |mut acc, (_, status)| {
            acc.total += 1;
            match status {
                SensorStatus::Normal => acc.normal += 1,
                SensorStatus::Warning => acc.warning += 1,
                SensorStatus::Danger => acc.danger += 1,
            }
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    /// Reference implementation straight from the band definitions.
    fn expected_temperature(t: f64) -> SensorStatus {
        if t < 24.0 || t > 30.0 {
            SensorStatus::Danger
        } else if t < 25.0 || t > 29.0 {
            SensorStatus::Warning
        } else {
            SensorStatus::Normal
        }
    }

    #[test]
    fn test_temperature_bands_across_range() {
        // ---
        let mut t = 15.0;
        while t <= 40.0 {
            assert_eq!(temperature_status(t), expected_temperature(t), "t = {t}");
            t += 0.05;
        }
    }

    #[test]
    fn test_temperature_boundaries() {
        // ---
        assert_eq!(temperature_status(23.99), SensorStatus::Danger);
        assert_eq!(temperature_status(24.0), SensorStatus::Warning);
        assert_eq!(temperature_status(25.0), SensorStatus::Normal);
        assert_eq!(temperature_status(29.0), SensorStatus::Normal);
        assert_eq!(temperature_status(29.01), SensorStatus::Warning);
        assert_eq!(temperature_status(30.0), SensorStatus::Warning);
        assert_eq!(temperature_status(30.01), SensorStatus::Danger);
        assert_eq!(temperature_status(0.0), SensorStatus::Danger);
    }

    #[test]
    fn test_turbidity_boundaries() {
        // ---
        assert_eq!(turbidity_status(0.0), SensorStatus::Normal);
        assert_eq!(turbidity_status(100.0), SensorStatus::Normal);
        assert_eq!(turbidity_status(100.1), SensorStatus::Warning);
        assert_eq!(turbidity_status(500.0), SensorStatus::Warning);
        assert_eq!(turbidity_status(500.1), SensorStatus::Danger);
    }

    #[test]
    fn test_current_boundaries() {
        // ---
        assert_eq!(current_status(0.0), SensorStatus::Normal);
        assert_eq!(current_status(0.7), SensorStatus::Normal);
        assert_eq!(current_status(0.701), SensorStatus::Warning);
        assert_eq!(current_status(1.0), SensorStatus::Warning);
        assert_eq!(current_status(1.001), SensorStatus::Danger);
    }

    #[test]
    fn test_dissolved_oxygen_boundaries() {
        // ---
        assert_eq!(dissolved_oxygen_status(4.99), SensorStatus::Danger);
        assert_eq!(dissolved_oxygen_status(5.0), SensorStatus::Warning);
        assert_eq!(dissolved_oxygen_status(5.99), SensorStatus::Warning);
        assert_eq!(dissolved_oxygen_status(6.0), SensorStatus::Normal);
        assert_eq!(dissolved_oxygen_status(12.0), SensorStatus::Normal);
        assert_eq!(dissolved_oxygen_status(12.01), SensorStatus::Warning);
    }

    #[test]
    fn test_water_level_boundaries() {
        // ---
        assert_eq!(water_level_status(4.99), SensorStatus::Danger);
        assert_eq!(water_level_status(5.0), SensorStatus::Warning);
        assert_eq!(water_level_status(9.99), SensorStatus::Warning);
        assert_eq!(water_level_status(10.0), SensorStatus::Normal);
    }

    #[test]
    fn test_classify_dispatches_per_metric() {
        // ---
        assert_eq!(classify(Metric::Temperature, 26.0), SensorStatus::Normal);
        assert_eq!(classify(Metric::Turbidity, 150.0), SensorStatus::Warning);
        assert_eq!(classify(Metric::Current, 1.5), SensorStatus::Danger);
        assert_eq!(classify(Metric::DissolvedOxygen, 13.0), SensorStatus::Warning);
        assert_eq!(classify(Metric::WaterLevel, 2.0), SensorStatus::Danger);
    }

    #[test]
    fn test_record_classified_before_rounding() {
        // ---
        let raw: RawRecord = serde_json::from_value(serde_json::json!({
            "temperature_c": "23.96",
            "turbidity_ntu": "100.04",
            "current_a": "0.7004",
            "dissolved_oxygen": "5.996",
            "water_level_cm": "9.996"
        }))
        .unwrap();
        let statuses = classify_record(&raw);

        assert_eq!(statuses.temperature, SensorStatus::Danger);
        assert_eq!(statuses.turbidity, SensorStatus::Warning);
        assert_eq!(statuses.current, SensorStatus::Warning);
        assert_eq!(statuses.dissolved_oxygen, SensorStatus::Warning);
        assert_eq!(statuses.water_level, SensorStatus::Warning);

        let upper: RawRecord =
            serde_json::from_value(serde_json::json!({ "temperature_c": 29.04 })).unwrap();
        assert_eq!(classify_record(&upper).temperature, SensorStatus::Warning);
    }

    #[test]
    fn test_gauge_percent_is_clamped() {
        // ---
        let range = safe_range(Metric::Temperature);
        assert_eq!(gauge_percent(27.0, range), 50.0);
        assert_eq!(gauge_percent(10.0, range), 0.0);
        assert_eq!(gauge_percent(45.0, range), 100.0);
        assert_eq!(gauge_percent(1.0, SafeRange { min: 1.0, max: 1.0 }), 0.0);
    }

    #[test]
    fn test_overview_counts() {
        // ---
        let statuses = MetricStatuses {
            temperature: SensorStatus::Normal,
            turbidity: SensorStatus::Warning,
            current: SensorStatus::Normal,
            dissolved_oxygen: SensorStatus::Danger,
            water_level: SensorStatus::Warning,
        };
        let overview = StatusOverview::from_statuses(&statuses);
        assert_eq!(
            overview,
            StatusOverview {
                total: 5,
                normal: 2,
                warning: 2,
                danger: 1
            }
        );
    }
}
