//! Simulated sensor source for the demo view.
//!
//! Produces raw records in the same shape the firmware posts, so the
//! simulated view exercises the full normalize/classify/alert pipeline.

use chrono::{DateTime, SecondsFormat, Utc};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::models::{RawField, RawRecord};

// ---

pub struct SimulatedSensor {
    rng: SmallRng,
}

impl SimulatedSensor {
    pub fn new(seed: Option<u64>) -> Self {
        // ---
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        Self { rng }
    }

    /// Draw one reading stamped at `now`.
    pub fn next_record(&mut self, now: DateTime<Utc>) -> RawRecord {
        // ---
        let mut draw = |lo: f64, hi: f64, places: i32| {
            let factor = 10f64.powi(places);
            (self.rng.random_range(lo..hi) * factor).round() / factor
        };

        RawRecord {
            device_id: Some(RawField::Text("simulator".to_string())),
            created_at: Some(RawField::Text(now.to_rfc3339_opts(SecondsFormat::Secs, true))),
            temperature_c: Some(RawField::Number(draw(25.0, 29.0, 1))),
            turbidity_ntu: Some(RawField::Number(draw(10.0, 25.0, 1))),
            current_a: Some(RawField::Number(draw(0.3, 0.8, 3))),
            dissolved_oxygen: Some(RawField::Number(draw(4.0, 7.0, 2))),
            water_level_cm: Some(RawField::Number(draw(12.0, 32.0, 2))),
            water_quality: Some(RawField::Text("TRONG".to_string())),
            ..RawRecord::default()
        }
    }
}
