// src/routes/dashboard.rs
//! Latest-reading views: the dashboard summary, per-sensor cards and the
//! simulated demo view.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use tracing::debug;

use crate::classify::{gauge_percent, safe_range, SafeRange};
use crate::models::{Metric, SensorStatus};
use crate::state::{Link, LiveView};
use crate::AppState;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/dashboard", get(dashboard))
        .route("/api/sensors", get(sensors))
        .route("/api/simulated", get(simulated))
}

async fn dashboard(State(state): State<AppState>) -> impl IntoResponse {
    // ---
    debug!("GET /api/dashboard");
    let live = state.live.read().await;
    Json(live.snapshot())
}

async fn simulated(State(state): State<AppState>) -> impl IntoResponse {
    // ---
    match &state.simulated {
        Some(view) => Json(view.read().await.snapshot()).into_response(),
        None => (StatusCode::NOT_FOUND, Json("simulation disabled")).into_response(),
    }
}

/// One sensor card as rendered by the sensors page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SensorCard {
    metric: Metric,
    name: &'static str,
    location: &'static str,
    unit: &'static str,
    /// Display string at the metric's precision, `None` before first data.
    value: Option<String>,
    status: SensorStatus,
    range: SafeRange,
    percentage: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SensorsResponse {
    connection: Link,
    water_quality: Option<String>,
    sensors: Vec<SensorCard>,
}

fn sensor_cards(live: &LiveView) -> Vec<SensorCard> {
    // ---
    Metric::ALL
        .into_iter()
        .map(|metric| {
            let range = safe_range(metric);
            let value = live.reading.as_ref().map(|r| r.value(metric));
            SensorCard {
                metric,
                name: metric.label(),
                location: metric.location(),
                unit: metric.unit(),
                value: live.reading.as_ref().map(|r| r.formatted(metric)),
                status: live
                    .statuses
                    .map_or(SensorStatus::Normal, |s| s.get(metric)),
                range,
                percentage: value.map_or(0.0, |v| gauge_percent(v, range)),
            }
        })
        .collect()
}

async fn sensors(State(state): State<AppState>) -> impl IntoResponse {
    // ---
    let live = state.live.read().await;
    Json(SensorsResponse {
        connection: live.link.clone(),
        water_quality: live.reading.as_ref().map(|r| r.water_quality.clone()),
        sensors: sensor_cards(&live),
    })
}
