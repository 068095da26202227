// src/routes/charts.rs
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Metric;
use crate::series::{ChartPoint, ChartSeries};
use crate::state::Link;
use crate::AppState;

// ---

pub fn router() -> Router<AppState> {
    Router::new().route("/api/charts", get(charts))
}

#[derive(Debug, Deserialize)]
struct ChartsQuery {
    /// Restrict the response to one metric, e.g. `?metric=dissolvedOxygen`.
    metric: Option<Metric>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChartsResponse {
    connection: Link,
    /// Points per series after the rolling cap.
    total_points: usize,
    /// Rows received from upstream, including skipped ones.
    total_records: usize,
    skipped: usize,
    /// Timestamp of the newest plotted point.
    last_point_at: Option<DateTime<Utc>>,
    series: Vec<ChartSeries>,
}

async fn charts(State(state): State<AppState>, Query(query): Query<ChartsQuery>) -> impl IntoResponse {
    // ---
    let view = state.charts.read().await;
    let set = &view.charts;

    let series = match query.metric {
        Some(metric) => set.get(metric).cloned().into_iter().collect(),
        None => set.series.clone(),
    };
    let last_point_at = set
        .series
        .first()
        .and_then(|s| s.data.last())
        .map(ChartPoint::timestamp_ms)
        .and_then(DateTime::from_timestamp_millis);

    Json(ChartsResponse {
        connection: view.link.clone(),
        total_points: set.len(),
        total_records: set.total_records,
        skipped: set.skipped,
        last_point_at,
        series,
    })
}
