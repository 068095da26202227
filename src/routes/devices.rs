// src/routes/devices.rs
//! Device board endpoints. State changes stay in memory.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::devices::DeviceKind;
use crate::AppState;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/devices", get(list))
        .route("/api/devices/feed", post(feed))
        .route("/api/devices/lights/toggle", post(toggle_lights))
        .route("/api/devices/{id}/toggle", post(toggle))
}

#[derive(Serialize)]
struct Changed {
    changed: usize,
}

async fn list(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.devices.read().await.summary())
}

async fn toggle(State(state): State<AppState>, Path(id): Path<u32>) -> impl IntoResponse {
    // ---
    let mut board = state.devices.write().await;
    match board.toggle(id) {
        Some(device) => Json(device.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, Json(format!("no device with id {id}"))).into_response(),
    }
}

async fn toggle_lights(State(state): State<AppState>) -> impl IntoResponse {
    let changed = state.devices.write().await.toggle_kind(DeviceKind::Light);
    Json(Changed { changed })
}

async fn feed(State(state): State<AppState>) -> impl IntoResponse {
    // ---
    let now = state.clock.now();
    let changed = state.devices.write().await.feed_now(now);
    tracing::info!("Manual feeding at {} on {} feeder(s)", now, changed);
    Json(Changed { changed })
}
