// src/routes/fish.rs
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::fish::{summarize, FishSummary, ALL_DEVICES};
use crate::state::Link;
use crate::AppState;

// ---

pub fn router() -> Router<AppState> {
    Router::new().route("/api/fish", get(fish_log))
}

#[derive(Debug, Deserialize)]
struct FishQuery {
    device_id: Option<String>,
}

#[derive(Serialize)]
struct FishResponse {
    connection: Link,
    /// False when no image endpoint is configured.
    enabled: bool,
    #[serde(flatten)]
    summary: FishSummary,
}

async fn fish_log(State(state): State<AppState>, Query(query): Query<FishQuery>) -> impl IntoResponse {
    // ---
    let device = query
        .device_id
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(ALL_DEVICES);

    let view = state.fish.read().await;
    Json(FishResponse {
        connection: view.link.clone(),
        enabled: state.fish_enabled,
        summary: summarize(&view.records, device),
    })
}
