// src/routes/alerts.rs
//! Alert list of the live view: read, dismiss one, reset all.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};

use crate::AppState;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/alerts", get(list).delete(reset))
        .route("/api/alerts/{index}", delete(dismiss))
}

async fn list(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.live.read().await.alerts.to_vec())
}

async fn dismiss(State(state): State<AppState>, Path(index): Path<usize>) -> impl IntoResponse {
    // ---
    let mut live = state.live.write().await;
    match live.alerts.dismiss(index) {
        Some(alert) => {
            tracing::info!("Dismissed alert {}: {}", index, alert.title);
            Json(alert).into_response()
        }
        None => (StatusCode::NOT_FOUND, Json(format!("no alert at index {index}"))).into_response(),
    }
}

async fn reset(State(state): State<AppState>) -> impl IntoResponse {
    // ---
    let mut live = state.live.write().await;
    let cleared = live.alerts.len();
    live.alerts.reset();
    tracing::info!("Cleared {} alerts", cleared);
    StatusCode::NO_CONTENT
}
