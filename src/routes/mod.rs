use axum::Router;

use crate::AppState;

mod alerts;
mod charts;
mod dashboard;
mod devices;
mod fish;
mod health;

// ---

pub fn router(state: AppState) -> Router {
    // ---
    Router::new()
        .merge(dashboard::router())
        .merge(charts::router())
        .merge(alerts::router())
        .merge(devices::router())
        .merge(fish::router())
        .merge(health::router())
        .with_state(state)
}
