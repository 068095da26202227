//! Application entry point for the `aquabox-monitor` service.
//!
//! This binary orchestrates the full startup sequence for the aquarium
//! monitor, including:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Starting the polling loops that keep the view state fresh
//! - Mounting all API routes via the `routes` gateway (EMBP pattern)
//! - Binding the Axum HTTP server and serving until Ctrl-C
//!
//! # Environment Variables
//! - `SENSOR_API_URL` (**required**) – sensor endpoint base URL
//! - `AQUABOX_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `AQUABOX_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! See [`config::load_from_env`] for the remaining settings.
//!
//! This module follows the Explicit Module Boundary Pattern (EMBP): polling
//! and view state live in `state`, configuration parsing in `config`, and
//! route registration in `routes`.
use std::{env, sync::Arc};

use axum::Router;
use dotenvy::dotenv;
use is_terminal::IsTerminal;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use anyhow::{Context, Result};

mod alerts;
mod classify;
mod client;
mod config;
mod devices;
mod fish;
mod models;
mod normalize;
mod poller;
mod routes;
mod series;
mod simulate;
mod state;

pub use config::Config;

// Re-exported for routes/*.rs so they depend on their parent module only.
pub use state::AppState;

use client::ApiClient;
use poller::SystemClock;
use state::Dashboard;

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    init_tracing();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let client = ApiClient::new(&cfg)?;
    let dashboard = Dashboard::start(&cfg, client, Arc::new(SystemClock));

    // Build app from routes gateway (EMBP)
    let app: Router = routes::router(dashboard.state());

    let listener = tokio::net::TcpListener::bind(&cfg.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.listen_addr))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped, stopping poll loops");
    dashboard.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    // ---
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

// ---

/// Initialize the global tracing subscriber for structured logging.
///
/// - Color output follows `FORCE_COLOR` (`1|true|yes`, `0|false|no`),
///   otherwise TTY detection
/// - Span events follow `AQUABOX_SPAN_EVENTS`: `full`, `enter_exit`, or
///   CLOSE only by default
/// - `RUST_LOG` wins when set; otherwise `AQUABOX_LOG_LEVEL` picks the level
fn init_tracing() {
    // ---
    let span_events = match env::var("AQUABOX_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("AQUABOX_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "debug",
        };
        EnvFilter::new(format!("{level},hyper=warn,reqwest=info"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
