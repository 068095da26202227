//! Configuration loader for the `aquabox-monitor` service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). Poll periods are in milliseconds.
//!
use std::env;

use anyhow::{anyhow, bail, Result};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u64 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.trim().parse::<u64>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse an optional boolean flag (`1|true|yes` / `0|false|no`).
macro_rules! parse_env_bool {
    ($var_name:expr, $default:expr) => {
        match env::var($var_name).ok().as_deref().map(str::trim) {
            None | Some("") => $default,
            Some("1") | Some("true") | Some("TRUE") | Some("yes") => true,
            Some("0") | Some("false") | Some("FALSE") | Some("no") => false,
            Some(other) => return Err(anyhow!("Invalid {}: {:?}", $var_name, other)),
        }
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Sensor endpoint base URL (`test_data.php`).
    pub sensor_api_url: String,

    /// Image/AI endpoint base URL (`upload_image.php`); fish log is off when unset.
    pub fish_api_url: Option<String>,

    /// Address the JSON surface binds to.
    pub listen_addr: String,

    pub latest_poll_ms: u64,
    pub series_poll_ms: u64,
    pub simulated_poll_ms: u64,
    pub fish_poll_ms: u64,

    /// Run the simulated sensor view alongside the real one.
    pub simulation_enabled: bool,
    pub simulation_seed: Option<u64>,

    /// Keep re-fetching the fish log instead of loading it once.
    pub fish_auto_refresh: bool,

    /// Per-request timeout for upstream calls.
    pub http_timeout_ms: u64,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `SENSOR_API_URL` – sensor endpoint base URL
///
/// Optional:
/// - `FISH_API_URL` – image log endpoint (default: disabled)
/// - `LISTEN_ADDR` – bind address (default: 0.0.0.0:8080)
/// - `LATEST_POLL_MS` / `SERIES_POLL_MS` / `SIMULATED_POLL_MS` / `FISH_POLL_MS`
///   (defaults: 5000 / 30000 / 3000 / 5000)
/// - `SIMULATION_ENABLED`, `SIMULATION_SEED`, `FISH_AUTO_REFRESH`
/// - `HTTP_TIMEOUT_MS` – upstream timeout (default: 10000)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let sensor_api_url = require_env!("SENSOR_API_URL");
    let fish_api_url = env::var("FISH_API_URL").ok().filter(|v| !v.trim().is_empty());
    let listen_addr = env::var("LISTEN_ADDR").unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string());

    let simulation_seed = match env::var("SIMULATION_SEED") {
        Ok(v) if !v.trim().is_empty() => Some(
            v.trim()
                .parse::<u64>()
                .map_err(|e| anyhow!("Invalid SIMULATION_SEED: {}", e))?,
        ),
        _ => None,
    };

    let cfg = Config {
        sensor_api_url,
        fish_api_url,
        listen_addr,
        latest_poll_ms: parse_env_u64!("LATEST_POLL_MS", 5_000),
        series_poll_ms: parse_env_u64!("SERIES_POLL_MS", 30_000),
        simulated_poll_ms: parse_env_u64!("SIMULATED_POLL_MS", 3_000),
        fish_poll_ms: parse_env_u64!("FISH_POLL_MS", 5_000),
        simulation_enabled: parse_env_bool!("SIMULATION_ENABLED", false),
        simulation_seed,
        fish_auto_refresh: parse_env_bool!("FISH_AUTO_REFRESH", false),
        http_timeout_ms: parse_env_u64!("HTTP_TIMEOUT_MS", 10_000),
    };
    cfg.validate()?;
    Ok(cfg)
}

impl Config {
    /// Reject settings that would spin a poll loop or never time out.
    pub fn validate(&self) -> Result<()> {
        // ---
        let periods = [
            ("LATEST_POLL_MS", self.latest_poll_ms),
            ("SERIES_POLL_MS", self.series_poll_ms),
            ("SIMULATED_POLL_MS", self.simulated_poll_ms),
            ("FISH_POLL_MS", self.fish_poll_ms),
            ("HTTP_TIMEOUT_MS", self.http_timeout_ms),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, v)| *v == 0) {
            bail!("{} must be greater than zero", name);
        }
        if !self.sensor_api_url.starts_with("http://") && !self.sensor_api_url.starts_with("https://") {
            bail!("SENSOR_API_URL must be an http(s) URL, got {:?}", self.sensor_api_url);
        }
        Ok(())
    }

    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  SENSOR_API_URL     : {}", self.sensor_api_url);
        tracing::info!(
            "  FISH_API_URL       : {}",
            self.fish_api_url.as_deref().unwrap_or("(disabled)")
        );
        tracing::info!("  LISTEN_ADDR        : {}", self.listen_addr);
        tracing::info!("  LATEST_POLL_MS     : {}", self.latest_poll_ms);
        tracing::info!("  SERIES_POLL_MS     : {}", self.series_poll_ms);
        tracing::info!(
            "  SIMULATION_ENABLED : {} (every {} ms)",
            self.simulation_enabled,
            self.simulated_poll_ms
        );
        tracing::info!(
            "  FISH_AUTO_REFRESH  : {} (every {} ms)",
            self.fish_auto_refresh,
            self.fish_poll_ms
        );
        tracing::info!("  HTTP_TIMEOUT_MS    : {}", self.http_timeout_ms);
    }
}
