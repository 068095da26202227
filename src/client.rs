//! HTTP client for the aquabox PHP endpoints.
//!
//! Three response shapes share the `{ success, data, count? }` envelope:
//! `GET {base}` (history list), `GET {base}?action=latest` (single record)
//! and `GET {base}?action=all` (image log list). Every failure mode collapses
//! into `FetchError`; callers only care about `FetchError::kind`.

use std::time::Duration;

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::models::{Envelope, OneOrMany, RawRecord};
use crate::Config;

// ---

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server answered HTTP {status}")]
    Status { status: u16 },

    #[error("empty response body")]
    EmptyBody,

    #[error("invalid JSON payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("request rejected: {reason}")]
    Rejected { reason: String },
}

/// Coarse failure class; all three collapse to the same `error` UI state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    Payload,
    Semantic,
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        // ---
        match self {
            FetchError::Transport(_) | FetchError::Status { .. } => FailureKind::Transport,
            FetchError::EmptyBody | FetchError::Payload(_) => FailureKind::Payload,
            FetchError::Rejected { .. } => FailureKind::Semantic,
        }
    }

    fn rejected(reason: &str) -> Self {
        FetchError::Rejected {
            reason: reason.to_string(),
        }
    }
}

/// Thin wrapper over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    sensor_url: String,
    fish_url: Option<String>,
}

impl ApiClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        // ---
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.http_timeout_ms))
            .build()?;
        Ok(Self::from_reqwest(
            http,
            &config.sensor_api_url,
            config.fish_api_url.as_deref(),
        ))
    }

    pub fn from_reqwest(http: reqwest::Client, sensor_url: &str, fish_url: Option<&str>) -> Self {
        Self {
            http,
            sensor_url: sensor_url.to_string(),
            fish_url: fish_url.map(String::from),
        }
    }

    pub fn has_fish_log(&self) -> bool {
        self.fish_url.is_some()
    }

    /// `GET {sensor}?action=latest`: the single newest reading.
    ///
    /// `data` may be one record or a list; a list yields its newest entry.
    pub async fn fetch_latest(&self) -> Result<RawRecord, FetchError> {
        // ---
        let envelope: Envelope<OneOrMany<RawRecord>> =
            self.get(&self.sensor_url, Some("latest")).await?;
        match envelope {
            Envelope { success: false, .. } => Err(FetchError::rejected("success=false")),
            Envelope { data: None, .. } => Err(FetchError::rejected("no data")),
            Envelope { data: Some(data), .. } => data
                .into_newest()
                .ok_or_else(|| FetchError::rejected("empty data")),
        }
    }

    /// `GET {sensor}`: the reading history used for charts.
    pub async fn fetch_history(&self) -> Result<Vec<RawRecord>, FetchError> {
        // ---
        let envelope: Envelope<Vec<RawRecord>> = self.get(&self.sensor_url, None).await?;
        if !envelope.success {
            return Err(FetchError::rejected("success=false"));
        }
        match envelope.data {
            Some(records) if !records.is_empty() => {
                debug!(
                    "History fetch returned {} records (count={:?})",
                    records.len(),
                    envelope.count
                );
                Ok(records)
            }
            _ => Err(FetchError::rejected("empty data")),
        }
    }

    /// `GET {fish}?action=all`: fish-count image log.
    ///
    /// The image endpoint does not always set `success`; a missing or
    /// non-list `data` is read as an empty log.
    pub async fn fetch_fish_log(&self) -> Result<Vec<RawRecord>, FetchError> {
        // ---
        let Some(url) = self.fish_url.as_deref() else {
            return Err(FetchError::rejected("fish log endpoint not configured"));
        };
        let value: serde_json::Value = self.get_json(url, Some("all")).await?;
        let records = match value.get("data") {
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|item| serde_json::from_value::<RawRecord>(item.clone()).ok())
                .collect(),
            _ => Vec::new(),
        };
        Ok(records)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        action: Option<&str>,
    ) -> Result<Envelope<T>, FetchError> {
        // ---
        let body = self.get_text(url, action).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn get_json(
        &self,
        url: &str,
        action: Option<&str>,
    ) -> Result<serde_json::Value, FetchError> {
        let body = self.get_text(url, action).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn get_text(&self, url: &str, action: Option<&str>) -> Result<String, FetchError> {
        // ---
        let mut request = self.http.get(url);
        if let Some(action) = action {
            request = request.query(&[("action", action)]);
        }
        debug!("GET {} (action={:?})", url, action);

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(FetchError::EmptyBody);
        }
        Ok(body)
    }
}
