//! View state holder.
//!
//! Each polling loop owns one disjoint slice (latest reading, chart series,
//! simulated view, fish log). Slices are updated by reducers that take the
//! fetch outcome: `Ok` replaces the held data and marks the slice
//! connected, `Err` only flips the connection status and keeps the last
//! good data on display.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::alerts::{Alert, AlertLog};
use crate::classify::{classify_record, StatusOverview};
use crate::client::{ApiClient, FetchError};
use crate::devices::DeviceBoard;
use crate::fish::FishRecord;
use crate::models::{MetricStatuses, RawRecord, SensorReading};
use crate::normalize::normalize;
use crate::poller::{Clock, PollTask, Schedule};
use crate::series::{self, ChartSet};
use crate::simulate::SimulatedSensor;
use crate::Config;

// ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Connecting,
    Connected,
    Error,
}

/// Connection bookkeeping shared by every slice.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub status: ConnectionStatus,
    pub last_update: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
}

impl Link {
    fn succeeded(&mut self, now: DateTime<Utc>) {
        self.status = ConnectionStatus::Connected;
        self.last_update = Some(now);
        self.consecutive_failures = 0;
    }

    fn failed(&mut self) {
        self.status = ConnectionStatus::Error;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
    }
}

// ---

/// Latest reading with its statuses and alerts.
#[derive(Debug, Clone, Default)]
pub struct LiveView {
    pub link: Link,
    pub reading: Option<SensorReading>,
    pub statuses: Option<MetricStatuses>,
    pub alerts: AlertLog,
}

impl LiveView {
    /// Reducer for one latest-reading poll cycle.
    pub fn apply(&mut self, outcome: Result<RawRecord, FetchError>, now: DateTime<Utc>) {
        // ---
        match outcome {
            Ok(raw) => {
                let reading = normalize(&raw);
                let statuses = classify_record(&raw);
                self.alerts.derive(&reading, &statuses, now);
                self.reading = Some(reading);
                self.statuses = Some(statuses);
                self.link.succeeded(now);
            }
            Err(_) => self.link.failed(),
        }
    }

    pub fn overview(&self) -> StatusOverview {
        self.statuses
            .as_ref()
            .map(StatusOverview::from_statuses)
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> LiveSnapshot {
        // ---
        LiveSnapshot {
            connection: self.link.clone(),
            water_quality: self.reading.as_ref().map(|r| r.water_quality.clone()),
            reading: self.reading.clone(),
            statuses: self.statuses,
            overview: self.overview(),
            alerts: self.alerts.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSnapshot {
    pub connection: Link,
    pub reading: Option<SensorReading>,
    pub statuses: Option<MetricStatuses>,
    pub water_quality: Option<String>,
    pub overview: StatusOverview,
    pub alerts: Vec<Alert>,
}

/// Historical series for charts.
#[derive(Debug, Clone, Default)]
pub struct ChartView {
    pub link: Link,
    pub charts: ChartSet,
}

impl ChartView {
    pub fn apply(&mut self, outcome: Result<Vec<RawRecord>, FetchError>, now: DateTime<Utc>) {
        // ---
        match outcome {
            Ok(records) => {
                self.charts = series::build(&records);
                self.link.succeeded(now);
            }
            Err(_) => self.link.failed(),
        }
    }
}

/// Fish-count log rows.
#[derive(Debug, Clone, Default)]
pub struct FishView {
    pub link: Link,
    pub records: Vec<FishRecord>,
}

impl FishView {
    pub fn apply(&mut self, outcome: Result<Vec<RawRecord>, FetchError>, now: DateTime<Utc>) {
        // ---
        match outcome {
            Ok(raw) => {
                self.records = raw.iter().map(FishRecord::from_raw).collect();
                self.link.succeeded(now);
            }
            Err(_) => self.link.failed(),
        }
    }
}

// ---

/// Shared handles to every state slice; cheap to clone into handlers.
#[derive(Clone)]
pub struct AppState {
    pub live: Arc<RwLock<LiveView>>,
    pub charts: Arc<RwLock<ChartView>>,
    pub simulated: Option<Arc<RwLock<LiveView>>>,
    pub fish: Arc<RwLock<FishView>>,
    pub devices: Arc<RwLock<DeviceBoard>>,
    /// Whether a fish-log loop feeds `fish`.
    pub fish_enabled: bool,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(clock: Arc<dyn Clock>, simulated: bool, fish_enabled: bool) -> Self {
        // ---
        Self {
            live: Arc::default(),
            charts: Arc::default(),
            simulated: simulated.then(Arc::default),
            fish: Arc::default(),
            devices: Arc::new(RwLock::new(DeviceBoard::seeded())),
            fish_enabled,
            clock,
        }
    }
}

/// Owns the polling loops; dropping the view means calling `shutdown`.
pub struct Dashboard {
    state: AppState,
    cancel: CancellationToken,
    tasks: Vec<PollTask>,
}

impl Dashboard {
    /// Build the state and start every configured polling loop.
    pub fn start(config: &Config, client: ApiClient, clock: Arc<dyn Clock>) -> Self {
        // ---
        let state = AppState::new(
            clock.clone(),
            config.simulation_enabled,
            client.has_fish_log(),
        );
        let cancel = CancellationToken::new();
        let mut tasks = Vec::new();

        tasks.push(PollTask::watch(
            "latest",
            Schedule::Every(Duration::from_millis(config.latest_poll_ms)),
            cancel.clone(),
            Arc::downgrade(&state.live),
            clock.clone(),
            {
                let client = client.clone();
                move || {
                    let client = client.clone();
                    async move { client.fetch_latest().await }
                }
            },
            LiveView::apply,
        ));

        tasks.push(PollTask::watch(
            "history",
            Schedule::Every(Duration::from_millis(config.series_poll_ms)),
            cancel.clone(),
            Arc::downgrade(&state.charts),
            clock.clone(),
            {
                let client = client.clone();
                move || {
                    let client = client.clone();
                    async move { client.fetch_history().await }
                }
            },
            ChartView::apply,
        ));

        if let Some(simulated) = &state.simulated {
            let mut sensor = SimulatedSensor::new(config.simulation_seed);
            let sim_clock = clock.clone();
            tasks.push(PollTask::watch(
                "simulated",
                Schedule::Every(Duration::from_millis(config.simulated_poll_ms)),
                cancel.clone(),
                Arc::downgrade(simulated),
                clock.clone(),
                move || {
                    let record = sensor.next_record(sim_clock.now());
                    async move { Ok(record) }
                },
                LiveView::apply,
            ));
        }

        if client.has_fish_log() {
            // Without auto refresh the log loads once, like the manual page.
            let schedule = if config.fish_auto_refresh {
                Schedule::Every(Duration::from_millis(config.fish_poll_ms))
            } else {
                Schedule::Once
            };
            let client = client.clone();
            tasks.push(PollTask::watch(
                "fish",
                schedule,
                cancel.clone(),
                Arc::downgrade(&state.fish),
                clock,
                move || {
                    let client = client.clone();
                    async move { client.fetch_fish_log().await }
                },
                FishView::apply,
            ));
        }

        tracing::info!("Dashboard started with {} poll loops", tasks.len());
        Self {
            state,
            cancel,
            tasks,
        }
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Stop every loop; in-flight fetches finish but their results are dropped.
    pub async fn shutdown(self) {
        // ---
        self.cancel.cancel();
        for task in self.tasks {
            let name = task.name();
            task.join().await;
            tracing::debug!("Poll loop '{}' joined", name);
        }
    }
}
