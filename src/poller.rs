//! Cancellable fixed-period polling.
//!
//! A `PollTask` runs its job immediately and then once per period until the
//! shared `CancellationToken` fires. The job is awaited before the next tick
//! is taken, so one loop never has two fetches in flight. Elapsed time is
//! tokio's clock, which tests pause and advance deterministically; wall-clock
//! timestamps come from an injected `Clock`.

use std::future::Future;
use std::ops::ControlFlow;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::FetchError;

// ---

/// Source of wall-clock timestamps.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// When a loop fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Run the job a single time.
    Once,
    /// Run immediately, then once per period.
    Every(Duration),
}

/// Handle to a spawned polling loop.
#[derive(Debug)]
pub struct PollTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl PollTask {
    /// Spawn `job` on `schedule`.
    ///
    /// The loop exits when `cancel` fires or when the job returns
    /// `ControlFlow::Break`.
    pub fn spawn<F, Fut>(
        name: &'static str,
        schedule: Schedule,
        cancel: CancellationToken,
        mut job: F,
    ) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send + 'static,
    {
        // ---
        let handle = tokio::spawn(async move {
            info!("Poll loop '{}' started ({:?})", name, schedule);
            match schedule {
                Schedule::Once => {
                    if !cancel.is_cancelled() && job().await.is_break() {
                        debug!("Poll loop '{}' stopped by its job", name);
                    }
                }
                Schedule::Every(period) => {
                    let mut ticker = interval(period);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    loop {
                        tokio::select! {
                            biased;
                            () = cancel.cancelled() => break,
                            _ = ticker.tick() => {}
                        }
                        if job().await.is_break() {
                            break;
                        }
                    }
                }
            }
            info!("Poll loop '{}' stopped", name);
        });
        Self { name, handle }
    }

    /// Spawn a fetch-and-reduce loop over one state slice.
    ///
    /// Each cycle awaits `fetch`, then hands the outcome to `apply` under the
    /// slice's write lock. A completion that arrives after cancellation, or
    /// after the slice has been dropped, is discarded and ends the loop.
    pub fn watch<S, T, Fetch, FetchFut, Apply>(
        name: &'static str,
        schedule: Schedule,
        cancel: CancellationToken,
        slice: Weak<RwLock<S>>,
        clock: Arc<dyn Clock>,
        mut fetch: Fetch,
        apply: Apply,
    ) -> Self
    where
        S: Send + Sync + 'static,
        T: Send + 'static,
        Fetch: FnMut() -> FetchFut + Send + 'static,
        FetchFut: Future<Output = Result<T, FetchError>> + Send + 'static,
        Apply: Fn(&mut S, Result<T, FetchError>, DateTime<Utc>) + Send + Sync + 'static,
    {
        // ---
        let apply = Arc::new(apply);
        let token = cancel.clone();
        Self::spawn(name, schedule, cancel, move || {
            let pending = fetch();
            let slice = slice.clone();
            let clock = clock.clone();
            let apply = apply.clone();
            let token = token.clone();
            async move {
                let outcome = pending.await;
                if token.is_cancelled() {
                    debug!("Discarding '{}' result that completed after teardown", name);
                    return ControlFlow::Break(());
                }
                let Some(slice) = slice.upgrade() else {
                    debug!("State for '{}' dropped, stopping", name);
                    return ControlFlow::Break(());
                };
                if let Err(e) = &outcome {
                    warn!("Poll '{}' failed ({:?}): {}", name, e.kind(), e);
                }
                let mut guard = slice.write().await;
                apply(&mut guard, outcome, clock.now());
                ControlFlow::Continue(())
            }
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Wait for the loop to exit after cancellation.
    pub async fn join(self) {
        // ---
        if let Err(e) = self.handle.await {
            warn!("Poll loop '{}' ended abnormally: {}", self.name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::sleep;

    #[derive(Debug, Default)]
    struct Counter {
        ok: usize,
        failed: usize,
    }

    fn epoch_clock() -> Arc<dyn Clock> {
        struct Epoch;
        impl Clock for Epoch {
            fn now(&self) -> DateTime<Utc> {
                DateTime::from_timestamp(0, 0).unwrap()
            }
        }
        Arc::new(Epoch)
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_immediately_then_every_period() {
        // ---
        let runs = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();
        let task = PollTask::spawn("count", Schedule::Every(Duration::from_secs(5)), cancel.clone(), {
            let runs = runs.clone();
            move || {
                runs.fetch_add(1, Ordering::SeqCst);
                async { ControlFlow::Continue(()) }
            }
        });

        sleep(Duration::from_millis(12_500)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);

        cancel.cancel();
        task.join().await;
        sleep(Duration::from_secs(60)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_once_runs_a_single_time() {
        // ---
        let runs = Arc::new(AtomicUsize::new(0));
        let task = PollTask::spawn("once", Schedule::Once, CancellationToken::new(), {
            let runs = runs.clone();
            move || {
                runs.fetch_add(1, Ordering::SeqCst);
                async { ControlFlow::Continue(()) }
            }
        });

        task.join().await;
        sleep(Duration::from_secs(3600)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_job_never_overlaps() {
        // ---
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();
        let task = PollTask::spawn("slow", Schedule::Every(Duration::from_secs(5)), cancel.clone(), {
            let in_flight = in_flight.clone();
            let max_seen = max_seen.clone();
            move || {
                let in_flight = in_flight.clone();
                let max_seen = max_seen.clone();
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    sleep(Duration::from_secs(12)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    ControlFlow::Continue(())
                }
            }
        });

        sleep(Duration::from_secs(60)).await;
        cancel.cancel();
        task.join().await;
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_applies_successes_and_failures() {
        // ---
        let state = Arc::new(RwLock::new(Counter::default()));
        let cancel = CancellationToken::new();
        let attempt = Arc::new(AtomicUsize::new(0));

        let task = PollTask::watch(
            "alternating",
            Schedule::Every(Duration::from_secs(5)),
            cancel.clone(),
            Arc::downgrade(&state),
            epoch_clock(),
            {
                let attempt = attempt.clone();
                move || {
                    let n = attempt.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if n % 2 == 0 {
                            Ok(n)
                        } else {
                            Err(FetchError::EmptyBody)
                        }
                    }
                }
            },
            |s: &mut Counter, outcome: Result<usize, FetchError>, _now| match outcome {
                Ok(_) => s.ok += 1,
                Err(_) => s.failed += 1,
            },
        );

        sleep(Duration::from_millis(17_500)).await;
        cancel.cancel();
        task.join().await;

        let s = state.read().await;
        assert_eq!(s.ok, 2);
        assert_eq!(s.failed, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_after_teardown_is_ignored() {
        // ---
        let state = Arc::new(RwLock::new(Counter::default()));
        let cancel = CancellationToken::new();

        let task = PollTask::watch(
            "in-flight",
            Schedule::Every(Duration::from_secs(5)),
            cancel.clone(),
            Arc::downgrade(&state),
            epoch_clock(),
            || async {
                sleep(Duration::from_secs(10)).await;
                Ok::<_, FetchError>(())
            },
            |s: &mut Counter, _outcome: Result<(), FetchError>, _now| s.ok += 1,
        );

        sleep(Duration::from_secs(2)).await;
        cancel.cancel();
        sleep(Duration::from_secs(30)).await;
        task.join().await;

        assert_eq!(state.read().await.ok, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_state_stops_loop() {
        // ---
        let state = Arc::new(RwLock::new(Counter::default()));
        let cancel = CancellationToken::new();
        let fetches = Arc::new(AtomicUsize::new(0));

        let task = PollTask::watch(
            "orphan",
            Schedule::Every(Duration::from_secs(5)),
            cancel,
            Arc::downgrade(&state),
            epoch_clock(),
            {
                let fetches = fetches.clone();
                move || {
                    fetches.fetch_add(1, Ordering::SeqCst);
                    async { Ok::<_, FetchError>(()) }
                }
            },
            |s: &mut Counter, _outcome: Result<(), FetchError>, _now| s.ok += 1,
        );

        sleep(Duration::from_secs(1)).await;
        drop(state);
        task.join().await;
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }
}
