//! Periodic full refresh of the cached tree.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use wardenview_core::Config;

/// Something that can run a full refresh and report when the last one was.
pub trait Refresh: Clone + Send + Sync + 'static {
    /// Milliseconds since the epoch of the last successful full refresh.
    fn last_update(&self) -> impl Future<Output = Option<i64>> + Send;

    /// Run a full refresh; `true` on success.
    fn refresh(&self) -> impl Future<Output = bool> + Send;
}

/// Whether the cache is stale.
///
/// Missing timestamps always need a refresh. A timestamp in the future (clock
/// moved backwards) counts as fresh until the interval has elapsed from it.
pub fn needs_refresh(last_update: Option<i64>, now_ms: i64, interval_ms: u64) -> bool {
    match last_update {
        None => true,
        Some(last) => {
            let interval = i64::try_from(interval_ms).unwrap_or(i64::MAX);
            now_ms.saturating_sub(last) >= interval
        }
    }
}

pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Refreshing,
}

/// Running scheduler. Dropping it stops the timer.
pub struct SchedulerHandle {
    in_flight: Arc<AtomicUsize>,
    timer: JoinHandle<()>,
}

impl SchedulerHandle {
    /// `Refreshing` while at least one refresh is running.
    pub fn state(&self) -> SchedulerState {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            SchedulerState::Refreshing
        } else {
            SchedulerState::Idle
        }
    }

    /// Stop the timer. Refreshes already running finish on their own.
    pub fn shutdown(self) {
        self.timer.abort();
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.timer.abort();
    }
}

/// Decrements the in-flight counter even if the refresh task is aborted.
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn spawn_refresh<R: Refresh>(refresher: &R, in_flight: &Arc<AtomicUsize>, reason: &'static str) {
    let refresher = refresher.clone();
    let guard = InFlight::enter(in_flight);
    tokio::spawn(async move {
        let _guard = guard;
        info!("Refreshing ({})", reason);
        if refresher.refresh().await {
            debug!("Refresh ({}) finished", reason);
        } else {
            warn!("Refresh ({}) failed; keeping cached data", reason);
        }
    });
}

pub struct RefreshScheduler;

impl RefreshScheduler {
    /// Start refreshing through `refresher`.
    ///
    /// A stale cache is refreshed once after the startup delay. Independently,
    /// a timer refreshes every interval whether or not a refresh is already
    /// running.
    pub fn start<R: Refresh>(refresher: R, config: &Config) -> SchedulerHandle {
        let interval = config.refresh_interval().max(Duration::from_millis(1));
        let interval_ms = config.refresh_interval_ms;
        let startup_delay = config.startup_delay();
        let in_flight = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&in_flight);

        let timer = tokio::spawn(async move {
            let started = Instant::now();
            if needs_refresh(refresher.last_update().await, now_ms(), interval_ms) {
                sleep(startup_delay).await;
                spawn_refresh(&refresher, &counter, "stale cache");
            } else {
                debug!("Cache is fresh; waiting for the next interval");
            }

            let Some(first_tick) = started.checked_add(interval) else {
                warn!("Refresh interval of {} ms is out of range; timer disabled", interval_ms);
                return;
            };
            let mut ticker = interval_at(first_tick, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                spawn_refresh(&refresher, &counter, "interval");
            }
        });

        SchedulerHandle { in_flight, timer }
    }
}
