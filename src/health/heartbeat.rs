//! In-process heartbeat pinger.
//!
//! # Responsibilities
//! - Periodically probe the hosted process's own liveness endpoint
//! - Back off exponentially while the endpoint keeps failing
//! - Alert (log only) once the failure streak reaches the threshold
//!
//! # Design Decisions
//! - One probe in flight at most; the next cycle is scheduled from the
//!   previous cycle's start, so a missed deadline gives one immediate probe
//! - Every `start()` opens a new generation; results from an older
//!   generation are dropped, which makes `stop()` race-free
//! - The delay after a probe is computed from the streak as of that probe

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use url::Url;

use crate::config::KeepAliveConfig;
use crate::health::probe::{endpoint_url, record_attempt, PingAttempt, Prober};
use crate::health::state::FailureStreak;
use crate::health::stats::{RollingStats, StatsSnapshot};
use crate::health::HealthError;
use crate::observability::metrics;
use crate::resilience::backoff::next_interval;

const COMPONENT: &str = "heartbeat";

/// Schedules self-pings with adaptive backoff.
pub struct HeartbeatPinger {
    settings: Arc<PingerSettings>,
    prober: Prober,
    shared: Arc<Mutex<PingerShared>>,
}

#[derive(Debug)]
struct PingerSettings {
    target: Url,
    base_interval: Duration,
    backoff_cap: Duration,
    max_consecutive_failures: u32,
}

struct PingerShared {
    generation: u64,
    running: bool,
    streak: FailureStreak,
    next_interval: Duration,
    last_ping: Option<DateTime<Utc>>,
    last_status: Option<u16>,
    stats: RollingStats,
    task: Option<RunningTask>,
}

struct RunningTask {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Result of `HeartbeatPinger::status`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PingerStatus {
    pub running: bool,
    pub target: String,
    /// Delay that applies to the next probe.
    pub interval_ms: u64,
    pub base_interval_ms: u64,
    pub last_ping_timestamp: Option<DateTime<Utc>>,
    pub last_status: Option<u16>,
    pub consecutive_failures: u32,
    pub alerting: bool,
    pub stats: StatsSnapshot,
}

impl HeartbeatPinger {
    /// Pinger for `{primary target}{health_path}`.
    pub fn new(config: &KeepAliveConfig, prober: Prober) -> Result<Self, HealthError> {
        let base = config.primary_target().ok_or(HealthError::NoTarget)?;
        let target = endpoint_url(base, &config.health_path)?;

        let settings = PingerSettings {
            target,
            base_interval: config.base_interval(),
            backoff_cap: config.backoff_cap(),
            max_consecutive_failures: config.max_consecutive_failures,
        };

        let shared = PingerShared {
            generation: 0,
            running: false,
            streak: FailureStreak::default(),
            next_interval: settings.base_interval,
            last_ping: None,
            last_status: None,
            stats: RollingStats::default(),
            task: None,
        };

        Ok(Self {
            settings: Arc::new(settings),
            prober,
            shared: Arc::new(Mutex::new(shared)),
        })
    }

    /// Begin pinging. A second call while running is a no-op.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) {
        let mut shared = lock(&self.shared);
        if shared.running {
            tracing::warn!(
                target_url = %self.settings.target,
                "Heartbeat pinger already running, start ignored"
            );
            return;
        }

        shared.generation += 1;
        shared.running = true;
        shared.streak.reset();
        shared.next_interval = self.settings.base_interval;

        let (stop_tx, stop_rx) = watch::channel(false);
        let worker = Worker {
            generation: shared.generation,
            settings: self.settings.clone(),
            prober: self.prober.clone(),
            shared: self.shared.clone(),
        };
        let handle = tokio::spawn(worker.run(stop_rx));
        shared.task = Some(RunningTask { stop_tx, handle });

        tracing::info!(
            target_url = %self.settings.target,
            interval_ms = duration_ms(self.settings.base_interval),
            cap_ms = duration_ms(self.settings.backoff_cap),
            max_consecutive_failures = self.settings.max_consecutive_failures,
            "Heartbeat pinger started"
        );
    }

    /// Halt pinging. Idempotent.
    ///
    /// Once this returns no further probe is scheduled and the result of an
    /// in-flight probe is discarded.
    pub fn stop(&self) {
        let task = {
            let mut shared = lock(&self.shared);
            if !shared.running {
                tracing::debug!("Heartbeat pinger not running, stop ignored");
                return;
            }
            shared.running = false;
            shared.generation += 1;
            shared.task.take()
        };

        if let Some(task) = task {
            let _ = task.stop_tx.send(true);
            task.handle.abort();
        }

        tracing::info!(target_url = %self.settings.target, "Heartbeat pinger stopped");
    }

    pub fn is_running(&self) -> bool {
        lock(&self.shared).running
    }

    pub fn status(&self) -> PingerStatus {
        let shared = lock(&self.shared);
        PingerStatus {
            running: shared.running,
            target: self.settings.target.to_string(),
            interval_ms: duration_ms(shared.next_interval),
            base_interval_ms: duration_ms(self.settings.base_interval),
            last_ping_timestamp: shared.last_ping,
            last_status: shared.last_status,
            consecutive_failures: shared.streak.count(),
            alerting: shared.streak.is_alerting(self.settings.max_consecutive_failures),
            stats: shared.stats.snapshot(),
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        lock(&self.shared).stats.snapshot()
    }
}

impl Drop for HeartbeatPinger {
    fn drop(&mut self) {
        if let Some(task) = lock(&self.shared).task.take() {
            task.handle.abort();
        }
    }
}

/// Outcome of folding one probe into the shared state.
struct Cycle {
    streak: u32,
    next_interval: Duration,
    alerting: bool,
}

struct Worker {
    generation: u64,
    settings: Arc<PingerSettings>,
    prober: Prober,
    shared: Arc<Mutex<PingerShared>>,
}

impl Worker {
    async fn run(self, mut stop: watch::Receiver<bool>) {
        loop {
            let cycle_start = Instant::now();

            let attempt = tokio::select! {
                biased;
                _ = stop.changed() => break,
                attempt = self.prober.probe(&self.settings.target) => attempt,
            };

            let Some(cycle) = self.fold(&attempt) else {
                break;
            };

            record_attempt(COMPONENT, &attempt);
            metrics::record_failure_streak(COMPONENT, cycle.streak);

            if cycle.alerting {
                tracing::warn!(
                    target: "keepalive::alert",
                    target_url = %self.settings.target,
                    consecutive_failures = cycle.streak,
                    threshold = self.settings.max_consecutive_failures,
                    next_interval_ms = duration_ms(cycle.next_interval),
                    "Heartbeat failure threshold reached"
                );
            }

            tracing::debug!(
                next_interval_ms = duration_ms(cycle.next_interval),
                "Next heartbeat scheduled"
            );

            tokio::select! {
                biased;
                _ = stop.changed() => break,
                _ = time::sleep_until(cycle_start + cycle.next_interval) => {}
            }
        }
    }

    /// Record the attempt unless this worker's generation has been stopped.
    fn fold(&self, attempt: &PingAttempt) -> Option<Cycle> {
        let mut shared = lock(&self.shared);
        if shared.generation != self.generation {
            return None;
        }

        shared.stats.record(attempt);
        let streak = shared.streak.observe(attempt.is_success());
        shared.last_ping = Some(attempt.timestamp);
        shared.last_status = attempt.status;

        let next = next_interval(self.settings.base_interval, streak, self.settings.backoff_cap);
        shared.next_interval = next;

        Some(Cycle {
            streak,
            next_interval: next,
            alerting: shared.streak.is_alerting(self.settings.max_consecutive_failures),
        })
    }
}

fn lock(shared: &Mutex<PingerShared>) -> MutexGuard<'_, PingerShared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn duration_ms(d: Duration) -> u64 {
    d.as_millis().min(u128::from(u64::MAX)) as u64
}
