//! External polling watchdog.
//!
//! # Responsibilities
//! - Poll a target's liveness endpoint at a fixed cadence
//! - Fold every result into rolling statistics
//! - Emit a periodic human-readable summary
//!
//! # Design Decisions
//! - No backoff: failures only accumulate in statistics
//! - Two decoupled timers (check loop, summary loop) on separate tasks
//! - Missed ticks are skipped, so a slow probe causes at most one makeup probe
//! - The check loop is the only writer of the stats

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use url::Url;

use crate::config::KeepAliveConfig;
use crate::health::probe::{endpoint_url, record_attempt, PingAttempt, Prober, ResponseBody};
use crate::health::stats::{RollingStats, StatsSnapshot};
use crate::health::HealthError;

const COMPONENT: &str = "watchdog";

/// Result of a single `check_health` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResult {
    pub success: bool,
    /// Milliseconds until the response (or the failure) arrived.
    pub response_time: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<PingAttempt> for HealthCheckResult {
    fn from(attempt: PingAttempt) -> Self {
        let success = attempt.is_success();
        Self {
            success,
            response_time: attempt.latency_ms(),
            timestamp: attempt.timestamp,
            status_code: attempt.status,
            error: attempt.outcome.error_message(),
            data: if success { attempt.body } else { None },
        }
    }
}

struct Shared {
    generation: u64,
    stats: RollingStats,
    summaries: u64,
}

struct Tasks {
    stop_tx: watch::Sender<bool>,
    checks: JoinHandle<()>,
    summaries: JoinHandle<()>,
}

/// Fixed-cadence liveness poller with rolling statistics.
pub struct ExternalWatchdog {
    target: Url,
    interval: Duration,
    stats_interval: Duration,
    prober: Prober,
    shared: Arc<Mutex<Shared>>,
    tasks: Mutex<Option<Tasks>>,
}

impl ExternalWatchdog {
    /// Watchdog for `{primary target}{health_path}`.
    pub fn new(config: &KeepAliveConfig, prober: Prober) -> Result<Self, HealthError> {
        let base = config.primary_target().ok_or(HealthError::NoTarget)?;
        Ok(Self {
            target: endpoint_url(base, &config.health_path)?,
            interval: config.base_interval(),
            stats_interval: config.stats_interval(),
            prober,
            shared: Arc::new(Mutex::new(Shared {
                generation: 0,
                stats: RollingStats::default(),
                summaries: 0,
            })),
            tasks: Mutex::new(None),
        })
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    /// One immediate check, then checks every interval. Idempotent.
    pub fn start(&self) {
        let mut tasks = self.tasks.lock().unwrap_or_else(|p| p.into_inner());
        if tasks.is_some() {
            tracing::warn!(target_url = %self.target, "Watchdog already running, start ignored");
            return;
        }

        let generation = {
            let mut shared = lock(&self.shared);
            shared.generation += 1;
            shared.generation
        };

        let (stop_tx, stop_rx) = watch::channel(false);

        let checks = tokio::spawn(check_loop(
            generation,
            self.target.clone(),
            self.interval,
            self.prober.clone(),
            self.shared.clone(),
            stop_rx.clone(),
        ));
        let summaries = tokio::spawn(summary_loop(
            self.target.clone(),
            self.stats_interval,
            self.shared.clone(),
            stop_rx,
        ));

        *tasks = Some(Tasks {
            stop_tx,
            checks,
            summaries,
        });

        tracing::info!(
            target_url = %self.target,
            interval_ms = self.interval.as_millis() as u64,
            timeout_ms = self.prober.timeout().as_millis() as u64,
            stats_interval_ms = self.stats_interval.as_millis() as u64,
            "Watchdog started"
        );
    }

    /// Stop both timers. Idempotent; an in-flight result is discarded.
    pub fn stop(&self) {
        let Some(tasks) = self.tasks.lock().unwrap_or_else(|p| p.into_inner()).take() else {
            return;
        };

        lock(&self.shared).generation += 1;
        let _ = tasks.stop_tx.send(true);
        tasks.checks.abort();
        tasks.summaries.abort();

        tracing::info!(target_url = %self.target, "Watchdog stopped");
    }

    pub fn is_running(&self) -> bool {
        self.tasks.lock().unwrap_or_else(|p| p.into_inner()).is_some()
    }

    /// One bounded check. Does not touch the statistics.
    pub async fn check_health(&self) -> HealthCheckResult {
        let attempt = self.prober.probe(&self.target).await;
        record_attempt(COMPONENT, &attempt);
        attempt.into()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        lock(&self.shared).stats.snapshot()
    }

    /// Periodic summaries emitted since construction.
    pub fn summaries_logged(&self) -> u64 {
        lock(&self.shared).summaries
    }

    /// Print the current statistics to stdout and return them.
    pub fn print_stats(&self) -> StatsSnapshot {
        let snapshot = self.snapshot();
        println!("{}\n  Target:        {}", snapshot, self.target);
        snapshot
    }
}

impl Drop for ExternalWatchdog {
    fn drop(&mut self) {
        if let Some(tasks) = self.tasks.lock().unwrap_or_else(|p| p.into_inner()).take() {
            tasks.checks.abort();
            tasks.summaries.abort();
        }
    }
}

async fn check_loop(
    generation: u64,
    target: Url,
    interval: Duration,
    prober: Prober,
    shared: Arc<Mutex<Shared>>,
    mut stop: watch::Receiver<bool>,
) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = stop.changed() => break,
            _ = ticker.tick() => {}
        }

        let attempt = tokio::select! {
            biased;
            _ = stop.changed() => break,
            attempt = prober.probe(&target) => attempt,
        };

        {
            let mut shared = lock(&shared);
            if shared.generation != generation {
                break;
            }
            shared.stats.record(&attempt);
        }

        record_attempt(COMPONENT, &attempt);
    }
}

async fn summary_loop(
    target: Url,
    every: Duration,
    shared: Arc<Mutex<Shared>>,
    mut stop: watch::Receiver<bool>,
) {
    let mut ticker = time::interval_at(Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = stop.changed() => break,
            _ = ticker.tick() => {
                let snapshot = {
                    let mut shared = lock(&shared);
                    shared.summaries += 1;
                    shared.stats.snapshot()
                };
                log_summary(&target, &snapshot);
            }
        }
    }
}

/// Structured fields for machines, the rendered summary for humans.
pub fn log_summary(target: &Url, snapshot: &StatsSnapshot) {
    tracing::info!(
        target: "keepalive::stats",
        target_url = %target,
        total = snapshot.total,
        successes = snapshot.successes,
        failures = snapshot.failures,
        success_rate = snapshot.success_rate,
        average_latency_ms = snapshot.average_latency_ms,
        "\n{snapshot}"
    );
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::probe::testing::{Scripted, ScriptedTransport};
    use std::sync::Arc;

    fn watchdog(
        transport: Arc<ScriptedTransport>,
        interval_ms: u64,
        timeout_ms: u64,
    ) -> ExternalWatchdog {
        with_stats_interval(transport, interval_ms, timeout_ms, 60_000)
    }

    fn with_stats_interval(
        transport: Arc<ScriptedTransport>,
        interval_ms: u64,
        timeout_ms: u64,
        stats_interval_ms: u64,
    ) -> ExternalWatchdog {
        let config = KeepAliveConfig {
            base_interval_ms: interval_ms,
            request_timeout_ms: timeout_ms,
            backoff_cap_ms: interval_ms,
            stats_interval_ms,
            ..Default::default()
        };
        let prober = Prober::new(transport, config.request_timeout());
        ExternalWatchdog::new(&config, prober).unwrap()
    }

    async fn advance_ms(ms: u64) {
        time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_do_not_change_cadence() {
        let transport = ScriptedTransport::always(Scripted::refused());
        let watchdog = watchdog(transport.clone(), 300_000, 10_000);
        watchdog.start();

        advance_ms(1).await;
        assert_eq!(transport.calls(), 1);

        advance_ms(300_000).await;
        assert_eq!(transport.calls(), 2);

        advance_ms(600_000).await;
        assert_eq!(transport.calls(), 4);

        let snapshot = watchdog.snapshot();
        assert_eq!(snapshot.total, 4);
        assert_eq!(snapshot.failures, 4);
        assert_eq!(snapshot.successes + snapshot.failures, snapshot.total);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_probe_causes_single_makeup() {
        let transport = ScriptedTransport::new(vec![Scripted::ok(45_000)], Scripted::ok(0));
        let watchdog = watchdog(transport.clone(), 10_000, 60_000);
        watchdog.start();

        advance_ms(46_000).await;
        assert_eq!(transport.calls(), 2);

        advance_ms(5_000).await;
        assert_eq!(transport.calls(), 3);
        assert_eq!(watchdog.snapshot().successes, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_idempotent_and_stop_halts() {
        let transport = ScriptedTransport::always(Scripted::ok(0));
        let watchdog = watchdog(transport.clone(), 10_000, 5_000);
        watchdog.start();
        watchdog.start();

        advance_ms(1).await;
        assert_eq!(transport.calls(), 1);

        watchdog.stop();
        watchdog.stop();
        assert!(!watchdog.is_running());

        advance_ms(100_000).await;
        assert_eq!(transport.calls(), 1);
        assert_eq!(watchdog.snapshot().total, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_drops_in_flight_result() {
        let transport = ScriptedTransport::always(Scripted::ok(3_000));
        let watchdog = watchdog(transport.clone(), 10_000, 5_000);
        watchdog.start();

        advance_ms(1_000).await;
        watchdog.stop();
        advance_ms(10_000).await;

        assert_eq!(watchdog.snapshot().total, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_health_shapes() {
        let ok = watchdog(ScriptedTransport::always(Scripted::ok(50)), 10_000, 5_000)
            .check_health()
            .await;
        assert!(ok.success);
        assert_eq!(ok.status_code, Some(200));
        assert!(ok.data.is_some());
        assert!(ok.error.is_none());

        let down = watchdog(ScriptedTransport::always(Scripted::status(502)), 10_000, 5_000)
            .check_health()
            .await;
        assert!(!down.success);
        assert_eq!(down.status_code, Some(502));
        assert_eq!(down.error.as_deref(), Some("HTTP 502"));

        let json = serde_json::to_value(&down).unwrap();
        assert_eq!(json["statusCode"], 502);
        assert!(json.get("data").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_health_does_not_touch_stats() {
        let watchdog = watchdog(ScriptedTransport::always(Scripted::ok(0)), 10_000, 5_000);
        watchdog.check_health().await;
        assert_eq!(watchdog.snapshot().total, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_summaries_follow_their_own_interval() {
        let transport = ScriptedTransport::always(Scripted::ok(0));
        let watchdog = with_stats_interval(transport.clone(), 300_000, 10_000, 600_000);
        watchdog.start();

        advance_ms(599_000).await;
        assert_eq!(watchdog.summaries_logged(), 0);
        assert_eq!(transport.calls(), 2);

        advance_ms(2_000).await;
        assert_eq!(watchdog.summaries_logged(), 1);

        advance_ms(600_000).await;
        assert_eq!(watchdog.summaries_logged(), 2);
        assert_eq!(transport.calls(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_summaries_independent_of_slow_checks() {
        let transport = ScriptedTransport::always(Scripted::ok(0));
        let watchdog = with_stats_interval(transport.clone(), 600_000, 10_000, 60_000);
        watchdog.start();

        advance_ms(181_000).await;

        assert_eq!(transport.calls(), 1);
        assert_eq!(watchdog.summaries_logged(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_summaries() {
        let transport = ScriptedTransport::always(Scripted::ok(0));
        let watchdog = with_stats_interval(transport, 10_000, 5_000, 60_000);
        watchdog.start();

        advance_ms(61_000).await;
        assert_eq!(watchdog.summaries_logged(), 1);

        watchdog.stop();
        advance_ms(300_000).await;
        assert_eq!(watchdog.summaries_logged(), 1);
    }
}
