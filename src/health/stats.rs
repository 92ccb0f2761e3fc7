//! Rolling liveness statistics.
//!
//! # Design Decisions
//! - Counters only; no sample history is retained
//! - Average latency covers successful probes only and uses an incremental mean
//! - Single writer; shared readers go through a mutex owned by the caller

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::health::probe::PingAttempt;

#[derive(Debug, Clone, PartialEq)]
pub struct RollingStats {
    total: u64,
    successes: u64,
    failures: u64,
    average_latency_ms: f64,
    last_attempt: Option<DateTime<Utc>>,
    started_at: DateTime<Utc>,
}

impl Default for RollingStats {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl RollingStats {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            total: 0,
            successes: 0,
            failures: 0,
            average_latency_ms: 0.0,
            last_attempt: None,
            started_at,
        }
    }

    pub fn record(&mut self, attempt: &PingAttempt) {
        self.record_outcome(attempt.is_success(), attempt.latency, attempt.timestamp);
    }

    pub fn record_outcome(&mut self, success: bool, latency: Duration, at: DateTime<Utc>) {
        self.total += 1;
        self.last_attempt = Some(at);

        if success {
            self.successes += 1;
            let sample = latency.as_secs_f64() * 1_000.0;
            self.average_latency_ms += (sample - self.average_latency_ms) / self.successes as f64;
        } else {
            self.failures += 1;
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn successes(&self) -> u64 {
        self.successes
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// `None` until the first successful probe.
    pub fn average_latency_ms(&self) -> Option<f64> {
        (self.successes > 0).then_some(self.average_latency_ms)
    }

    pub fn last_attempt(&self) -> Option<DateTime<Utc>> {
        self.last_attempt
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Percentage of successful probes; `None` before the first probe.
    pub fn success_rate(&self) -> Option<f64> {
        (self.total > 0).then(|| self.successes as f64 * 100.0 / self.total as f64)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        self.snapshot_at(Utc::now())
    }

    pub fn snapshot_at(&self, now: DateTime<Utc>) -> StatsSnapshot {
        StatsSnapshot {
            uptime_secs: (now - self.started_at).num_seconds().max(0) as u64,
            started_at: self.started_at,
            total: self.total,
            successes: self.successes,
            failures: self.failures,
            success_rate: self.success_rate(),
            average_latency_ms: self.average_latency_ms(),
            last_ping: self.last_attempt,
        }
    }
}

/// Point-in-time copy of [`RollingStats`] with derived figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub uptime_secs: u64,
    pub started_at: DateTime<Utc>,
    pub total: u64,
    pub successes: u64,
    pub failures: u64,
    pub success_rate: Option<f64>,
    pub average_latency_ms: Option<f64>,
    pub last_ping: Option<DateTime<Utc>>,
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Keep-alive statistics")?;
        writeln!(f, "  Uptime:        {}", format_uptime(self.uptime_secs))?;
        writeln!(f, "  Total pings:   {}", self.total)?;
        writeln!(f, "  Successful:    {}", self.successes)?;
        writeln!(f, "  Failed:        {}", self.failures)?;
        match self.success_rate {
            Some(rate) => writeln!(f, "  Success rate:  {rate:.1}%")?,
            None => writeln!(f, "  Success rate:  n/a")?,
        }
        match self.average_latency_ms {
            Some(avg) => writeln!(f, "  Avg latency:   {avg:.0}ms")?,
            None => writeln!(f, "  Avg latency:   n/a")?,
        }
        match self.last_ping {
            Some(at) => write!(f, "  Last ping:     {}", at.to_rfc3339()),
            None => write!(f, "  Last ping:     never"),
        }
    }
}

/// `3725` → `1h 2m 5s`.
pub fn format_uptime(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}h {m}m {s}s")
    } else if m > 0 {
        format!("{m}m {s}s")
    } else {
        format!("{s}s")
    }
}
