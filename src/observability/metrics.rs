//! Metrics collection and exposition.
//!
//! # Metrics
//! - `keepalive_probes_total` (counter): probes by component and outcome
//! - `keepalive_probe_duration_seconds` (histogram): probe latency by component
//! - `keepalive_failure_streak` (gauge): current heartbeat failure streak
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::health::probe::PingAttempt;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_probe(component: &'static str, attempt: &PingAttempt) {
    counter!(
        "keepalive_probes_total",
        "component" => component,
        "outcome" => attempt.outcome.label()
    )
    .increment(1);

    histogram!("keepalive_probe_duration_seconds", "component" => component)
        .record(attempt.latency.as_secs_f64());
}

pub fn record_failure_streak(component: &'static str, streak: u32) {
    gauge!("keepalive_failure_streak", "component" => component).set(f64::from(streak));
}
