//! Stateless multi-endpoint prober.
//!
//! # Responsibilities
//! - `inspect`: report the active configuration and derived endpoint URLs
//! - `trigger`: probe every configured path once and report per-endpoint results
//! - Optionally trigger on a fixed schedule
//!
//! # Design Decisions
//! - Nothing is retained between invocations
//! - Endpoints are probed concurrently, each on its own task with its own deadline
//! - A failing or panicking endpoint only affects its own result entry

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};
use url::Url;
use uuid::Uuid;

use crate::config::KeepAliveConfig;
use crate::health::probe::{endpoint_url, record_attempt, PingAttempt, Prober, ResponseBody};
use crate::health::HealthError;

const COMPONENT: &str = "multi_probe";

/// Outcome for one configured path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointResult {
    pub endpoint: String,
    pub url: String,
    pub success: bool,
    pub outcome: &'static str,
    pub status_code: Option<u16>,
    pub response_time_ms: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EndpointResult {
    fn from_attempt(endpoint: &str, attempt: PingAttempt) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            url: attempt.target.to_string(),
            success: attempt.is_success(),
            outcome: attempt.outcome.label(),
            status_code: attempt.status,
            response_time_ms: attempt.latency_ms(),
            timestamp: attempt.timestamp,
            error: attempt.outcome.error_message(),
            data: attempt.body,
        }
    }

    fn aborted(endpoint: &str, url: &Url, reason: String) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            url: url.to_string(),
            success: false,
            outcome: "aborted",
            status_code: None,
            response_time_ms: 0,
            timestamp: Utc::now(),
            data: None,
            error: Some(reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Result of one `trigger` invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerReport {
    pub invocation_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub target: String,
    pub results: Vec<EndpointResult>,
    pub summary: TriggerSummary,
}

/// The configuration as reported by `inspect`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectedConfig {
    pub targets: Vec<String>,
    pub base_interval_ms: u64,
    pub request_timeout_ms: u64,
    pub max_consecutive_failures: u32,
    pub backoff_cap_ms: u64,
    pub probe_paths: Vec<String>,
    pub probe_schedule_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedInfo {
    pub interval_minutes: f64,
    pub timeout_seconds: f64,
    pub backoff_cap_minutes: f64,
    pub schedule_minutes: Option<f64>,
    pub endpoints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeInspection {
    pub config: InspectedConfig,
    pub derived: DerivedInfo,
}

/// Probes every configured path against the primary target.
pub struct MultiEndpointProbe {
    config: Arc<KeepAliveConfig>,
    target: Url,
    endpoints: Vec<(String, Url)>,
    prober: Prober,
}

impl MultiEndpointProbe {
    pub fn new(config: Arc<KeepAliveConfig>, prober: Prober) -> Result<Self, HealthError> {
        let target = config.primary_target().ok_or(HealthError::NoTarget)?.clone();
        let endpoints = config
            .probe_paths
            .iter()
            .map(|path| -> Result<(String, Url), HealthError> {
                Ok((path.clone(), endpoint_url(&target, path)?))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            config,
            target,
            endpoints,
            prober,
        })
    }

    /// Read-only view of the configuration. Performs no network calls.
    pub fn inspect(&self) -> ProbeInspection {
        let config = &self.config;
        ProbeInspection {
            config: InspectedConfig {
                targets: config.target.urls().iter().map(ToString::to_string).collect(),
                base_interval_ms: config.base_interval_ms,
                request_timeout_ms: config.request_timeout_ms,
                max_consecutive_failures: config.max_consecutive_failures,
                backoff_cap_ms: config.backoff_cap_ms,
                probe_paths: config.probe_paths.clone(),
                probe_schedule_ms: config.probe_schedule_ms,
            },
            derived: DerivedInfo {
                interval_minutes: config.base_interval_ms as f64 / 60_000.0,
                timeout_seconds: config.request_timeout_ms as f64 / 1_000.0,
                backoff_cap_minutes: config.backoff_cap_ms as f64 / 60_000.0,
                schedule_minutes: config.probe_schedule_ms.map(|ms| ms as f64 / 60_000.0),
                endpoints: self.endpoints.iter().map(|(_, url)| url.to_string()).collect(),
            },
        }
    }

    /// Probe every endpoint once, concurrently.
    ///
    /// Results are returned in configuration order; each carries its own
    /// timestamp.
    pub async fn trigger(&self) -> TriggerReport {
        let invocation_id = Uuid::new_v4();
        let timestamp = Utc::now();

        let handles: Vec<_> = self
            .endpoints
            .iter()
            .map(|(_, url)| {
                let prober = self.prober.clone();
                let url = url.clone();
                tokio::spawn(async move { prober.probe(&url).await })
            })
            .collect();

        let results: Vec<EndpointResult> = join_all(handles)
            .await
            .into_iter()
            .zip(&self.endpoints)
            .map(|(joined, (path, url))| match joined {
                Ok(attempt) => {
                    record_attempt(COMPONENT, &attempt);
                    EndpointResult::from_attempt(path, attempt)
                }
                Err(e) => {
                    tracing::error!(
                        invocation_id = %invocation_id,
                        endpoint = %path,
                        error = %e,
                        "Probe task aborted"
                    );
                    EndpointResult::aborted(path, url, format!("probe task failed: {e}"))
                }
            })
            .collect();

        let succeeded = results.iter().filter(|r| r.success).count();
        let summary = TriggerSummary {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
        };

        tracing::info!(
            invocation_id = %invocation_id,
            target_url = %self.target,
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Multi-endpoint probe complete"
        );

        TriggerReport {
            invocation_id,
            timestamp,
            target: self.target.to_string(),
            results,
            summary,
        }
    }

    /// Trigger every `every` until shutdown.
    pub async fn run_scheduled(&self, every: Duration, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            target_url = %self.target,
            every_ms = every.as_millis() as u64,
            endpoints = self.endpoints.len(),
            "Scheduled multi-endpoint probe starting"
        );

        let mut ticker = time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.trigger().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Scheduled multi-endpoint probe received shutdown signal");
                    break;
                }
            }
        }
    }
}
