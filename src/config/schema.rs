//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! keep-alive services. All types derive Serde traits for deserialization
//! from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

/// Root configuration shared by the pinger, the watchdog and the prober.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KeepAliveConfig {
    /// Target base URL(s). The first entry is the primary target.
    pub target: TargetList,

    /// Base interval between heartbeat / watchdog probes in milliseconds.
    pub base_interval_ms: u64,

    /// Hard deadline for a single probe in milliseconds.
    pub request_timeout_ms: u64,

    /// Consecutive failures before a warning-level alert is emitted.
    pub max_consecutive_failures: u32,

    /// Upper bound for the heartbeat backoff in milliseconds.
    pub backoff_cap_ms: u64,

    /// Paths checked by the multi-endpoint prober.
    pub probe_paths: Vec<String>,

    /// Path checked by the heartbeat pinger and the external watchdog.
    pub health_path: String,

    /// Cadence of the watchdog's stats summary in milliseconds.
    pub stats_interval_ms: u64,

    /// Optional cadence for scheduled multi-endpoint probe runs.
    pub probe_schedule_ms: Option<u64>,

    /// HTTP server settings for the hosted process.
    pub server: ServerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            target: TargetList::default(),
            base_interval_ms: 240_000,
            request_timeout_ms: 15_000,
            max_consecutive_failures: 3,
            backoff_cap_ms: 600_000,
            probe_paths: vec!["/health".to_string(), "/ping".to_string(), "/status".to_string()],
            health_path: "/health".to_string(),
            stats_interval_ms: 600_000,
            probe_schedule_ms: None,
            server: ServerConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl KeepAliveConfig {
    /// The primary target. Validation guarantees there is at least one.
    pub fn primary_target(&self) -> Option<&Url> {
        self.target.urls().first()
    }

    pub fn base_interval(&self) -> Duration {
        Duration::from_millis(self.base_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn backoff_cap(&self) -> Duration {
        Duration::from_millis(self.backoff_cap_ms)
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats_interval_ms)
    }

    pub fn probe_schedule(&self) -> Option<Duration> {
        self.probe_schedule_ms.map(Duration::from_millis)
    }
}

/// One URL or a list of URLs.
///
/// Accepts both `target = "http://host"` and `target = ["http://a", "http://b"]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TargetList {
    One(Url),
    Many(Vec<Url>),
}

impl TargetList {
    pub fn urls(&self) -> &[Url] {
        match self {
            TargetList::One(url) => std::slice::from_ref(url),
            TargetList::Many(urls) => urls,
        }
    }
}

impl Default for TargetList {
    fn default() -> Self {
        TargetList::Many(vec![Url::parse("http://127.0.0.1:3000/").expect("static URL is valid")])
    }
}

impl From<Vec<Url>> for TargetList {
    fn from(mut urls: Vec<Url>) -> Self {
        if urls.len() == 1 {
            TargetList::One(urls.remove(0))
        } else {
            TargetList::Many(urls)
        }
    }
}

/// HTTP server configuration for the hosted process.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Deployment environment reported by `/status`.
    pub environment: String,

    /// Service name reported by `/status`.
    pub service_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            environment: "production".to_string(),
            service_name: "keepalive".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
