//! A single bounded liveness probe.
//!
//! # Responsibilities
//! - Issue one HTTP GET through a [`Transport`]
//! - Enforce the hard per-probe deadline
//! - Classify the result into a [`PingAttempt`]
//!
//! # Design Decisions
//! - The deadline wraps the whole transport future (connect, headers, body);
//!   on expiry the future is dropped, so a late response cannot be observed
//! - Success is decided by HTTP status alone; the body is parsed best-effort
//! - No error escapes `Prober::probe`; every fault becomes an outcome

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::time::{self, Instant};
use url::Url;

use crate::health::HealthError;
use crate::observability::metrics;

/// Raw reply from a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

/// Transport-level failure (no HTTP status was obtained).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct TransportError {
    /// Short machine-readable code, e.g. `ConnectionRefused`.
    pub code: String,
    pub message: String,
}

impl TransportError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// The seam between the probe logic and the network.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<HttpReply, TransportError>;
}

/// Production transport backed by `reqwest`.
///
/// No client-level timeout is set; [`Prober`] owns the deadline.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, HealthError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("keepalive-watchdog/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(HealthError::Client)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<HttpReply, TransportError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| classify_reqwest_error(&e))?;

        Ok(HttpReply { status, body })
    }
}

/// Map a reqwest error to a code, preferring the underlying `io::ErrorKind`.
fn classify_reqwest_error(err: &reqwest::Error) -> TransportError {
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        if let Some(io) = inner.downcast_ref::<std::io::Error>() {
            return TransportError::new(format!("{:?}", io.kind()), err.to_string());
        }
        source = inner.source();
    }

    let code = if err.is_connect() {
        "ConnectFailed"
    } else if err.is_body() || err.is_decode() {
        "BodyError"
    } else {
        "RequestFailed"
    };
    TransportError::new(code, err.to_string())
}

/// Classified result of one probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ProbeOutcome {
    Success,
    /// A response arrived with a non-2xx status.
    HttpStatus { status: u16 },
    /// The deadline elapsed before a full response arrived.
    Timeout { after_ms: u64 },
    /// Refused, reset, DNS failure and similar.
    Connection { code: String, message: String },
}

impl ProbeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Success)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProbeOutcome::Success => "success",
            ProbeOutcome::HttpStatus { .. } => "http_status",
            ProbeOutcome::Timeout { .. } => "timeout",
            ProbeOutcome::Connection { .. } => "connection",
        }
    }

    /// Human-readable failure reason; `None` on success.
    pub fn error_message(&self) -> Option<String> {
        match self {
            ProbeOutcome::Success => None,
            ProbeOutcome::HttpStatus { status } => Some(format!("HTTP {status}")),
            ProbeOutcome::Timeout { after_ms } => Some(format!("timed out after {after_ms}ms")),
            ProbeOutcome::Connection { code, message } => Some(format!("{code}: {message}")),
        }
    }
}

/// Response body, JSON when it parses and raw text otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Json(serde_json::Value),
    Text(String),
}

impl ResponseBody {
    pub fn parse(raw: String) -> Option<Self> {
        if raw.trim().is_empty() {
            return None;
        }
        match serde_json::from_str(&raw) {
            Ok(value) => Some(ResponseBody::Json(value)),
            Err(_) => Some(ResponseBody::Text(raw)),
        }
    }
}

/// One probe, created, folded into stats and discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct PingAttempt {
    pub target: Url,
    pub timestamp: DateTime<Utc>,
    pub outcome: ProbeOutcome,
    pub status: Option<u16>,
    pub latency: Duration,
    pub body: Option<ResponseBody>,
}

impl PingAttempt {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    pub fn latency_ms(&self) -> u64 {
        self.latency.as_millis().min(u128::from(u64::MAX)) as u64
    }
}

/// Issues bounded probes through a shared transport.
#[derive(Clone)]
pub struct Prober {
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl Prober {
    pub fn new(transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Prober over the production `reqwest` transport.
    pub fn http(timeout: Duration) -> Result<Self, HealthError> {
        Ok(Self::new(Arc::new(ReqwestTransport::new()?), timeout))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn probe(&self, url: &Url) -> PingAttempt {
        let timestamp = Utc::now();
        let started = Instant::now();

        let result = time::timeout(self.timeout, self.transport.get(url)).await;
        let latency = started.elapsed();

        let (outcome, status, body) = match result {
            Ok(Ok(reply)) => {
                let outcome = if (200..300).contains(&reply.status) {
                    ProbeOutcome::Success
                } else {
                    ProbeOutcome::HttpStatus { status: reply.status }
                };
                (outcome, Some(reply.status), ResponseBody::parse(reply.body))
            }
            Ok(Err(e)) => (
                ProbeOutcome::Connection {
                    code: e.code,
                    message: e.message,
                },
                None,
                None,
            ),
            Err(_) => (
                ProbeOutcome::Timeout {
                    after_ms: self.timeout.as_millis().min(u128::from(u64::MAX)) as u64,
                },
                None,
                None,
            ),
        };

        PingAttempt {
            target: url.clone(),
            timestamp,
            outcome,
            status,
            latency,
            body,
        }
    }
}

/// Append `path` to the path of `base`, keeping any path prefix and query.
pub fn endpoint_url(base: &Url, path: &str) -> Result<Url, HealthError> {
    if base.cannot_be_a_base() {
        return Err(HealthError::InvalidEndpoint {
            base: base.to_string(),
            path: path.to_string(),
            source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
        });
    }

    let mut url = base.clone();
    url.set_path(&format!("{}{}", base.path().trim_end_matches('/'), path));
    url.set_fragment(None);
    Ok(url)
}

/// Emit the structured per-probe log line and metrics.
pub fn record_attempt(component: &'static str, attempt: &PingAttempt) {
    metrics::record_probe(component, attempt);

    let target = attempt.target.as_str();
    let latency_ms = attempt.latency_ms();
    let timestamp = attempt.timestamp.to_rfc3339();

    match &attempt.outcome {
        ProbeOutcome::Success => tracing::info!(
            component,
            %target,
            %timestamp,
            status = attempt.status,
            latency_ms,
            outcome = "success",
            "Probe succeeded"
        ),
        ProbeOutcome::HttpStatus { status } => tracing::warn!(
            component,
            %target,
            %timestamp,
            status,
            latency_ms,
            outcome = "http_status",
            "Probe failed: non-success status"
        ),
        ProbeOutcome::Timeout { after_ms } => tracing::warn!(
            component,
            %target,
            %timestamp,
            after_ms,
            outcome = "timeout",
            "Probe failed: timeout"
        ),
        ProbeOutcome::Connection { code, message } => tracing::warn!(
            component,
            %target,
            %timestamp,
            code = %code,
            error = %message,
            latency_ms,
            outcome = "connection",
            "Probe failed: connection error"
        ),
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{Scripted, ScriptedTransport};
    use super::*;

    fn url() -> Url {
        Url::parse("http://127.0.0.1:3000/health").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_records_latency_and_json_body() {
        let transport = ScriptedTransport::always(Scripted::ok(100));
        let prober = Prober::new(transport, Duration::from_secs(15));
        let attempt = prober.probe(&url()).await;

        assert!(attempt.is_success());
        assert_eq!(attempt.status, Some(200));
        assert!(attempt.latency >= Duration::from_millis(100));
        assert!(attempt.latency < Duration::from_millis(105));
        assert_eq!(
            attempt.body,
            Some(ResponseBody::Json(serde_json::json!({"status": "alive"})))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_2xx_is_failure_with_status() {
        let transport = ScriptedTransport::always(Scripted::status(503));
        let prober = Prober::new(transport, Duration::from_secs(15));
        let attempt = prober.probe(&url()).await;

        assert!(!attempt.is_success());
        assert_eq!(attempt.outcome, ProbeOutcome::HttpStatus { status: 503 });
        assert_eq!(attempt.status, Some(503));
    }

    #[tokio::test(start_paused = true)]
    async fn test_connection_error_keeps_code() {
        let transport = ScriptedTransport::always(Scripted::refused());
        let prober = Prober::new(transport, Duration::from_secs(15));
        let attempt = prober.probe(&url()).await;

        match attempt.outcome {
            ProbeOutcome::Connection { code, .. } => assert_eq!(code, "ConnectionRefused"),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_response_is_a_single_timeout() {
        let transport = ScriptedTransport::always(Scripted::ok(20_000));
        let prober = Prober::new(transport.clone(), Duration::from_secs(15));

        let attempt = prober.probe(&url()).await;
        assert_eq!(attempt.outcome, ProbeOutcome::Timeout { after_ms: 15_000 });
        assert!(attempt.latency >= Duration::from_secs(15));
        assert!(attempt.latency < Duration::from_secs(16));

        // The transport future was dropped at the deadline.
        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn test_body_falls_back_to_text() {
        let text = |s: &str| Some(ResponseBody::Text(s.to_string()));
        assert_eq!(ResponseBody::parse("pong".to_string()), text("pong"));
        assert_eq!(ResponseBody::parse("{not json".to_string()), text("{not json"));
        assert_eq!(ResponseBody::parse(String::new()), None);
    }

    #[test]
    fn test_endpoint_url_keeps_prefix() {
        let base = Url::parse("https://example.com/app/").unwrap();
        let url = endpoint_url(&base, "/health").unwrap();
        assert_eq!(url.as_str(), "https://example.com/app/health");

        let bare = Url::parse("https://example.com").unwrap();
        assert_eq!(endpoint_url(&bare, "/ping").unwrap().as_str(), "https://example.com/ping");
    }

    #[test]
    fn test_endpoint_url_keeps_query_after_path() {
        let base = Url::parse("https://example.com/app?token=abc#top").unwrap();
        let url = endpoint_url(&base, "/health").unwrap();

        assert_eq!(url.as_str(), "https://example.com/app/health?token=abc");
    }

    #[test]
    fn test_endpoint_url_rejects_opaque_base() {
        let base = Url::parse("mailto:ops@example.com").unwrap();
        assert!(matches!(
            endpoint_url(&base, "/health"),
            Err(HealthError::InvalidEndpoint { .. })
        ));
    }
}
