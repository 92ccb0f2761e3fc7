//! Request handlers.
//!
//! Liveness endpoints (`/health`, `/ping`, `/status`) and the keep-alive
//! entrypoint (`/api/keep-alive`).

use axum::{extract::State, response::Response, Json};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use crate::health::PingerStatus;
use crate::http::response;
use crate::http::server::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    pub rss_bytes: u64,
    pub virtual_bytes: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub service: String,
    pub version: &'static str,
    pub environment: String,
    pub uptime: u64,
    pub started_at: chrono::DateTime<Utc>,
    pub pid: u32,
    pub heartbeat: PingerStatus,
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let memory = state.memory_usage();
    Json(json!({
        "status": "alive",
        "uptime": state.uptime_secs(),
        "timestamp": Utc::now(),
        "memory": memory,
    }))
}

pub async fn ping() -> &'static str {
    "pong"
}

pub async fn status(State(state): State<AppState>) -> Json<ServiceStatus> {
    let services = &state.services;
    Json(ServiceStatus {
        service: services.config.server.service_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        environment: services.config.server.environment.clone(),
        uptime: state.uptime_secs(),
        started_at: services.started_at,
        pid: std::process::id(),
        heartbeat: services.pinger.status(),
    })
}

/// `GET /api/keep-alive`
pub async fn inspect(State(state): State<AppState>) -> Response {
    response::ok(state.services.probe.inspect())
}

/// `POST /api/keep-alive`
pub async fn trigger(State(state): State<AppState>) -> Response {
    response::ok(state.services.probe.trigger().await)
}

/// `OPTIONS /api/keep-alive`
pub async fn preflight() -> Response {
    response::preflight()
}

pub async fn method_not_allowed() -> Response {
    response::method_not_allowed()
}
