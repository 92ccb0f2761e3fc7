//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use serde_json::json;
use tokio::net::TcpListener;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use keepalive_watchdog::config::{KeepAliveConfig, TargetList};

/// Start a mock target answering the three default liveness paths.
pub async fn start_healthy_target() -> MockServer {
    let server = MockServer::start().await;
    let health = ResponseTemplate::new(200).set_body_json(json!({ "status": "alive" }));
    mount(&server, "/health", health).await;
    mount(&server, "/ping", ResponseTemplate::new(200).set_body_string("pong")).await;
    let status = ResponseTemplate::new(200).set_body_json(json!({ "service": "mock" }));
    mount(&server, "/status", status).await;
    server
}

/// Answer `GET {route}` with `response`.
pub async fn mount(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

/// An address nothing is listening on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub fn url(raw: &str) -> Url {
    Url::parse(raw).unwrap()
}

/// Config aimed at `target` with short timings.
pub fn config_for(target: &str) -> KeepAliveConfig {
    KeepAliveConfig {
        target: TargetList::One(url(target)),
        base_interval_ms: 100,
        request_timeout_ms: 1_000,
        backoff_cap_ms: 400,
        stats_interval_ms: 60_000,
        ..Default::default()
    }
}

/// Poll `check` until it holds or `limit` elapses.
pub async fn wait_until<F>(limit: Duration, mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
