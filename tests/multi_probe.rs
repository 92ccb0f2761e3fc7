//! Multi-endpoint probe against a real HTTP target.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::{MockServer, ResponseTemplate};

use keepalive_watchdog::health::{MultiEndpointProbe, Prober};

mod common;

fn probe(target: &str) -> MultiEndpointProbe {
    let config = common::config_for(target);
    let prober = Prober::http(Duration::from_secs(2)).unwrap();
    MultiEndpointProbe::new(Arc::new(config), prober).unwrap()
}

#[tokio::test]
async fn test_trigger_reports_each_path() {
    let server = MockServer::start().await;
    let health = ResponseTemplate::new(200).set_body_json(json!({ "ok": true }));
    common::mount(&server, "/health", health).await;
    common::mount(&server, "/ping", ResponseTemplate::new(200).set_body_string("pong")).await;
    common::mount(&server, "/status", ResponseTemplate::new(500)).await;

    let report = probe(&server.uri()).trigger().await;

    assert_eq!(report.summary.total, 3);
    assert_eq!(report.summary.succeeded, 2);
    assert_eq!(report.summary.failed, 1);

    let endpoints: Vec<_> = report.results.iter().map(|r| r.endpoint.as_str()).collect();
    assert_eq!(endpoints, ["/health", "/ping", "/status"]);

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["results"][0]["data"], json!({ "ok": true }));
    assert_eq!(value["results"][1]["data"], "pong");
    assert_eq!(value["results"][2]["statusCode"], 500);
    assert_eq!(value["results"][2]["outcome"], "http_status");
}

#[tokio::test]
async fn test_trigger_against_unreachable_target() {
    let addr = common::unused_addr().await;

    let report = probe(&format!("http://{addr}")).trigger().await;

    assert_eq!(report.summary.failed, 3);
    assert!(report.results.iter().all(|r| r.outcome == "connection" && r.status_code.is_none()));
}

#[tokio::test]
async fn test_each_trigger_gets_a_fresh_invocation() {
    let server = common::start_healthy_target().await;
    let probe = probe(&server.uri());

    let first = probe.trigger().await;
    let second = probe.trigger().await;

    assert_ne!(first.invocation_id, second.invocation_id);
    assert_eq!(second.summary.succeeded, 3);
    assert_eq!(server.received_requests().await.unwrap().len(), 6);
}
