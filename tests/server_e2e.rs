//! The hosted process pinging itself over a real socket.

use std::time::Duration;

use tokio::net::TcpListener;

use keepalive_watchdog::http::{HttpServer, KEEP_ALIVE_PATH};
use keepalive_watchdog::lifecycle::{build_services, Shutdown};

mod common;

#[tokio::test]
async fn test_self_ping_keeps_process_alive() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let config = common::config_for(&format!("http://{addr}"));

    let services = build_services(config).unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(services.clone());
    let server = tokio::spawn(server.run(listener, shutdown.subscribe()));

    services.pinger.start();
    let pinged =
        common::wait_until(Duration::from_secs(5), || services.pinger.snapshot().successes >= 2)
            .await;
    services.pinger.stop();

    assert!(pinged);
    let status = services.pinger.status();
    assert!(!status.running);
    assert_eq!(status.consecutive_failures, 0);
    assert_eq!(status.last_status, Some(200));

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{addr}{KEEP_ALIVE_PATH}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["summary"]["succeeded"], 3);

    let response = client.get(format!("http://{addr}/status")).send().await.unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["service"], "keepalive");
    assert!(body["heartbeat"]["stats"]["total"].as_u64().unwrap() >= 2);

    shutdown.trigger();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_unreachable_target_raises_streak() {
    let addr = common::unused_addr().await;
    let mut config = common::config_for(&format!("http://{addr}"));
    config.max_consecutive_failures = 2;

    let services = build_services(config).unwrap();
    services.pinger.start();
    let alerting =
        common::wait_until(Duration::from_secs(5), || services.pinger.status().alerting).await;
    services.pinger.stop();

    assert!(alerting);
    let status = services.pinger.status();
    assert!(status.consecutive_failures >= 2);
    assert!(status.interval_ms > status.base_interval_ms);
    assert!(status.interval_ms <= 400);
}
