//! Keep-alive host process.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────────────── keepalive ────────────────────────────────┐
//!   │                                                                           │
//!   │  ┌──────────────┐  GET {target}/health   ┌─────────────────────────────┐  │
//!   │  │  Heartbeat   │───────────────────────▶│  /health  /ping  /status    │  │
//!   │  │   pinger     │◀───────────────────────│  (axum, this process)       │  │
//!   │  └──────────────┘  backoff on failure    │                             │  │
//!   │                                          │  /api/keep-alive            │  │
//!   │  ┌──────────────┐                        │   GET  → inspect            │  │
//!   │  │  Scheduled   │── trigger ────────────▶│   POST → trigger            │  │
//!   │  │  multi-probe │   (optional)           │   OPTIONS → CORS preflight  │  │
//!   │  └──────────────┘                        └─────────────────────────────┘  │
//!   │                                                                           │
//!   │  SIGINT/SIGTERM → stop pinger → drain server → print final stats         │
//!   └───────────────────────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use keepalive_watchdog::config::load_config;
use keepalive_watchdog::http::HttpServer;
use keepalive_watchdog::lifecycle::{build_services, wait_for_signal, Shutdown, StartupError};
use keepalive_watchdog::observability::{self, metrics};

#[derive(Parser)]
#[command(name = "keepalive")]
#[command(about = "Hosts liveness endpoints and pings itself to stay awake", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "KEEPALIVE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("keepalive: {e}");
            std::process::exit(2);
        }
    };

    observability::init_logging(&config.observability)?;

    tracing::info!("keepalive v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        targets = ?config.target.urls().iter().map(|u| u.as_str()).collect::<Vec<_>>(),
        bind_address = %config.server.bind_address,
        base_interval_ms = config.base_interval_ms,
        request_timeout_ms = config.request_timeout_ms,
        max_consecutive_failures = config.max_consecutive_failures,
        backoff_cap_ms = config.backoff_cap_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|source| StartupError::Address {
                what: "metrics",
                address: config.observability.metrics_address.clone(),
                source,
            })?;
        metrics::init_metrics(addr)?;
    }

    let services = build_services(config)?;
    let shutdown = Shutdown::new();

    let listener = TcpListener::bind(&services.config.server.bind_address).await?;
    let server = HttpServer::new(services.clone());
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    services.pinger.start();

    let scheduled = services.config.probe_schedule().map(|every| {
        let probe = services.probe.clone();
        let rx = shutdown.subscribe();
        tokio::spawn(async move { probe.run_scheduled(every, rx).await })
    });

    let signal = wait_for_signal().await?;
    tracing::info!(%signal, "Shutdown signal received");

    services.pinger.stop();
    shutdown.trigger();

    server_task.await??;
    if let Some(task) = scheduled {
        if let Err(e) = task.await {
            tracing::error!(error = %e, "Scheduled probe task ended abnormally");
        }
    }

    println!("{}", services.pinger.snapshot());
    tracing::info!("Shutdown complete");
    Ok(())
}
