//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with liveness and keep-alive handlers
//! - Wire up middleware (tracing, timeout, request ID, CORS origin header)
//! - Bind server to listener and drain on shutdown

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    http::{header, HeaderValue},
    routing::get,
    Router,
};
use chrono::Utc;
use sysinfo::System;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::http::handlers::{self, MemoryUsage};
use crate::lifecycle::Services;

/// Path of the multi-endpoint probe entrypoint.
pub const KEEP_ALIVE_PATH: &str = "/api/keep-alive";

/// Grace added on top of the probe timeout for the request deadline.
const REQUEST_GRACE: Duration = Duration::from_secs(5);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    system: Arc<Mutex<System>>,
}

impl AppState {
    pub fn new(services: Services) -> Self {
        Self {
            services,
            system: Arc::new(Mutex::new(System::new())),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        (Utc::now() - self.services.started_at).num_seconds().max(0) as u64
    }

    /// Resident and virtual memory of this process; zeros if unavailable.
    pub fn memory_usage(&self) -> MemoryUsage {
        let unknown = MemoryUsage {
            rss_bytes: 0,
            virtual_bytes: 0,
        };
        let Ok(pid) = sysinfo::get_current_pid() else {
            return unknown;
        };

        let mut system = self.system.lock().unwrap_or_else(|p| p.into_inner());
        system.refresh_process(pid);
        system
            .process(pid)
            .map(|process| MemoryUsage {
                rss_bytes: process.memory(),
                virtual_bytes: process.virtual_memory(),
            })
            .unwrap_or(unknown)
    }
}

/// HTTP server for the hosted process.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(services: Services) -> Self {
        let request_timeout = services.config.request_timeout() + REQUEST_GRACE;
        let router = build_router(AppState::new(services), request_timeout);
        Self { router }
    }

    pub fn into_router(self) -> Router {
        self.router
    }

    /// Serve until the shutdown signal fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server received shutdown signal");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    let keep_alive = Router::new()
        .route(
            KEEP_ALIVE_PATH,
            get(handlers::inspect)
                .post(handlers::trigger)
                .options(handlers::preflight)
                .fallback(handlers::method_not_allowed),
        )
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/ping", get(handlers::ping))
        .route("/status", get(handlers::status))
        .merge(keep_alive)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::new(request_timeout)),
        )
}
