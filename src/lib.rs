//! Keep-alive and health-watchdog services.
//!
//! Three independent services prove that a hosted web process is alive:
//! - [`health::HeartbeatPinger`]: in-process self-ping with adaptive backoff
//! - [`health::ExternalWatchdog`]: fixed-cadence external poller with rolling stats
//! - [`health::MultiEndpointProbe`]: stateless multi-path prober, on demand or scheduled

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::KeepAliveConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
