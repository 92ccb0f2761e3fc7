//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Heartbeat (heartbeat.rs):
//!     Adaptive timer
//!     → probe.rs (bounded GET)
//!     → state.rs (failure streak) → resilience::backoff (next delay)
//!     → stats.rs
//!
//! Watchdog (watchdog.rs):
//!     Fixed timer → probe.rs → stats.rs
//!     Summary timer → stats.rs snapshot → log
//!
//! Multi-endpoint probe (multi.rs):
//!     HTTP call or schedule
//!     → probe.rs per path, concurrently
//!     → per-endpoint results (nothing retained)
//! ```
//!
//! # Design Decisions
//! - The three services are independent; they share only the probe primitive
//!   and the stats model
//! - Each service is an explicit struct built from configuration, no globals
//! - No per-probe error ever escapes a scheduling loop

pub mod heartbeat;
pub mod multi;
pub mod probe;
pub mod state;
pub mod stats;
pub mod watchdog;

use thiserror::Error;

pub use heartbeat::{HeartbeatPinger, PingerStatus};
pub use multi::{EndpointResult, MultiEndpointProbe, ProbeInspection, TriggerReport};
pub use probe::{PingAttempt, ProbeOutcome, Prober, ReqwestTransport, Transport};
pub use state::FailureStreak;
pub use stats::{RollingStats, StatsSnapshot};
pub use watchdog::{ExternalWatchdog, HealthCheckResult};

/// Errors raised while constructing a health service.
#[derive(Debug, Error)]
pub enum HealthError {
    #[error("no target URL configured")]
    NoTarget,

    #[error("invalid endpoint '{path}' for base '{base}': {source}")]
    InvalidEndpoint {
        base: String,
        path: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}
