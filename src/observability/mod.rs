//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Probes and schedulers produce:
//!     → logging.rs (one structured event per probe, alerts, summaries)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, init_logging_stderr};
