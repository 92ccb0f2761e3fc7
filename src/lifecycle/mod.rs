//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build services → Start schedulers → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop schedulers → Drain server → Print final stats → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Schedulers are stopped before the final snapshot, so it is final

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::{wait_for_signal, Signal};
pub use startup::{build_services, build_services_with, Services, StartupError};
