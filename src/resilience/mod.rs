//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Heartbeat probe completes:
//!     → failure streak updated (health::state)
//!     → backoff.rs (next delay from the current streak)
//!     → scheduler sleeps until cycle start + delay
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every probe has a hard deadline (health::probe)
//! - Adaptive backoff is the only retry mechanism
//! - Backoff is deterministic so the schedule is observable and testable

pub mod backoff;

pub use backoff::next_interval;
