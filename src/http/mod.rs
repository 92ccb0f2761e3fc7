//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → handlers.rs
//!         /health, /ping, /status   → liveness answers for this process
//!         /api/keep-alive           → MultiEndpointProbe (GET inspect, POST trigger)
//!     → response.rs (success envelope, CORS)
//! ```

pub mod handlers;
pub mod response;
pub mod server;

pub use server::{build_router, AppState, HttpServer, KEEP_ALIVE_PATH};
