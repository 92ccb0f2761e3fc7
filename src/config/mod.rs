//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overrides)
//!     → validation.rs (semantic checks)
//!     → KeepAliveConfig (validated, immutable)
//!     → shared via Arc to all services
//! ```
//!
//! # Design Decisions
//! - Config is immutable for the process lifetime; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Invalid values are fatal at startup, never replaced by a default

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{KeepAliveConfig, LogFormat, ObservabilityConfig, ServerConfig, TargetList};
pub use validation::ValidationError;
