//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, cap >= base)
//! - Validate target schemes and probe paths
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: KeepAliveConfig → Result<(), Vec<ValidationError>>
//! - Nothing is defaulted here; a bad value is always an error

use thiserror::Error;

use crate::config::schema::KeepAliveConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("at least one target URL is required")]
    NoTargets,

    #[error("target '{0}' must use http or https")]
    UnsupportedScheme(String),

    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("backoff_cap_ms ({cap}) must be >= base_interval_ms ({base})")]
    CapBelowBase { cap: u64, base: u64 },

    #[error("probe_paths must not be empty")]
    NoProbePaths,

    #[error("path '{0}' must start with '/'")]
    RelativePath(String),
}

pub fn validate_config(config: &KeepAliveConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let targets = config.target.urls();
    if targets.is_empty() {
        errors.push(ValidationError::NoTargets);
    }
    for url in targets {
        if !matches!(url.scheme(), "http" | "https") {
            errors.push(ValidationError::UnsupportedScheme(url.to_string()));
        }
    }

    let positive = [
        ("base_interval_ms", config.base_interval_ms),
        ("request_timeout_ms", config.request_timeout_ms),
        ("backoff_cap_ms", config.backoff_cap_ms),
        ("stats_interval_ms", config.stats_interval_ms),
        ("max_consecutive_failures", u64::from(config.max_consecutive_failures)),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::NotPositive { field });
        }
    }
    if config.probe_schedule_ms == Some(0) {
        errors.push(ValidationError::NotPositive { field: "probe_schedule_ms" });
    }

    if config.backoff_cap_ms < config.base_interval_ms {
        errors.push(ValidationError::CapBelowBase {
            cap: config.backoff_cap_ms,
            base: config.base_interval_ms,
        });
    }

    if config.probe_paths.is_empty() {
        errors.push(ValidationError::NoProbePaths);
    }
    for path in config.probe_paths.iter().chain(std::iter::once(&config.health_path)) {
        if !path.starts_with('/') {
            errors.push(ValidationError::RelativePath(path.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
