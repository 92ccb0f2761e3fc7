//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;
use url::Url;

use crate::config::schema::{KeepAliveConfig, TargetList};
use crate::config::validation::{validate_config, ValidationError};

/// Overrides the target URL(s); a comma-separated list is accepted.
pub const ENV_TARGET_URL: &str = "KEEPALIVE_TARGET_URL";
/// Overrides the base interval in milliseconds.
pub const ENV_INTERVAL_MS: &str = "KEEPALIVE_INTERVAL_MS";
/// Overrides the server bind address.
pub const ENV_BIND_ADDRESS: &str = "KEEPALIVE_BIND_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {reason}")]
    Env { var: &'static str, reason: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Load, override from the process environment and validate.
///
/// With no path the built-in defaults are used as the base layer.
pub fn load_config(path: Option<&Path>) -> Result<KeepAliveConfig, ConfigError> {
    let config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => KeepAliveConfig::default(),
    };

    let config = apply_env_overrides(config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment overrides using `lookup` to read variables.
pub fn apply_env_overrides<F>(
    mut config: KeepAliveConfig,
    lookup: F,
) -> Result<KeepAliveConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(ENV_TARGET_URL) {
        let urls = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                Url::parse(s).map_err(|e| ConfigError::Env {
                    var: ENV_TARGET_URL,
                    reason: format!("'{s}': {e}"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        config.target = TargetList::from(urls);
    }

    if let Some(raw) = lookup(ENV_INTERVAL_MS) {
        config.base_interval_ms = raw.trim().parse().map_err(|e| ConfigError::Env {
            var: ENV_INTERVAL_MS,
            reason: format!("'{raw}': {e}"),
        })?;
    }

    if let Some(raw) = lookup(ENV_BIND_ADDRESS) {
        config.server.bind_address = raw;
    }

    Ok(config)
}
