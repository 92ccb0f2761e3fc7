//! Startup orchestration.
//!
//! # Responsibilities
//! - Build every service from the validated configuration
//! - Hand them to the binary as one owned bundle
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - One prober (and HTTP client) is shared by the services of one process

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::KeepAliveConfig;
use crate::health::{HealthError, HeartbeatPinger, MultiEndpointProbe, Prober};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("health service error: {0}")]
    Health(#[from] HealthError),

    #[error("invalid {what} address '{address}': {source}")]
    Address {
        what: &'static str,
        address: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

/// Services hosted by the `keepalive` process.
#[derive(Clone)]
pub struct Services {
    pub config: Arc<KeepAliveConfig>,
    pub pinger: Arc<HeartbeatPinger>,
    pub probe: Arc<MultiEndpointProbe>,
    pub started_at: DateTime<Utc>,
}

/// Build services over the production HTTP transport.
pub fn build_services(config: KeepAliveConfig) -> Result<Services, StartupError> {
    let prober = Prober::http(config.request_timeout())?;
    Ok(build_services_with(Arc::new(config), prober)?)
}

/// Build services over an explicit prober.
pub fn build_services_with(
    config: Arc<KeepAliveConfig>,
    prober: Prober,
) -> Result<Services, HealthError> {
    let pinger = HeartbeatPinger::new(&config, prober.clone())?;
    let probe = MultiEndpointProbe::new(config.clone(), prober)?;

    Ok(Services {
        config,
        pinger: Arc::new(pinger),
        probe: Arc::new(probe),
        started_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetList;

    #[tokio::test]
    async fn test_missing_target_is_a_health_error() {
        let config = KeepAliveConfig {
            target: TargetList::Many(Vec::new()),
            ..Default::default()
        };

        let err = build_services(config).err().unwrap();
        assert!(matches!(err, StartupError::Health(HealthError::NoTarget)));
    }

    #[tokio::test]
    async fn test_services_share_one_config() {
        let services = build_services(KeepAliveConfig::default()).unwrap();

        assert!(!services.pinger.is_running());
        assert_eq!(
            services.probe.inspect().derived.endpoints,
            vec![
                "http://127.0.0.1:3000/health",
                "http://127.0.0.1:3000/ping",
                "http://127.0.0.1:3000/status",
            ]
        );
    }
}
