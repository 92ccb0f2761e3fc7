use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use url::Url;

use keepalive_watchdog::config::validation::validate_config;
use keepalive_watchdog::config::{
    load_config, ConfigError, KeepAliveConfig, TargetList, ValidationError,
};
use keepalive_watchdog::health::{ExternalWatchdog, MultiEndpointProbe, Prober};
use keepalive_watchdog::lifecycle::wait_for_signal;
use keepalive_watchdog::observability;

#[derive(Parser)]
#[command(name = "watchdog")]
#[command(about = "External liveness watchdog for a keep-alive target", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "KEEPALIVE_CONFIG")]
    config: Option<PathBuf>,

    /// Target base URL (overrides config and KEEPALIVE_TARGET_URL).
    #[arg(short, long)]
    url: Option<Url>,

    /// Polling interval in milliseconds.
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Per-probe timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Stats summary interval in milliseconds.
    #[arg(long)]
    stats_interval_ms: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Default)]
enum Commands {
    /// Poll the target until interrupted (default)
    #[default]
    Watch,
    /// Run a single health check and print the result
    Check,
    /// Probe every configured path once and print the results
    Probe,
    /// Print the active configuration and derived endpoints
    Inspect,
}

impl Cli {
    fn resolve_config(&self) -> Result<KeepAliveConfig, ConfigError> {
        let mut config = load_config(self.config.as_deref())?;

        if let Some(url) = &self.url {
            config.target = TargetList::One(url.clone());
        }
        if let Some(ms) = self.interval_ms {
            config.base_interval_ms = ms;
        }
        if let Some(ms) = self.timeout_ms {
            config.request_timeout_ms = ms;
        }
        if let Some(ms) = self.stats_interval_ms {
            config.stats_interval_ms = ms;
        }

        if let Err(errors) = validate_config(&config) {
            // The watchdog polls at a fixed cadence; the backoff cap does not apply.
            let errors: Vec<_> = errors
                .into_iter()
                .filter(|e| !matches!(e, ValidationError::CapBelowBase { .. }))
                .collect();
            if !errors.is_empty() {
                return Err(ConfigError::Validation(errors));
            }
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("watchdog: {e}");
            std::process::exit(2);
        }
    };

    let prober = Prober::http(config.request_timeout())?;

    match cli.command.unwrap_or_default() {
        Commands::Watch => {
            observability::init_logging(&config.observability)?;
            let watchdog = ExternalWatchdog::new(&config, prober)?;
            watchdog.start();

            let signal = wait_for_signal().await?;
            tracing::info!(%signal, "Shutdown signal received");

            watchdog.stop();
            watchdog.print_stats();
        }
        Commands::Check => {
            observability::init_logging_stderr(&config.observability)?;
            let watchdog = ExternalWatchdog::new(&config, prober)?;
            let result = watchdog.check_health().await;
            print_json(&result)?;
            if !result.success {
                std::process::exit(1);
            }
        }
        Commands::Probe => {
            observability::init_logging_stderr(&config.observability)?;
            let probe = MultiEndpointProbe::new(Arc::new(config), prober)?;
            let report = probe.trigger().await;
            print_json(&report)?;
            if report.summary.failed > 0 {
                std::process::exit(1);
            }
        }
        Commands::Inspect => {
            let probe = MultiEndpointProbe::new(Arc::new(config), prober)?;
            print_json(&probe.inspect())?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(args: &[&str]) -> Result<KeepAliveConfig, ConfigError> {
        let argv = ["watchdog", "--url", "http://127.0.0.1:3000/"].iter().chain(args).copied();
        Cli::parse_from(argv).resolve_config()
    }

    #[test]
    fn test_interval_above_cap_leaves_cap_untouched() {
        let config = resolve(&["--interval-ms", "900000"]).unwrap();

        assert_eq!(config.base_interval_ms, 900_000);
        assert_eq!(config.backoff_cap_ms, 600_000);
    }

    #[test]
    fn test_other_validation_errors_still_reported() {
        let err = resolve(&["--interval-ms", "0", "--timeout-ms", "0"]).unwrap_err();

        let ConfigError::Validation(errors) = err else {
            panic!("expected validation errors, got {err:?}");
        };
        assert_eq!(
            errors,
            vec![
                ValidationError::NotPositive { field: "base_interval_ms" },
                ValidationError::NotPositive { field: "request_timeout_ms" },
            ]
        );
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = resolve(&["--timeout-ms", "2500", "--stats-interval-ms", "30000", "check"])
            .unwrap();

        assert_eq!(config.request_timeout_ms, 2_500);
        assert_eq!(config.stats_interval_ms, 30_000);
        assert_eq!(config.primary_target().unwrap().as_str(), "http://127.0.0.1:3000/");
    }
}
