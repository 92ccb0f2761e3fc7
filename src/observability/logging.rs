//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Pick JSON or pretty output from configuration
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level
//! - Alerts and stats summaries use their own targets
//!   (`keepalive::alert`, `keepalive::stats`) so they can be filtered
//! - One-shot CLI commands log to stderr so stdout stays machine-readable

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Log to stdout.
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), TryInitError> {
    init_with_writer(config, std::io::stdout)
}

/// Log to stderr.
pub fn init_logging_stderr(config: &ObservabilityConfig) -> Result<(), TryInitError> {
    init_with_writer(config, std::io::stderr)
}

fn init_with_writer<W>(config: &ObservabilityConfig, writer: W) -> Result<(), TryInitError>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("{},hyper=warn,hyper_util=warn,reqwest=warn", config.log_level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false).with_writer(writer))
            .try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().with_writer(writer)).try_init(),
    }
}
