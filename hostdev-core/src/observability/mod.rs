//! Observability infrastructure: tracing and metrics.
//!
//! The library only emits `tracing` events and `metrics` counters. Binaries that
//! embed it call [`init`] once to install a subscriber.

use crate::config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod metrics;

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `config.log_level` (e.g. `"info"`).
///
/// # Errors
/// Returns an error if `log_level` is not a valid directive or a global
/// subscriber is already installed.
pub fn init(config: &Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let default_level = config.log_level.as_str();
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true).with_level(true))
        .try_init()?;

    metrics::register_metrics();
    tracing::info!(level = %default_level, "Observability initialized");

    Ok(())
}
