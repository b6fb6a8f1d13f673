//! Logging initialization
//!
//! Console tracing setup driven by [`LoggingConfig`], with dependency noise
//! filtered out below trace level. `RUST_LOG` overrides the configured
//! filter when set.

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

pub use super::config::LoggingConfig;

/// Initialize the global tracing subscriber with default configuration.
pub fn init_logging() -> Result<()> {
    init_logging_with_config(&LoggingConfig::default())
}

/// Initialize the global tracing subscriber.
///
/// Fails if a subscriber is already installed, so call it once from the
/// application root.
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(from_env) => EnvFilter::new(from_env),
        Err(_) => EnvFilter::new(build_filter(config)),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    Ok(())
}

fn build_filter(config: &LoggingConfig) -> String {
    let level = config.level.as_str();
    if config.quiet_dependencies && level != "trace" {
        format!("{level},sqlx=warn,reqwest=warn,hyper=warn,html5ever=error")
    } else {
        level.to_string()
    }
}
