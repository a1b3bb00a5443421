//! Logging initialisation.

use crate::config::{LogFormat, LoggingConfig};
use crate::env;
use crate::error::{Error, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter directive for the configured level.
///
/// `STRATUM_LOG` wins over the config when set.
pub fn filter_directive(config: &LoggingConfig) -> String {
    env::get_var(env::vars::STRATUM_LOG)
        .unwrap_or_else(|| format!("stratum={}", config.level.as_str()))
}

/// Install the global `tracing` subscriber.
///
/// Returns an error rather than panicking if a subscriber is already set.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(filter_directive(config))
        .map_err(|e| Error::Logging(e.to_string()))?;

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
    };

    installed.map_err(|e| Error::Logging(e.to_string()))
}
