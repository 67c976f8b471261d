//! Tracing setup
//!
//! `RUST_LOG` overrides the default filter.

use crate::config::ConfigError;
use tracing_subscriber::EnvFilter;

fn env_filter(default_filter: &str) -> Result<EnvFilter, ConfigError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|e| ConfigError::Telemetry(e.to_string()))
}

/// Install a human-readable fmt subscriber
///
/// # Errors
/// Fails on an unparsable filter or when a global subscriber is already set.
pub fn init_tracing(default_filter: &str) -> Result<(), ConfigError> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_filter)?)
        .with_target(false)
        .try_init()
        .map_err(|e| ConfigError::Telemetry(e.to_string()))
}

/// Install a JSON fmt subscriber
///
/// # Errors
/// Fails on an unparsable filter or when a global subscriber is already set.
pub fn init_json_tracing(default_filter: &str) -> Result<(), ConfigError> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter(default_filter)?)
        .try_init()
        .map_err(|e| ConfigError::Telemetry(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_is_reported() {
        let first = init_tracing("debug");
        let second = init_tracing("debug");
        // Another test may have installed a subscriber first
        assert!(first.is_ok() || matches!(first, Err(ConfigError::Telemetry(_))));
        assert!(matches!(second, Err(ConfigError::Telemetry(_))));
    }
}
