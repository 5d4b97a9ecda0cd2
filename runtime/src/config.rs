//! Root store configuration

use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Environment variable overriding [`StoreConfig::broadcast_capacity`]
pub const BROADCAST_CAPACITY_VAR: &str = "REFLUX_BROADCAST_CAPACITY";

/// Environment variable overriding [`StoreConfig::log_state_changes`]
pub const LOG_STATE_CHANGES_VAR: &str = "REFLUX_LOG_STATE_CHANGES";

const DEFAULT_BROADCAST_CAPACITY: usize = 64;

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set but could not be parsed
    #[error("Failed to parse {var}={value}: {reason}")]
    Parse {
        /// Variable name
        var: &'static str,
        /// Offending value
        value: String,
        /// What was expected
        reason: &'static str,
    },

    /// A value parsed but is out of range
    #[error("Configuration validation failed: {0}")]
    Validation(String),
}

/// Configuration for [`RootStore`](crate::RootStore) instances
///
/// # Example
///
/// ```
/// use reflux_runtime::StoreConfig;
///
/// let config = StoreConfig::default()
///     .with_broadcast_capacity(256)
///     .with_log_state_changes(true);
/// assert_eq!(config.broadcast_capacity, 256);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Capacity of the dispatched-action broadcast channel
    pub broadcast_capacity: usize,
    /// Log the full root state at debug level after every change
    pub log_state_changes: bool,
}

impl StoreConfig {
    /// Create a configuration with explicit values
    #[must_use]
    pub const fn new(broadcast_capacity: usize, log_state_changes: bool) -> Self {
        Self {
            broadcast_capacity,
            log_state_changes,
        }
    }

    /// Set the broadcast capacity
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Enable or disable state change logging
    #[must_use]
    pub const fn with_log_state_changes(mut self, enabled: bool) -> Self {
        self.log_state_changes = enabled;
        self
    }

    /// Defaults overridden by `REFLUX_*` environment variables
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unparsable value or
    /// the resulting configuration is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`
    ///
    /// # Errors
    ///
    /// See [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(BROADCAST_CAPACITY_VAR) {
            config.broadcast_capacity =
                parse(BROADCAST_CAPACITY_VAR, &value, "a positive integer")?;
        }

        if let Some(value) = lookup(LOG_STATE_CHANGES_VAR) {
            config.log_state_changes = parse_flag(&value)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if the broadcast capacity is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.broadcast_capacity == 0 {
            return Err(ConfigError::Validation(
                "broadcast capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
            log_state_changes: false,
        }
    }
}

fn parse<T: FromStr>(var: &'static str, value: &str, reason: &'static str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Parse {
        var,
        value: value.to_string(),
        reason,
    })
}

fn parse_flag(value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Parse {
            var: LOG_STATE_CHANGES_VAR,
            value: value.to_string(),
            reason: "a boolean",
        }),
    }
}
