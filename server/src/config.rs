//! Configuration management for the order API server.
//!
//! Loads configuration from environment variables with defaults. A variable
//! that is set but cannot be parsed is an error rather than a silent default.

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set to a value that does not parse.
    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// Values parse individually but are inconsistent.
    #[error("inconsistent configuration: {0}")]
    Inconsistent(String),
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Redis configuration
    pub redis: RedisConfig,
    /// Order store configuration
    pub store: StoreConfig,
    /// Application server configuration
    pub server: ServerConfig,
}

/// Redis configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisConfig {
    /// Redis connection URL
    pub url: String,
    /// Bound on connecting plus the startup `PING`
    pub connect_timeout: Duration,
}

/// Order store configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Deadline applied to every store operation
    pub operation_timeout: Duration,
    /// Listing page size when a request gives none
    pub page_size_default: usize,
    /// Largest listing page size a request may ask for
    pub page_size_max: usize,
}

/// Application server configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    /// Bind address
    pub host: IpAddr,
    /// Bind port
    pub port: u16,
}

impl ServerConfig {
    /// Socket address to bind.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Environment Variables
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `REDIS_URL` | `redis://127.0.0.1:6379` |
    /// | `REDIS_CONNECT_TIMEOUT` (seconds) | `5` |
    /// | `STORE_OPERATION_TIMEOUT_MS` | `2000` |
    /// | `SERVER_HOST` | `0.0.0.0` |
    /// | `SERVER_PORT` | `3000` |
    /// | `ORDERS_PAGE_SIZE_DEFAULT` | `50` |
    /// | `ORDERS_PAGE_SIZE_MAX` | `1000` |
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unparsable value or
    /// the page sizes are inconsistent.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value if set.
    ///
    /// # Errors
    ///
    /// See [`Config::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = Self {
            redis: RedisConfig {
                url: lookup("REDIS_URL").unwrap_or_else(|| "redis://127.0.0.1:6379".to_string()),
                connect_timeout: Duration::from_secs(parse_or(
                    &lookup,
                    "REDIS_CONNECT_TIMEOUT",
                    5,
                )?),
            },
            store: StoreConfig {
                operation_timeout: Duration::from_millis(parse_or(
                    &lookup,
                    "STORE_OPERATION_TIMEOUT_MS",
                    2000,
                )?),
                page_size_default: parse_or(&lookup, "ORDERS_PAGE_SIZE_DEFAULT", 50)?,
                page_size_max: parse_or(&lookup, "ORDERS_PAGE_SIZE_MAX", 1000)?,
            },
            server: ServerConfig {
                host: parse_or(&lookup, "SERVER_HOST", IpAddr::from([0, 0, 0, 0]))?,
                port: parse_or(&lookup, "SERVER_PORT", 3000)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let StoreConfig {
            operation_timeout,
            page_size_default,
            page_size_max,
        } = self.store;

        if operation_timeout.is_zero() {
            return Err(ConfigError::Inconsistent(
                "STORE_OPERATION_TIMEOUT_MS must be positive".to_string(),
            ));
        }
        if page_size_default == 0 || page_size_default > page_size_max {
            return Err(ConfigError::Inconsistent(format!(
                "ORDERS_PAGE_SIZE_DEFAULT ({page_size_default}) must be between 1 and ORDERS_PAGE_SIZE_MAX ({page_size_max})"
            )));
        }
        Ok(())
    }
}

/// Parse `var` if set, otherwise use `default`.
fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.redis.url, "redis://127.0.0.1:6379");
        assert_eq!(config.redis.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.store.operation_timeout, Duration::from_millis(2000));
        assert_eq!(config.store.page_size_default, 50);
        assert_eq!(config.store.page_size_max, 1000);
        assert_eq!(config.server.addr(), "0.0.0.0:3000".parse().unwrap());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("REDIS_URL", "redis://cache:6380"),
            ("SERVER_HOST", "127.0.0.1"),
            ("SERVER_PORT", "8080"),
            ("STORE_OPERATION_TIMEOUT_MS", "250"),
            ("ORDERS_PAGE_SIZE_DEFAULT", "10"),
            ("ORDERS_PAGE_SIZE_MAX", "100"),
        ])
        .unwrap();
        assert_eq!(config.redis.url, "redis://cache:6380");
        assert_eq!(config.server.addr(), "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.store.operation_timeout, Duration::from_millis(250));
        assert_eq!(config.store.page_size_default, 10);
        assert_eq!(config.store.page_size_max, 100);
    }

    #[test]
    fn test_unparsable_value_is_error() {
        let err = load(&[("SERVER_PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "SERVER_PORT", .. }));

        let err = load(&[("REDIS_CONNECT_TIMEOUT", "-1")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "REDIS_CONNECT_TIMEOUT", .. }));
    }

    #[test]
    fn test_inconsistent_page_sizes() {
        assert!(matches!(
            load(&[("ORDERS_PAGE_SIZE_DEFAULT", "0")]),
            Err(ConfigError::Inconsistent(_))
        ));
        assert!(matches!(
            load(&[("ORDERS_PAGE_SIZE_DEFAULT", "500"), ("ORDERS_PAGE_SIZE_MAX", "100")]),
            Err(ConfigError::Inconsistent(_))
        ));
    }

    #[test]
    fn test_zero_operation_timeout_rejected() {
        assert!(matches!(
            load(&[("STORE_OPERATION_TIMEOUT_MS", "0")]),
            Err(ConfigError::Inconsistent(_))
        ));
    }
}
