//! Process configuration, read from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `FAIRWAY_BIND_ADDR` | `0.0.0.0:8080` |
//! | `DATABASE_URL` | unset (in-memory store) |
//! | `FAIRWAY_DB_MAX_CONNECTIONS` | `5` |
//! | `FAIRWAY_DEFAULT_CAPACITY` | `4` |
//! | `FAIRWAY_LOG_FORMAT` | `json` (`json` or `pretty`) |

use std::net::SocketAddr;

use thiserror::Error;

use fairway_observability::LogFormat;
use fairway_teetimes::DEFAULT_CAPACITY;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} has an invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Postgres connection string; `None` runs on the in-memory store.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    /// Capacity for tee times scheduled without one.
    pub default_capacity: u32,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database_url: None,
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            default_capacity: DEFAULT_CAPACITY,
            log_format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the process environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let bind_addr = match var("FAIRWAY_BIND_ADDR") {
            Some(raw) => raw.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
                key: "FAIRWAY_BIND_ADDR",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => defaults.bind_addr,
        };

        let db_max_connections = match var("FAIRWAY_DB_MAX_CONNECTIONS") {
            Some(raw) => positive("FAIRWAY_DB_MAX_CONNECTIONS", &raw)?,
            None => defaults.db_max_connections,
        };

        let default_capacity = match var("FAIRWAY_DEFAULT_CAPACITY") {
            Some(raw) => positive("FAIRWAY_DEFAULT_CAPACITY", &raw)?,
            None => defaults.default_capacity,
        };

        let log_format = match var("FAIRWAY_LOG_FORMAT") {
            Some(raw) => raw.parse::<LogFormat>().map_err(|e| {
                ConfigError::Invalid {
                    key: "FAIRWAY_LOG_FORMAT",
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?,
            None => defaults.log_format,
        };

        Ok(Self {
            bind_addr,
            database_url: var("DATABASE_URL"),
            db_max_connections,
            default_capacity,
            log_format,
        })
    }
}

fn positive(key: &'static str, raw: &str) -> Result<u32, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason,
    };
    let value: u32 = raw.parse().map_err(|e: std::num::ParseIntError| invalid(e.to_string()))?;
    if value == 0 {
        return Err(invalid("must be at least 1".to_string()));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.default_capacity, 4);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn reads_every_variable() {
        let config = AppConfig::from_lookup(lookup(&[
            ("FAIRWAY_BIND_ADDR", "127.0.0.1:9000"),
            ("DATABASE_URL", "postgres://fairway@localhost/fairway"),
            ("FAIRWAY_DB_MAX_CONNECTIONS", "12"),
            ("FAIRWAY_DEFAULT_CAPACITY", "3"),
            ("FAIRWAY_LOG_FORMAT", "pretty"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://fairway@localhost/fairway")
        );
        assert_eq!(config.db_max_connections, 12);
        assert_eq!(config.default_capacity, 3);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn blank_database_url_means_in_memory() {
        let config = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "  ")])).unwrap();
        assert!(config.database_url.is_none());
    }

    #[test]
    fn rejects_bad_values() {
        for (key, value) in [
            ("FAIRWAY_BIND_ADDR", "not-an-addr"),
            ("FAIRWAY_DEFAULT_CAPACITY", "0"),
            ("FAIRWAY_DEFAULT_CAPACITY", "-2"),
            ("FAIRWAY_DB_MAX_CONNECTIONS", "many"),
            ("FAIRWAY_LOG_FORMAT", "xml"),
        ] {
            match AppConfig::from_lookup(lookup(&[(key, value)])) {
                Err(ConfigError::Invalid { key: k, .. }) => assert_eq!(k, key),
                Ok(_) => panic!("Expected {key}={value} to be rejected"),
            }
        }
    }
}
