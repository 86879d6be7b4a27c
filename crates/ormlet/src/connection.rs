//! Connection bootstrap parameters.
//!
//! `ConnectionConfig` carries everything needed to open the MySQL pool:
//! where to connect, who to connect as, and how large the pool may grow.
//! Includes connection resilience settings for exponential backoff retries
//! while the pool is first established.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::{OrmError, Result};

/// Retry configuration for connection establishment.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 = no retries)
    pub max_retries: u32,
    /// Initial delay between retries in milliseconds
    pub initial_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff (e.g., 2.0 doubles delay each retry)
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 100,
            max_delay_ms: 5000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Creates a retry config with no retries (immediate failure).
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            initial_delay_ms: 0,
            max_delay_ms: 0,
            backoff_multiplier: 1.0,
        }
    }

    /// Calculates the delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_millis(self.initial_delay_ms);
        }

        let delay_ms = (self.initial_delay_ms as f64) * self.backoff_multiplier.powi(attempt as i32);

        Duration::from_millis((delay_ms as u64).min(self.max_delay_ms))
    }
}

/// Pool bootstrap configuration.
///
/// `user`, `password` and `database` have no defaults; [`validate`](Self::validate)
/// rejects a config without them.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub charset: String,
    /// When false, every pooled connection runs `SET autocommit=0` after connecting.
    pub autocommit: bool,
    /// Maximum number of connections in the pool.
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool.
    pub min_pool_size: u32,
    /// Pool acquire timeout in seconds.
    pub connect_timeout: u64,
    pub retry: RetryConfig,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: None,
            password: None,
            database: None,
            charset: "utf8".to_string(),
            autocommit: true,
            max_pool_size: 10,
            min_pool_size: 1,
            connect_timeout: 30,
            retry: RetryConfig::default(),
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("database", &self.database)
            .field("charset", &self.charset)
            .field("autocommit", &self.autocommit)
            .field("max_pool_size", &self.max_pool_size)
            .field("min_pool_size", &self.min_pool_size)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl ConnectionConfig {
    /// Creates a config with the required credentials and defaults for the rest.
    pub fn new(user: impl Into<String>, password: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            password: Some(password.into()),
            database: Some(database.into()),
            ..Default::default()
        }
    }

    /// Reads the config from `ORMLET_DB_*` environment variables.
    ///
    /// Unset variables keep their defaults. Missing credentials are not an
    /// error here; [`validate`](Self::validate) reports them.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the config through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("ORMLET_DB_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("ORMLET_DB_PORT") {
            config.port = parse_setting("ORMLET_DB_PORT", &port)?;
        }
        config.user = lookup("ORMLET_DB_USER");
        config.password = lookup("ORMLET_DB_PASSWORD");
        config.database = lookup("ORMLET_DB_NAME");
        if let Some(charset) = lookup("ORMLET_DB_CHARSET") {
            config.charset = charset;
        }
        if let Some(autocommit) = lookup("ORMLET_DB_AUTOCOMMIT") {
            config.autocommit = parse_bool("ORMLET_DB_AUTOCOMMIT", &autocommit)?;
        }
        if let Some(max) = lookup("ORMLET_DB_MAX_POOL") {
            config.max_pool_size = parse_setting("ORMLET_DB_MAX_POOL", &max)?;
        }
        if let Some(min) = lookup("ORMLET_DB_MIN_POOL") {
            config.min_pool_size = parse_setting("ORMLET_DB_MIN_POOL", &min)?;
        }

        Ok(config)
    }

    /// Checks that the required parameters are present and the pool bounds are sane.
    ///
    /// # Errors
    ///
    /// `OrmError::Configuration` listing every missing required parameter.
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("user", &self.user),
            ("password", &self.password),
            ("database", &self.database),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return Err(OrmError::Configuration(format!(
                "Missing required connection parameter(s): {}",
                missing.join(", ")
            )));
        }

        if self.host.is_empty() {
            return Err(OrmError::Configuration("Host cannot be empty".to_string()));
        }

        if self.max_pool_size == 0 {
            return Err(OrmError::Configuration("max_pool_size must be at least 1".to_string()));
        }

        if self.min_pool_size > self.max_pool_size {
            return Err(OrmError::Configuration(format!(
                "min_pool_size ({}) exceeds max_pool_size ({})",
                self.min_pool_size, self.max_pool_size
            )));
        }

        Ok(())
    }
}

fn parse_setting<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| OrmError::Configuration(format!("Invalid value for {}: '{}'", key, raw)))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(OrmError::Configuration(format!("Invalid value for {}: '{}'", key, raw))),
    }
}
