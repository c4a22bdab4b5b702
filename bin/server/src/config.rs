//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables. Nested keys
//! use `__` as the separator, e.g. `POOL__MAX_CONNECTIONS`.

use serde::Deserialize;

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// PostgreSQL connection string (`DATABASE_URI`).
    ///
    /// Optional at load time so that its absence is reported as a storage
    /// failure during startup rather than a generic config error.
    #[serde(default)]
    pub database_uri: Option<String>,

    /// Address the HTTP listener binds to (`BIND_ADDR`).
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Connection pool configuration.
    #[serde(default)]
    pub pool: PoolConfig,
}

/// Database connection pool configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a request waits for a free connection before the store
    /// reports itself unavailable, in seconds.
    #[serde(default = "default_acquire_timeout_seconds")]
    pub acquire_timeout_seconds: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout_seconds() -> u64 {
    5
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            acquire_timeout_seconds: default_acquire_timeout_seconds(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is present but cannot be parsed.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_source(None)
    }

    /// Loads configuration from an explicit variable map instead of the
    /// process environment. `None` reads the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is present but cannot be parsed.
    pub fn from_source(
        source: Option<config::Map<String, String>>,
    ) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true)
                    .source(source),
            )
            .build()?
            .try_deserialize()
    }
}
