//! Configuration module
//!
//! Loads configuration from environment variables once at startup; the
//! values are then handed to each component explicitly.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::guard::PinHashing;
use crate::query::{QuerySettings, DEFAULT_RECENT_ACTIVITY_LIMIT};

/// Where accounts and the ledger live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(ConfigError::InvalidValue("STORAGE_BACKEND")),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub storage_backend: StorageBackend,

    /// Database connection URL (required for the postgres backend)
    pub database_url: Option<String>,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Upper bound for any single storage call
    pub storage_timeout: Duration,

    pub pin_hashing: PinHashing,

    pub query: QuerySettings,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage_backend = match lookup("STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => StorageBackend::Postgres,
        };

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingEnv("DATABASE_URL"));
        }

        let database_max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?;

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = parse_or(&lookup, "PORT", 3000)?;

        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        let storage_timeout_ms: u64 = parse_or(&lookup, "STORAGE_TIMEOUT_MS", 5000)?;
        if storage_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue("STORAGE_TIMEOUT_MS"));
        }

        let defaults = PinHashing::default();
        let pin_hashing = PinHashing {
            memory_kib: parse_or(&lookup, "PIN_HASH_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_or(&lookup, "PIN_HASH_ITERATIONS", defaults.iterations)?,
        };
        // argon2 minimums
        if pin_hashing.memory_kib < 8 {
            return Err(ConfigError::InvalidValue("PIN_HASH_MEMORY_KIB"));
        }
        if pin_hashing.iterations == 0 {
            return Err(ConfigError::InvalidValue("PIN_HASH_ITERATIONS"));
        }

        let recent_activity_limit =
            parse_or(&lookup, "SUMMARY_RECENT_LIMIT", DEFAULT_RECENT_ACTIVITY_LIMIT)?;
        if recent_activity_limit == 0 {
            return Err(ConfigError::InvalidValue("SUMMARY_RECENT_LIMIT"));
        }

        Ok(Self {
            storage_backend,
            database_url,
            database_max_connections,
            host,
            port,
            environment,
            storage_timeout: Duration::from_millis(storage_timeout_ms),
            pin_hashing,
            query: QuerySettings {
                recent_activity_limit,
            },
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue(key)),
        None => Ok(default),
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
