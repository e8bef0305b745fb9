use std::time::Duration;

use crate::backend::{parse_dsn, BackendConfig, DsnError};
use crate::env::{
    COLLECTION_ENV, DATABASE_ENV, HOST_ENV, INTERVAL_SECS_ENV, LOG_LEVEL_ENV, PORT_ENV,
    STORE_URI_ENV, USERNAME_ENV, WRITE_TIMEOUT_SECS_ENV,
};

pub const DEFAULT_COLLECTION: &str = "logs";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_INTERVAL_SECS: u64 = 2;
pub const DEFAULT_WRITE_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_USERNAME: &str = "demo";
pub const DEFAULT_LOG_LEVEL: &str = "debug";

/// Process configuration.
///
/// Everything except the store connection string has a default, so a
/// local run only needs `LOG_PUSHER_STORE_URI`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store_uri: String,
    pub database: Option<String>,
    pub collection: String,
    pub host: String,
    pub port: u16,
    pub interval: Duration,
    pub write_timeout: Duration,
    pub username: String,
    pub log_level: String,
}

impl AppConfig {
    /// Load configuration from environment variables.
    /// Loads `.env` file if present, then reads the variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Best-effort .env load; ignore if missing
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let store_uri = get(STORE_URI_ENV)
            .map(|uri| uri.trim().to_owned())
            .ok_or(ConfigError::Missing(STORE_URI_ENV))?;
        parse_dsn(&store_uri)?;

        let username = lookup(USERNAME_ENV).unwrap_or_else(|| DEFAULT_USERNAME.to_owned());
        if username.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: USERNAME_ENV,
                reason: "must not be empty".to_owned(),
            });
        }

        Ok(Self {
            store_uri,
            database: get(DATABASE_ENV),
            collection: get(COLLECTION_ENV).unwrap_or_else(|| DEFAULT_COLLECTION.to_owned()),
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_owned()),
            port: parse_or(get(PORT_ENV), PORT_ENV, DEFAULT_PORT)?,
            interval: positive_secs(
                get(INTERVAL_SECS_ENV),
                INTERVAL_SECS_ENV,
                DEFAULT_INTERVAL_SECS,
            )?,
            write_timeout: positive_secs(
                get(WRITE_TIMEOUT_SECS_ENV),
                WRITE_TIMEOUT_SECS_ENV,
                DEFAULT_WRITE_TIMEOUT_SECS,
            )?,
            username,
            log_level: get(LOG_LEVEL_ENV).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_owned()),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Store selection derived from the connection string.
    pub fn backend(&self) -> Result<BackendConfig, DsnError> {
        let kind = parse_dsn(&self.store_uri)?;
        Ok(BackendConfig::new(kind, self.store_uri.clone(), self.collection.clone())
            .with_database(self.database.clone()))
    }
}

fn parse_or<T>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: format!("{raw:?}: {e}"),
        }),
    }
}

fn positive_secs(
    raw: Option<String>,
    key: &'static str,
    default: u64,
) -> Result<Duration, ConfigError> {
    let secs = parse_or(raw, key, default)?;
    if secs == 0 {
        return Err(ConfigError::Invalid {
            key,
            reason: "must be greater than zero".to_owned(),
        });
    }
    Ok(Duration::from_secs(secs))
}

/// Error returned when the environment does not describe a usable config.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("{0} is required but not set")]
    Missing(&'static str),

    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("invalid LOG_PUSHER_STORE_URI: {0}")]
    Dsn(#[from] DsnError),
}
