use std::env;
use std::str::FromStr;

use axum::http::HeaderValue;
use sqlx::postgres::PgConnectOptions;

/// Configuration loading failure. Absent variables take defaults; only
/// values that are present but malformed end up here.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("invalid DATABASE_URL: {0}")]
    DatabaseUrl(#[source] sqlx::Error),
}

/// Where the warehouse lives, exactly as configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseSettings {
    /// `DATABASE_URL`, validated but kept verbatim.
    Url(String),
    /// Individual `PG*` variables.
    Params {
        host: String,
        port: u16,
        database: String,
        user: String,
        password: Option<String>,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseSettings,
    pub database_max_connections: u32,
    pub database_acquire_timeout_secs: u64,
    pub host: String,
    pub port: u16,
    pub frontend_origin: HeaderValue,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup. Every value in
    /// the result comes from `lookup` or a fixed default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database = match lookup("DATABASE_URL") {
            Some(url) => {
                PgConnectOptions::from_str(&url).map_err(ConfigError::DatabaseUrl)?;
                DatabaseSettings::Url(url)
            }
            None => DatabaseSettings::Params {
                host: lookup("PGHOST").unwrap_or_else(|| "localhost".to_string()),
                port: parse_or(&lookup, "PGPORT", 5432)?,
                database: lookup("PGDATABASE").unwrap_or_else(|| "postgres".to_string()),
                user: lookup("PGUSER").unwrap_or_else(|| "postgres".to_string()),
                password: lookup("PGPASSWORD"),
            },
        };

        let frontend_url =
            lookup("FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".to_string());
        let frontend_origin =
            HeaderValue::from_str(&frontend_url).map_err(|_| ConfigError::Invalid {
                key: "FRONTEND_URL",
                value: frontend_url.clone(),
            })?;

        Ok(Self {
            database,
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            database_acquire_timeout_secs: parse_or(&lookup, "DATABASE_ACQUIRE_TIMEOUT_SECS", 30)?,
            host: lookup("BACKEND_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 5000)?,
            frontend_origin,
        })
    }

    /// Driver connect options. sqlx fills settings not configured here
    /// (`PGSSLMODE`, `PGAPPNAME`, ...) from the process environment.
    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        match &self.database {
            DatabaseSettings::Url(url) => {
                PgConnectOptions::from_str(url).map_err(ConfigError::DatabaseUrl)
            }
            DatabaseSettings::Params {
                host,
                port,
                database,
                user,
                password,
            } => {
                let options = PgConnectOptions::new()
                    .host(host)
                    .port(*port)
                    .database(database)
                    .username(user);
                Ok(match password {
                    Some(password) => options.password(password),
                    None => options,
                })
            }
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}
