//! Database layer for the pruner.
//!
//! The daemon only ever asks PostgreSQL two questions: "are you answering?"
//! and "are you the primary?". Both go through [`DatabaseProbe`] so that the
//! prune loop can be exercised without a server.
//!
//! - `postgres` - per-check connections against a real server

mod postgres;

pub use postgres::PostgresProbe;

use crate::constants::defaults;
use crate::errors::{ConfigError, DatabaseError};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::fmt;
use std::str::FromStr;

#[async_trait]
pub trait DatabaseProbe: Send + Sync {
    /// Runs a trivial query on a fresh connection.
    async fn ping(&self) -> Result<(), DatabaseError>;

    /// Whether the instance is out of recovery, i.e. accepts writes.
    async fn is_primary(&self) -> Result<bool, DatabaseError>;
}

/// Connection parameters given explicitly on the command line. Anything left
/// unset is resolved from `PG*` environment variables when connecting.
#[derive(Clone, Default)]
pub struct DatabaseSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub sslmode: Option<String>,
}

/// Fully resolved parameters for one connection attempt.
#[derive(Clone)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub database: String,
    pub ssl_mode: PgSslMode,
}

impl DatabaseSettings {
    pub fn resolve_from_env(&self) -> Result<ConnectionParams, ConfigError> {
        self.resolve(|key| std::env::var(key).ok())
    }

    pub fn resolve<F>(&self, lookup: F) -> Result<ConnectionParams, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |explicit: &Option<String>, key: &str, default: &str| {
            explicit
                .clone()
                .or_else(|| lookup(key).filter(|v| !v.is_empty()))
                .unwrap_or_else(|| default.to_string())
        };

        let port = match self.port {
            Some(port) => port,
            None => match lookup("PGPORT").filter(|v| !v.is_empty()) {
                Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    field: "PGPORT".to_string(),
                    reason: format!("'{}' is not a valid port", raw),
                })?,
                None => defaults::PG_PORT,
            },
        };

        let password = self
            .password
            .clone()
            .or_else(|| lookup("PGPASSWORD").filter(|v| !v.is_empty()));

        let ssl_mode = parse_ssl_mode(&pick(&self.sslmode, "PGSSLMODE", defaults::PG_SSLMODE))?;

        Ok(ConnectionParams {
            host: pick(&self.host, "PGHOST", defaults::PG_HOST),
            port,
            user: pick(&self.user, "PGUSER", defaults::PG_USER),
            password,
            database: pick(&self.database, "PGDATABASE", defaults::PG_DATABASE),
            ssl_mode,
        })
    }
}

impl ConnectionParams {
    pub fn connect_options(&self) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(&self.database)
            .ssl_mode(self.ssl_mode)
            .application_name("walg-pruner");

        match &self.password {
            Some(password) => options.password(password),
            None => options,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }
}

pub fn parse_ssl_mode(value: &str) -> Result<PgSslMode, ConfigError> {
    PgSslMode::from_str(value.trim()).map_err(|_| ConfigError::InvalidValue {
        field: "pg-sslmode".to_string(),
        reason: format!(
            "'{}' is not one of disable, allow, prefer, require, verify-ca, verify-full",
            value
        ),
    })
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("database", &self.database)
            .field("sslmode", &self.sslmode)
            .finish()
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("database", &self.database)
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}
