pub mod envdir;

use crate::constants::defaults;
use crate::database::DatabaseSettings;
use crate::errors::ConfigError;
use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

pub use envdir::{apply_env_vars, read_envdir, EnvDir, EnvVars};

/// Command line and environment options of the daemon.
///
/// Database connection flags deliberately carry no `env` binding: values not
/// passed on the command line are looked up in the process environment at
/// connection time, after the envdir has been materialized.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "walg-pruner",
    about = "Periodically prunes WAL-G backups while the local PostgreSQL is the primary",
    version
)]
pub struct Config {
    /// Interval in seconds between prunes
    #[arg(long, env = "PRUNE_INTERVAL", default_value_t = defaults::INTERVAL_SECONDS)]
    pub interval: u64,

    /// Number of full backups to retain
    #[arg(long, env = "RETAIN_COUNT", default_value_t = defaults::RETAIN_COUNT)]
    pub retain: u32,

    /// Timestamp or backup name after which backups should be retained
    #[arg(long, env = "AFTER_TIMESTAMP")]
    pub after: Option<String>,

    /// Directory containing environment variable files
    #[arg(long, env = "ENVDIR", default_value = defaults::ENVDIR)]
    pub envdir: PathBuf,

    /// Log level for the application
    #[arg(long, env = "LOG_LEVEL", default_value = defaults::LOG_LEVEL)]
    pub log_level: String,

    /// PostgreSQL host (falls back to $PGHOST)
    #[arg(long)]
    pub pg_host: Option<String>,

    /// PostgreSQL port (falls back to $PGPORT)
    #[arg(long)]
    pub pg_port: Option<u16>,

    /// PostgreSQL user (falls back to $PGUSER)
    #[arg(long)]
    pub pg_user: Option<String>,

    /// PostgreSQL password (falls back to $PGPASSWORD)
    #[arg(long)]
    pub pg_password: Option<String>,

    /// PostgreSQL database (falls back to $PGDATABASE)
    #[arg(long)]
    pub pg_database: Option<String>,

    /// PostgreSQL SSL mode (falls back to $PGSSLMODE, then "require")
    #[arg(long)]
    pub pg_sslmode: Option<String>,

    /// WAL-G binary used for deletions
    #[arg(long, env = "WALG_BIN", default_value = defaults::WALG_BIN)]
    pub walg_bin: String,

    /// Attempts per cycle before the prune is abandoned
    #[arg(long, env = "PRUNE_MAX_RETRIES", default_value_t = crate::constants::retention::MAX_ATTEMPTS)]
    pub max_retries: u32,

    /// Seconds to wait between failed attempts
    #[arg(long, env = "PRUNE_RETRY_BACKOFF", default_value_t = crate::constants::retention::RETRY_BACKOFF.as_secs())]
    pub retry_backoff: u64,

    /// Seconds to wait between database readiness probes
    #[arg(long, env = "READINESS_BACKOFF", default_value_t = crate::constants::readiness::BACKOFF.as_secs())]
    pub readiness_backoff: u64,
}

/// Timing and retention parameters of the prune loop, fixed for the
/// lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleSettings {
    pub interval: Duration,
    pub retain: u32,
    pub after: Option<String>,
    pub walg_bin: String,
    pub max_attempts: u32,
    pub retry_backoff: Duration,
    pub readiness_backoff: Duration,
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(defaults::INTERVAL_SECONDS),
            retain: defaults::RETAIN_COUNT,
            after: None,
            walg_bin: defaults::WALG_BIN.to_string(),
            max_attempts: crate::constants::retention::MAX_ATTEMPTS,
            retry_backoff: crate::constants::retention::RETRY_BACKOFF,
            readiness_backoff: crate::constants::readiness::BACKOFF,
        }
    }
}

impl Config {
    /// Rejects values that would make the loop meaningless or dangerous.
    /// Called once at startup; the loop assumes these hold afterwards.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval == 0 {
            return Err(invalid("interval", "must be at least one second"));
        }
        // `retain FULL 0` would ask WAL-G to delete every full backup
        if self.retain == 0 {
            return Err(invalid("retain", "must keep at least one full backup"));
        }
        if self.max_retries == 0 {
            return Err(invalid("max-retries", "must allow at least one attempt"));
        }
        if self.walg_bin.trim().is_empty() {
            return Err(invalid("walg-bin", "must not be empty"));
        }
        if let Some(after) = &self.after {
            if after.trim().is_empty() {
                return Err(invalid("after", "must not be blank when set"));
            }
        }
        if let Some(mode) = &self.pg_sslmode {
            crate::database::parse_ssl_mode(mode)?;
        }
        parse_log_level(&self.log_level)?;
        Ok(())
    }

    pub fn tracing_level(&self) -> Result<Level, ConfigError> {
        parse_log_level(&self.log_level)
    }

    pub fn cycle_settings(&self) -> CycleSettings {
        CycleSettings {
            interval: Duration::from_secs(self.interval),
            retain: self.retain,
            after: self.after.clone(),
            walg_bin: self.walg_bin.clone(),
            max_attempts: self.max_retries,
            retry_backoff: Duration::from_secs(self.retry_backoff),
            readiness_backoff: Duration::from_secs(self.readiness_backoff),
        }
    }

    pub fn database_settings(&self) -> DatabaseSettings {
        DatabaseSettings {
            host: self.pg_host.clone(),
            port: self.pg_port,
            user: self.pg_user.clone(),
            password: self.pg_password.clone(),
            database: self.pg_database.clone(),
            sslmode: self.pg_sslmode.clone(),
        }
    }
}

/// Accepts both tracing level names and the Python-style aliases
/// (`WARNING`, `CRITICAL`) used by existing deployments.
pub fn parse_log_level(value: &str) -> Result<Level, ConfigError> {
    match value.trim().to_ascii_uppercase().as_str() {
        "WARNING" => Ok(Level::WARN),
        "CRITICAL" | "FATAL" => Ok(Level::ERROR),
        other => Level::from_str(other).map_err(|_| invalid("log-level", "unknown level")),
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
