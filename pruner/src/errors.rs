//! Custom error types for the pruner
//!
//! Provides structured error handling with context for the failure scenarios
//! the daemon distinguishes between.

use std::fmt;

/// Errors that end a prune cycle. Configuration errors surface at startup
/// and database errors are absorbed by the health checks, so neither
/// reaches this type.
#[derive(Debug)]
pub enum PrunerError {
    /// Retention command errors
    Command(CommandError),

    /// Other errors with context
    Other(String),
}

/// Configuration error variants
#[derive(Debug)]
pub enum ConfigError {
    /// Invalid configuration value
    InvalidValue { field: String, reason: String },

    /// Failed to read the environment directory
    EnvDirUnreadable { path: String, reason: String },
}

/// Database error variants
#[derive(Debug)]
pub enum DatabaseError {
    /// Connection failed
    ConnectionFailed { host: String, reason: String },

    /// Query execution failed
    QueryFailed { query: String, reason: String },
}

/// Retention command error variants
#[derive(Debug)]
pub enum CommandError {
    /// The command line could not be built from the configuration
    InvalidArgument { argument: String, reason: String },

    /// The process could not be started at all
    SpawnFailed { program: String, reason: String },

    /// The process ran and exited unsuccessfully
    NonZeroExit {
        program: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
}

impl fmt::Display for PrunerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrunerError::Command(e) => write!(f, "Command error: {}", e),
            PrunerError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
            ConfigError::EnvDirUnreadable { path, reason } => {
                write!(f, "Failed to read envdir '{}': {}", path, reason)
            }
        }
    }
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::ConnectionFailed { host, reason } => {
                write!(f, "Connection to {} failed: {}", host, reason)
            }
            DatabaseError::QueryFailed { query, reason } => {
                write!(f, "Query '{}' failed: {}", query, reason)
            }
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::InvalidArgument { argument, reason } => {
                write!(f, "Invalid argument '{}': {}", argument, reason)
            }
            CommandError::SpawnFailed { program, reason } => {
                write!(f, "Failed to run {}: {}", program, reason)
            }
            CommandError::NonZeroExit {
                program,
                code,
                stdout,
                stderr,
            } => {
                let code = code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string());
                write!(f, "{} exited with status {}", program, code)?;
                if !stderr.trim().is_empty() {
                    write!(f, ": {}", stderr.trim())?;
                }
                if !stdout.trim().is_empty() {
                    write!(f, " (stdout: {})", stdout.trim())?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for PrunerError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for DatabaseError {}
impl std::error::Error for CommandError {}

impl From<CommandError> for PrunerError {
    fn from(err: CommandError) -> Self {
        PrunerError::Command(err)
    }
}
