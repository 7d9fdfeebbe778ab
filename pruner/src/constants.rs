//! Central repository for timeouts, retry limits and configuration defaults
//!
//! Constants are grouped by the component that consumes them so that the
//! timing policy of the daemon can be read in one place.

use std::time::Duration;

/// Retention command retry policy
pub mod retention {
    use super::Duration;

    /// Total attempts per cycle, including the first one
    pub const MAX_ATTEMPTS: u32 = 3;

    /// Pause between a failed attempt and the next one
    pub const RETRY_BACKOFF: Duration = Duration::from_secs(10);
}

/// Startup readiness probing
pub mod readiness {
    use super::Duration;

    /// Pause between two liveness probes
    pub const BACKOFF: Duration = Duration::from_secs(30);

    /// Last attempt number reported at info level
    pub const INFO_UNTIL_ATTEMPT: u64 = 5;

    /// Last attempt number reported at warn level
    pub const WARN_UNTIL_ATTEMPT: u64 = 10;
}

/// SQL issued against the local PostgreSQL instance
pub mod queries {
    pub const LIVENESS: &str = "SELECT 1";

    pub const IS_PRIMARY: &str = "SELECT NOT pg_is_in_recovery()";
}

/// Default configuration values
pub mod defaults {
    /// One prune per day
    pub const INTERVAL_SECONDS: u64 = 86_400;

    pub const RETAIN_COUNT: u32 = 2;

    pub const ENVDIR: &str = "/run/etc/wal-e.d/env";

    pub const LOG_LEVEL: &str = "INFO";

    pub const WALG_BIN: &str = "wal-g";

    pub const PG_HOST: &str = "localhost";
    pub const PG_PORT: u16 = 5432;
    pub const PG_USER: &str = "postgres";
    pub const PG_DATABASE: &str = "postgres";
    pub const PG_SSLMODE: &str = "require";
}
