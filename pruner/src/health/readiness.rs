use crate::constants::readiness::{INFO_UNTIL_ATTEMPT, WARN_UNTIL_ATTEMPT};
use crate::database::DatabaseProbe;
use crate::shutdown::Shutdown;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// How loudly a failed probe is reported, escalating with the number of
/// consecutive failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

pub fn severity_for_attempt(attempt: u64) -> Severity {
    if attempt <= INFO_UNTIL_ATTEMPT {
        Severity::Info
    } else if attempt <= WARN_UNTIL_ATTEMPT {
        Severity::Warn
    } else {
        Severity::Error
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready { attempts: u64 },
    /// Shutdown was requested before the database answered.
    Aborted { attempts: u64 },
}

pub struct ReadinessProber<P> {
    probe: Arc<P>,
    backoff: Duration,
}

impl<P: DatabaseProbe> ReadinessProber<P> {
    pub fn new(probe: Arc<P>, backoff: Duration) -> Self {
        Self { probe, backoff }
    }

    /// Probes until the database answers a trivial query. There is no
    /// attempt limit; the only other way out is a shutdown request, which is
    /// checked between probes.
    pub async fn wait_until_ready(&self, shutdown: &Shutdown) -> Readiness {
        let mut attempt: u64 = 0;

        loop {
            if shutdown.is_triggered() {
                return Readiness::Aborted { attempts: attempt };
            }
            attempt += 1;

            match self.probe.ping().await {
                Ok(()) => {
                    info!("Database is ready (attempt {})", attempt);
                    return Readiness::Ready { attempts: attempt };
                }
                Err(e) => {
                    let retry_in = self.backoff.as_secs();
                    match severity_for_attempt(attempt) {
                        Severity::Info => info!(
                            "Database not ready yet (attempt {}): {}. Retrying in {}s",
                            attempt, e, retry_in
                        ),
                        Severity::Warn => warn!(
                            "Database still not ready (attempt {}): {}. Retrying in {}s",
                            attempt, e, retry_in
                        ),
                        Severity::Error => error!(
                            "Database unreachable after {} attempts: {}. Retrying in {}s",
                            attempt, e, retry_in
                        ),
                    }
                }
            }

            if shutdown.sleep(self.backoff).await {
                return Readiness::Aborted { attempts: attempt };
            }
        }
    }
}
