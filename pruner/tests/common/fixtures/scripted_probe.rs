//! Database probe with scripted answers

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use walg_pruner::errors::DatabaseError;
use walg_pruner::{DatabaseProbe, Shutdown};

/// Answers pings and role checks from queues. Once a queue is drained the
/// matching fallback answer is repeated forever.
pub struct ScriptedProbe {
    pings: Mutex<VecDeque<bool>>,
    roles: Mutex<VecDeque<Result<bool, String>>>,
    ping_fallback: bool,
    role_fallback: Result<bool, String>,
    ping_calls: AtomicUsize,
    role_calls: AtomicUsize,
    shutdown_after_role_checks: Option<(usize, Shutdown)>,
    shutdown_after_pings: Option<(usize, Shutdown)>,
}

impl ScriptedProbe {
    /// Reachable immediately and always the primary.
    pub fn primary() -> Self {
        Self::with_role(Ok(true))
    }

    /// Reachable immediately and always a replica.
    pub fn replica() -> Self {
        Self::with_role(Ok(false))
    }

    pub fn with_role(role: Result<bool, String>) -> Self {
        Self {
            pings: Mutex::new(VecDeque::new()),
            roles: Mutex::new(VecDeque::new()),
            ping_fallback: true,
            role_fallback: role,
            ping_calls: AtomicUsize::new(0),
            role_calls: AtomicUsize::new(0),
            shutdown_after_role_checks: None,
            shutdown_after_pings: None,
        }
    }

    /// The first `failures` pings fail, later ones succeed.
    pub fn failing_pings(mut self, failures: usize) -> Self {
        self.pings = Mutex::new(std::iter::repeat(false).take(failures).collect());
        self
    }

    /// Every ping fails.
    pub fn never_ready(mut self) -> Self {
        self.ping_fallback = false;
        self
    }

    pub fn role_sequence(self, roles: Vec<Result<bool, String>>) -> Self {
        *self.roles.lock().unwrap() = roles.into();
        self
    }

    /// Triggers `shutdown` from inside the n-th role check.
    pub fn shutdown_after_role_checks(mut self, n: usize, shutdown: Shutdown) -> Self {
        self.shutdown_after_role_checks = Some((n, shutdown));
        self
    }

    /// Triggers `shutdown` from inside the n-th ping.
    pub fn shutdown_after_pings(mut self, n: usize, shutdown: Shutdown) -> Self {
        self.shutdown_after_pings = Some((n, shutdown));
        self
    }

    pub fn ping_calls(&self) -> usize {
        self.ping_calls.load(Ordering::SeqCst)
    }

    pub fn role_calls(&self) -> usize {
        self.role_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatabaseProbe for ScriptedProbe {
    async fn ping(&self) -> Result<(), DatabaseError> {
        let call = self.ping_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((n, shutdown)) = &self.shutdown_after_pings {
            if call >= *n {
                shutdown.trigger();
            }
        }

        let ok = self
            .pings
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.ping_fallback);

        if ok {
            Ok(())
        } else {
            Err(DatabaseError::ConnectionFailed {
                host: "localhost:5432/postgres".to_string(),
                reason: "connection refused".to_string(),
            })
        }
    }

    async fn is_primary(&self) -> Result<bool, DatabaseError> {
        let call = self.role_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((n, shutdown)) = &self.shutdown_after_role_checks {
            if call >= *n {
                shutdown.trigger();
            }
        }

        let answer = self
            .roles
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.role_fallback.clone());

        answer.map_err(|reason| DatabaseError::QueryFailed {
            query: "SELECT NOT pg_is_in_recovery()".to_string(),
            reason,
        })
    }
}
