use super::{CycleOutcome, LoopState, LoopSummary};
use crate::config::CycleSettings;
use crate::database::DatabaseProbe;
use crate::errors::PrunerError;
use crate::health::{Readiness, ReadinessProber, RoleChecker};
use crate::services::{CommandRunner, RetentionExecutor, RetentionOutcome};
use crate::shutdown::Shutdown;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

pub struct PruneScheduler<P, R> {
    settings: CycleSettings,
    readiness: ReadinessProber<P>,
    role_checker: RoleChecker<P>,
    executor: RetentionExecutor<R>,
    shutdown: Shutdown,
    state: watch::Sender<LoopState>,
}

impl<P: DatabaseProbe, R: CommandRunner> PruneScheduler<P, R> {
    pub fn new(settings: CycleSettings, probe: Arc<P>, runner: R, shutdown: Shutdown) -> Self {
        let readiness = ReadinessProber::new(probe.clone(), settings.readiness_backoff);
        let role_checker = RoleChecker::new(probe);
        let executor = RetentionExecutor::new(
            runner,
            settings.walg_bin.clone(),
            settings.max_attempts,
            settings.retry_backoff,
        )
        .with_shutdown(shutdown.clone());
        let (state, _) = watch::channel(LoopState::Starting);

        Self {
            settings,
            readiness,
            role_checker,
            executor,
            shutdown,
            state,
        }
    }

    pub fn state(&self) -> LoopState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<LoopState> {
        self.state.subscribe()
    }

    /// Waits for the database, then runs cycles until shutdown is requested.
    /// Returns only on shutdown.
    pub async fn run(&self) -> LoopSummary {
        let mut summary = LoopSummary::default();

        self.transition(LoopState::WaitingForDb);
        info!("Waiting for the database to accept connections...");
        match self.readiness.wait_until_ready(&self.shutdown).await {
            Readiness::Ready { attempts } => {
                debug!("Database ready after {} attempt(s)", attempts);
                summary.reached_ready = true;
                self.transition(LoopState::Ready);
            }
            Readiness::Aborted { attempts } => {
                warn!(
                    "Shutdown requested while waiting for the database ({} attempt(s)), exiting",
                    attempts
                );
                self.transition(LoopState::Terminating);
                return summary;
            }
        }

        while !self.shutdown.is_triggered() {
            let outcome = self.run_cycle().await;
            summary.record(outcome);
            debug!("Cycle #{} finished: {:?}", summary.cycles, outcome);

            self.transition(LoopState::Sleeping);
            info!("Waiting for next prune cycle...");
            if self.shutdown.sleep(self.settings.interval).await {
                break;
            }
        }

        self.transition(LoopState::Terminating);
        info!(
            "Prune loop stopped after {} cycle(s): {} pruned, {} skipped, {} failed",
            summary.cycles, summary.pruned, summary.skipped, summary.failed
        );
        summary
    }

    /// One role check plus, on the primary, one retention run. Errors and
    /// panics raised anywhere inside are logged and reported as
    /// [`CycleOutcome::Failed`]; they never reach the caller.
    #[instrument(skip(self))]
    pub async fn run_cycle(&self) -> CycleOutcome {
        let result = match AssertUnwindSafe(self.cycle()).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(PrunerError::Other(format!(
                "prune cycle panicked: {}",
                panic_message(&*panic)
            ))),
        };

        result.unwrap_or_else(|e| {
            error!("Unexpected error: {}", e);
            CycleOutcome::Failed
        })
    }

    async fn cycle(&self) -> Result<CycleOutcome, PrunerError> {
        self.transition(LoopState::CheckingRole);
        if !self.role_checker.is_primary().await {
            self.transition(LoopState::Skipping);
            info!("Not the primary instance, skipping prune cycle");
            return Ok(CycleOutcome::Skipped);
        }

        self.transition(LoopState::Pruning);
        let outcome = self
            .executor
            .execute(self.settings.retain, self.settings.after.as_deref())
            .await?;

        Ok(match outcome {
            RetentionOutcome::Succeeded { .. } => CycleOutcome::Pruned,
            RetentionOutcome::Exhausted { .. } | RetentionOutcome::Interrupted { .. } => {
                CycleOutcome::Failed
            }
        })
    }

    fn transition(&self, next: LoopState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            debug!("Prune loop state: {} -> {}", previous, next);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
