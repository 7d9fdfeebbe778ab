use super::commands::CommandRunner;
use crate::errors::CommandError;
use crate::shutdown::Shutdown;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// `<walg> delete retain FULL <retain> [--after <marker>] --confirm`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl RetentionCommand {
    pub fn build(program: &str, retain: u32, after: Option<&str>) -> Result<Self, CommandError> {
        if program.trim().is_empty() {
            return Err(CommandError::InvalidArgument {
                argument: "program".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if retain == 0 {
            return Err(CommandError::InvalidArgument {
                argument: "retain".to_string(),
                reason: "refusing to delete every full backup".to_string(),
            });
        }

        let mut args = vec![
            "delete".to_string(),
            "retain".to_string(),
            "FULL".to_string(),
            retain.to_string(),
        ];

        if let Some(marker) = after {
            if marker.contains('\0') {
                return Err(CommandError::InvalidArgument {
                    argument: "after".to_string(),
                    reason: "contains a NUL byte".to_string(),
                });
            }
            args.push("--after".to_string());
            args.push(marker.to_string());
        }

        args.push("--confirm".to_string());

        Ok(Self {
            program: program.to_string(),
            args,
        })
    }

    pub fn display(&self) -> String {
        format!("{} {}", self.program, self.args.join(" "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetentionOutcome {
    Succeeded { attempts: u32, output: String },
    /// Every attempt failed; the cycle is abandoned.
    Exhausted { attempts: u32, last_error: String },
    /// Shutdown was requested during a retry backoff; no further attempt
    /// was started.
    Interrupted { attempts: u32, last_error: String },
}

impl RetentionOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            RetentionOutcome::Succeeded { attempts, .. } => *attempts,
            RetentionOutcome::Exhausted { attempts, .. } => *attempts,
            RetentionOutcome::Interrupted { attempts, .. } => *attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RetentionOutcome::Succeeded { .. })
    }
}

pub struct RetentionExecutor<R> {
    runner: R,
    program: String,
    max_attempts: u32,
    retry_backoff: Duration,
    shutdown: Shutdown,
}

impl<R: CommandRunner> RetentionExecutor<R> {
    pub fn new(runner: R, program: impl Into<String>, max_attempts: u32, retry_backoff: Duration) -> Self {
        Self {
            runner,
            program: program.into(),
            max_attempts: max_attempts.max(1),
            retry_backoff,
            shutdown: Shutdown::new(),
        }
    }

    /// Lets `shutdown` cut a retry backoff short. An attempt that is already
    /// running is never interrupted.
    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Runs the retention command, retrying failed attempts after a fixed
    /// backoff. Failed attempts are reported in the outcome; only a command
    /// that cannot be built at all is returned as an error.
    pub async fn execute(&self, retain: u32, after: Option<&str>) -> Result<RetentionOutcome, CommandError> {
        let command = RetentionCommand::build(&self.program, retain, after)?;
        info!("Running command: {}", command.display());

        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            debug!("Attempt {} of {}", attempt, self.max_attempts);

            match self.runner.run(&command.program, &command.args).await {
                Ok(output) => {
                    info!("Command output: {}", output.stdout.trim_end());
                    info!("Successfully pruned WAL-G backups");
                    return Ok(RetentionOutcome::Succeeded {
                        attempts: attempt,
                        output: output.stdout,
                    });
                }
                Err(e) => {
                    warn!("Error occurred while pruning WAL-G backups: {}", e);
                    last_error = e.to_string();

                    if attempt < self.max_attempts {
                        warn!("Retrying in {} seconds...", self.retry_backoff.as_secs());
                        if self.shutdown.sleep(self.retry_backoff).await {
                            warn!("Shutdown requested, abandoning remaining retries");
                            return Ok(RetentionOutcome::Interrupted {
                                attempts: attempt,
                                last_error,
                            });
                        }
                    } else {
                        error!("Max retries reached, skipping this cycle.");
                    }
                }
            }
        }

        Ok(RetentionOutcome::Exhausted {
            attempts: self.max_attempts,
            last_error,
        })
    }
}
