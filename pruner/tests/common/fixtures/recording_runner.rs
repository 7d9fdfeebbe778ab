//! Command runner that records invocations instead of spawning WAL-G

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;
use walg_pruner::errors::CommandError;
use walg_pruner::services::CommandOutput;
use walg_pruner::{CommandRunner, Shutdown};

#[derive(Debug, Clone)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub at: Instant,
}

impl Invocation {
    pub fn command_line(&self) -> String {
        format!("{} {}", self.program, self.args.join(" "))
    }
}

#[derive(Clone, Copy)]
enum Step {
    Succeed,
    Fail,
    Panic,
}

#[derive(Default)]
struct State {
    steps: VecDeque<Step>,
    invocations: Vec<Invocation>,
}

/// Clones share state, so a test can keep a handle after moving the runner
/// into the scheduler.
#[derive(Clone)]
pub struct RecordingRunner {
    state: Arc<Mutex<State>>,
    fallback_success: bool,
    stdout: String,
    shutdown_after_invocations: Option<(usize, Shutdown)>,
}

impl RecordingRunner {
    /// Every invocation exits 0 and prints `SUCCESS`.
    pub fn succeeding() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            fallback_success: true,
            stdout: "SUCCESS\n".to_string(),
            shutdown_after_invocations: None,
        }
    }

    /// Every invocation exits 1.
    pub fn failing() -> Self {
        Self {
            fallback_success: false,
            ..Self::succeeding()
        }
    }

    /// The first `n` invocations fail, later ones follow the fallback.
    pub fn failing_first(self, n: usize) -> Self {
        self.push_steps(std::iter::repeat(Step::Fail).take(n));
        self
    }

    /// The next invocation panics instead of returning.
    pub fn panicking_once(self) -> Self {
        self.push_steps(std::iter::once(Step::Panic));
        self
    }

    pub fn shutdown_after_invocations(mut self, n: usize, shutdown: Shutdown) -> Self {
        self.shutdown_after_invocations = Some((n, shutdown));
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.state.lock().unwrap().invocations.clone()
    }

    pub fn invocation_count(&self) -> usize {
        self.state.lock().unwrap().invocations.len()
    }

    fn push_steps(&self, steps: impl Iterator<Item = Step>) {
        self.state.lock().unwrap().steps.extend(steps);
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, CommandError> {
        let (step, count) = {
            let mut state = self.state.lock().unwrap();
            state.invocations.push(Invocation {
                program: program.to_string(),
                args: args.to_vec(),
                at: Instant::now(),
            });
            let fallback = if self.fallback_success {
                Step::Succeed
            } else {
                Step::Fail
            };
            (state.steps.pop_front().unwrap_or(fallback), state.invocations.len())
        };

        if let Some((n, shutdown)) = &self.shutdown_after_invocations {
            if count >= *n {
                shutdown.trigger();
            }
        }

        match step {
            Step::Succeed => Ok(CommandOutput {
                stdout: self.stdout.clone(),
                stderr: String::new(),
            }),
            Step::Fail => Err(CommandError::NonZeroExit {
                program: program.to_string(),
                code: Some(1),
                stdout: String::new(),
                stderr: "ERROR: failed to list backups: storage unreachable".to_string(),
            }),
            Step::Panic => panic!("wal-g runner exploded"),
        }
    }
}
