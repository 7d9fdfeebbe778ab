use crate::config::EnvDir;
use crate::errors::CommandError;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command as AsyncCommand;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs an external program to completion, capturing its output.
/// A non-zero exit is reported as an error.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, CommandError>;
}

/// Spawns real processes. The envdir is re-read before every spawn and its
/// variables are passed to the child explicitly.
#[derive(Debug, Clone, Default)]
pub struct TokioCommandRunner {
    envdir: Option<EnvDir>,
}

impl TokioCommandRunner {
    pub fn new(envdir: Option<EnvDir>) -> Self {
        Self { envdir }
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, CommandError> {
        let vars = match &self.envdir {
            Some(envdir) => envdir.refresh().await.unwrap_or_else(|e| {
                warn!("Could not refresh envdir before running {}: {}", program, e);
                Default::default()
            }),
            None => Default::default(),
        };

        debug!("Executing {} {}", program, args.join(" "));

        // No kill_on_drop: an attempt that has started is always allowed to finish
        let output = AsyncCommand::new(program)
            .args(args)
            .envs(&vars)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| CommandError::SpawnFailed {
                program: program.to_string(),
                reason: e.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if output.status.success() {
            Ok(CommandOutput { stdout, stderr })
        } else {
            Err(CommandError::NonZeroExit {
                program: program.to_string(),
                code: output.status.code(),
                stdout,
                stderr,
            })
        }
    }
}
