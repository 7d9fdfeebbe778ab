pub mod commands;
pub mod retention;

pub use commands::{CommandOutput, CommandRunner, TokioCommandRunner};
pub use retention::{RetentionCommand, RetentionExecutor, RetentionOutcome};
