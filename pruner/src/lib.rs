pub mod config;
pub mod constants;
pub mod database;
pub mod errors;
pub mod health;
pub mod scheduler;
pub mod services;
pub mod shutdown;

// Re-export commonly used types
pub use config::{Config, CycleSettings, EnvDir};
pub use database::{DatabaseProbe, DatabaseSettings, PostgresProbe};
pub use health::{ReadinessProber, RoleChecker};
pub use scheduler::{CycleOutcome, LoopState, LoopSummary, PruneScheduler};
pub use services::{CommandRunner, RetentionExecutor, RetentionOutcome, TokioCommandRunner};
pub use shutdown::Shutdown;
