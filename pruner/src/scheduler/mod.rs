//! Interval-based prune loop
//!
//! The loop moves through the following states:
//!
//! ```text
//! Starting -> WaitingForDb -> Ready
//!          -> { CheckingRole -> (Pruning | Skipping) -> Sleeping }*
//!          -> Terminating
//! ```
//!
//! - **Single flight**: cycles never overlap; the interval sleep serializes them
//! - **Leadership gating**: pruning only runs while the local instance is the primary
//! - **Contained failures**: nothing that happens inside a cycle stops the daemon
//! - **Prompt shutdown**: the interval sleep is raced against the shutdown token
//!
//! # Configuration
//!
//! ```text
//! walg-pruner --interval 86400 --retain 2 --after 2024-01-01 \
//!             --envdir /run/etc/wal-e.d/env --pg-sslmode require
//! ```

pub mod prune_loop;
pub use prune_loop::PruneScheduler;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Starting,
    WaitingForDb,
    Ready,
    CheckingRole,
    Pruning,
    Skipping,
    Sleeping,
    Terminating,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoopState::Starting => "starting",
            LoopState::WaitingForDb => "waiting_for_db",
            LoopState::Ready => "ready",
            LoopState::CheckingRole => "checking_role",
            LoopState::Pruning => "pruning",
            LoopState::Skipping => "skipping",
            LoopState::Sleeping => "sleeping",
            LoopState::Terminating => "terminating",
        };
        f.write_str(name)
    }
}

/// Result of one cycle, as seen by the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Pruned,
    /// Not the primary, or the role could not be determined.
    Skipped,
    /// Retries exhausted or an unexpected error inside the cycle.
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub cycles: u64,
    pub pruned: u64,
    pub skipped: u64,
    pub failed: u64,
    /// False when shutdown arrived before the database became ready.
    pub reached_ready: bool,
}

impl LoopSummary {
    fn record(&mut self, outcome: CycleOutcome) {
        self.cycles += 1;
        match outcome {
            CycleOutcome::Pruned => self.pruned += 1,
            CycleOutcome::Skipped => self.skipped += 1,
            CycleOutcome::Failed => self.failed += 1,
        }
    }
}
