//! Database health gates of the prune loop: startup readiness and the
//! per-cycle primary role check.

pub mod readiness;
pub mod role;

pub use readiness::{severity_for_attempt, Readiness, ReadinessProber, Severity};
pub use role::RoleChecker;
