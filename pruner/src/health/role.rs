use crate::database::DatabaseProbe;
use std::sync::Arc;
use tracing::{debug, error};

/// Answers "may this node prune?".
///
/// Every failure mode collapses to `false`: a connection error, a query
/// error and a genuine replica are indistinguishable to the caller. This is
/// intentional. Pruning from a replica, or from a node whose role could not
/// be established, must never happen, while skipping one cycle on a healthy
/// primary costs nothing but a day of extra retention.
pub struct RoleChecker<P> {
    probe: Arc<P>,
}

impl<P: DatabaseProbe> RoleChecker<P> {
    pub fn new(probe: Arc<P>) -> Self {
        Self { probe }
    }

    pub async fn is_primary(&self) -> bool {
        match self.probe.is_primary().await {
            Ok(primary) => {
                debug!("Role check: primary = {}", primary);
                primary
            }
            Err(e) => {
                error!("Failed to determine database role, treating as replica: {}", e);
                false
            }
        }
    }
}
