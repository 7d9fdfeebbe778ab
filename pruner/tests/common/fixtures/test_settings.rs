//! Cycle settings used across tests

use std::time::Duration;
use walg_pruner::CycleSettings;

/// One hour between cycles; tests run with a paused clock, so long waits
/// complete instantly while still being observable through `Instant`.
pub const TEST_INTERVAL: Duration = Duration::from_secs(3600);

pub fn cycle_settings(retain: u32, after: Option<&str>) -> CycleSettings {
    CycleSettings {
        interval: TEST_INTERVAL,
        retain,
        after: after.map(str::to_string),
        ..CycleSettings::default()
    }
}
