//! This module provides reusable test utilities:
//! - A scripted database probe (readiness and role answers)
//! - A recording command runner standing in for WAL-G
//! - Cycle settings tuned for paused-clock tests
//! - A log capture for asserting on emitted log lines

// Allow unused code in test fixtures - not every test binary uses every helper
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod log_capture;
pub mod recording_runner;
pub mod scripted_probe;
pub mod test_settings;

pub use log_capture::LogCapture;
pub use recording_runner::{Invocation, RecordingRunner};
pub use scripted_probe::ScriptedProbe;
pub use test_settings::*;
