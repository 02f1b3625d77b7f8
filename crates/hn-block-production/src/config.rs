//! Configuration types for block production.

use std::time::Duration;

/// Runtime configuration for the production scheduler.
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Wall-clock interval between pulses.
    pub tick_interval: Duration,

    /// Consecutive empty blocks tolerated before entering the
    /// `PausedForEmpty` overlay.
    pub max_empty_blocks_before_pause: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(3),
            max_empty_blocks_before_pause: 100,
        }
    }
}
