//! Lot tracker configuration.

use chrono::Duration;

/// Retry policy shared by all trackers of a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LotTrackerConfig {
    /// Maximum cancel-driven retries per tracker.
    pub max_retries: u32,
    /// Minimum time between two retries of the same tracker.
    pub retry_cooldown: Duration,
}

impl LotTrackerConfig {
    /// Default retry cap.
    pub const DEFAULT_MAX_RETRIES: u32 = 5;
    /// Default cool-down in milliseconds.
    pub const DEFAULT_COOLDOWN_MS: i64 = 1_000;
}

impl Default for LotTrackerConfig {
    fn default() -> Self {
        Self {
            max_retries: Self::DEFAULT_MAX_RETRIES,
            retry_cooldown: Duration::milliseconds(Self::DEFAULT_COOLDOWN_MS),
        }
    }
}
