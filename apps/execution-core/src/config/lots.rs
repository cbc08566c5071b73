//! Lot tracking configuration.

use serde::{Deserialize, Serialize};

use crate::application::services::LotManagerConfig;
use crate::domain::lot_tracking::LotTrackerConfig;

/// Lot manager and tracker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotsConfig {
    /// Maximum cancel-driven retries per tracker.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Minimum time between retries of the same tracker.
    #[serde(default = "default_retry_cooldown_ms")]
    pub retry_cooldown_ms: u64,
    /// Trackers older than this are skipped by fallback routing.
    #[serde(default = "default_routing_window_secs")]
    pub routing_window_secs: u64,
    /// Terminal trackers older than this are dropped by cleanup.
    #[serde(default = "default_cleanup_age_secs")]
    pub cleanup_age_secs: u64,
}

impl Default for LotsConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_cooldown_ms: default_retry_cooldown_ms(),
            routing_window_secs: default_routing_window_secs(),
            cleanup_age_secs: default_cleanup_age_secs(),
        }
    }
}

impl LotsConfig {
    /// Convert to the lot manager's configuration.
    #[must_use]
    pub fn to_lot_manager_config(&self) -> LotManagerConfig {
        LotManagerConfig {
            tracker: LotTrackerConfig {
                max_retries: self.max_retries,
                retry_cooldown: chrono::Duration::milliseconds(
                    i64::try_from(self.retry_cooldown_ms).unwrap_or(i64::MAX),
                ),
            },
            routing_window: super::seconds(self.routing_window_secs),
            cleanup_age: super::seconds(self.cleanup_age_secs),
        }
    }
}

const fn default_max_retries() -> u32 {
    LotTrackerConfig::DEFAULT_MAX_RETRIES
}

const fn default_retry_cooldown_ms() -> u64 {
    1_000
}

const fn default_routing_window_secs() -> u64 {
    30
}

const fn default_cleanup_age_secs() -> u64 {
    3_600
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_domain_defaults() {
        assert_eq!(
            LotsConfig::default().to_lot_manager_config(),
            LotManagerConfig::default()
        );
    }

    #[test]
    fn cooldown_is_milliseconds() {
        let settings = LotsConfig {
            retry_cooldown_ms: 250,
            ..LotsConfig::default()
        };
        let config = settings.to_lot_manager_config();
        assert_eq!(
            config.tracker.retry_cooldown,
            chrono::Duration::milliseconds(250)
        );
    }
}
