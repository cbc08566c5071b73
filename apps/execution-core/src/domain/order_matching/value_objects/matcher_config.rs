//! Matcher configuration.

use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::ProductAliases;

/// How fill reports are matched to pending orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MatchMode {
    /// Oldest pending order with equal product and quantity; price ignored.
    #[default]
    TimeOrder,
    /// Additionally require `|report price - order price| <= tolerance`.
    PriceTolerance {
        /// Allowed price difference in price units.
        tolerance: Decimal,
        /// Retry with pure time order when no order is within tolerance.
        fallback_to_time_order: bool,
    },
}

/// Report matcher configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatcherConfig {
    /// Fill matching mode.
    pub mode: MatchMode,
    /// Pending orders older than this are evicted before each match.
    pub window: Duration,
    /// Product alias table used for normalization.
    pub aliases: ProductAliases,
}

impl MatcherConfig {
    /// Default eviction window (30 seconds).
    pub const DEFAULT_WINDOW_SECS: i64 = 30;

    /// Use the given mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Use the given eviction window.
    #[must_use]
    pub const fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            mode: MatchMode::TimeOrder,
            window: Duration::seconds(Self::DEFAULT_WINDOW_SECS),
            aliases: ProductAliases::default(),
        }
    }
}
