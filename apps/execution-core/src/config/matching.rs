//! Report matching configuration.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::default_true;
use crate::domain::order_matching::{MatchMode, MatcherConfig};
use crate::domain::shared::ProductAliases;

/// Report matcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Fill matching mode: `time_order` or `price_tolerance`.
    #[serde(default = "default_mode")]
    pub mode: String,
    /// Allowed price difference in `price_tolerance` mode.
    #[serde(default)]
    pub price_tolerance: Decimal,
    /// Retry with pure time order when nothing is within tolerance.
    #[serde(default = "default_true")]
    pub fallback_to_time_order: bool,
    /// Pending orders older than this many seconds are evicted.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    /// Contract root to generic product code.
    #[serde(default = "default_product_aliases")]
    pub product_aliases: BTreeMap<String, String>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            price_tolerance: Decimal::ZERO,
            fallback_to_time_order: true,
            window_secs: default_window_secs(),
            product_aliases: default_product_aliases(),
        }
    }
}

impl MatchingConfig {
    /// Product alias table.
    #[must_use]
    pub fn aliases(&self) -> ProductAliases {
        ProductAliases::new(self.product_aliases.clone())
    }

    /// Convert to the matcher's configuration.
    #[must_use]
    pub fn to_matcher_config(&self) -> MatcherConfig {
        let mode = match self.mode.to_lowercase().as_str() {
            "price_tolerance" => MatchMode::PriceTolerance {
                tolerance: self.price_tolerance,
                fallback_to_time_order: self.fallback_to_time_order,
            },
            _ => MatchMode::TimeOrder,
        };

        MatcherConfig {
            mode,
            window: super::seconds(self.window_secs),
            aliases: self.aliases(),
        }
    }
}

fn default_mode() -> String {
    "time_order".to_string()
}

const fn default_window_secs() -> u64 {
    30
}

fn default_product_aliases() -> BTreeMap<String, String> {
    [("TX", "TXF"), ("MTX", "MXF"), ("TM", "TMF")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
