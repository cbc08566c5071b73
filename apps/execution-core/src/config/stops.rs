//! Per-lot stop rule configuration.

use serde::{Deserialize, Serialize};

use crate::domain::stop_enforcement::{LotStopRule, StopEnforcementError, StopRules};

/// Stop rules keyed by lot index.
///
/// ```yaml
/// stops:
///   lot_rules:
///     - { activation_points: 15, pullback_ratio: 0.20 }
///     - { activation_points: 40, pullback_ratio: 0.20, protective_multiplier: 2.0 }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopsConfig {
    /// One rule per lot index; the last rule repeats.
    #[serde(default = "default_lot_rules")]
    pub lot_rules: Vec<LotStopRule>,
}

impl Default for StopsConfig {
    fn default() -> Self {
        Self {
            lot_rules: default_lot_rules(),
        }
    }
}

impl StopsConfig {
    /// Build the validated rule table.
    ///
    /// # Errors
    ///
    /// Returns [`StopEnforcementError::InvalidRules`] when a rule is out of range.
    pub fn to_stop_rules(&self) -> Result<StopRules, StopEnforcementError> {
        StopRules::new(self.lot_rules.clone())
    }
}

fn default_lot_rules() -> Vec<LotStopRule> {
    StopRules::default().rules().to_vec()
}
