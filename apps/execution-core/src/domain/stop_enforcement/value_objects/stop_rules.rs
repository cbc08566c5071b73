//! Per-lot stop rules.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::domain::stop_enforcement::errors::StopEnforcementError;

/// Trailing and protective parameters for one lot index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotStopRule {
    /// Profit in points at which the trailing stop arms.
    pub activation_points: Decimal,
    /// Retracement from the peak, as a ratio of the peak, that exits.
    pub pullback_ratio: Decimal,
    /// Multiplier applied to a sibling's realized profit; `None` opts out of
    /// protective stops.
    pub protective_multiplier: Option<Decimal>,
}

impl LotStopRule {
    /// Create a rule without a protective multiplier.
    #[must_use]
    pub const fn new(activation_points: Decimal, pullback_ratio: Decimal) -> Self {
        Self {
            activation_points,
            pullback_ratio,
            protective_multiplier: None,
        }
    }

    /// Set the protective multiplier.
    #[must_use]
    pub const fn with_protective_multiplier(mut self, multiplier: Decimal) -> Self {
        self.protective_multiplier = Some(multiplier);
        self
    }
}

/// Ordered lot rules. Lot indexes past the end reuse the last rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopRules {
    rules: Vec<LotStopRule>,
}

impl StopRules {
    /// Build and validate a rule table.
    ///
    /// # Errors
    ///
    /// Returns [`StopEnforcementError::InvalidRules`] for an empty table, a
    /// negative activation threshold, a pullback ratio outside `(0, 1)`, or a
    /// non-positive multiplier.
    pub fn new(rules: Vec<LotStopRule>) -> Result<Self, StopEnforcementError> {
        if rules.is_empty() {
            return Err(invalid("at least one lot rule is required"));
        }
        for (index, rule) in rules.iter().enumerate() {
            if rule.activation_points < Decimal::ZERO {
                return Err(invalid(format!(
                    "lot {index}: activation_points must be >= 0"
                )));
            }
            if rule.pullback_ratio <= Decimal::ZERO || rule.pullback_ratio >= Decimal::ONE {
                return Err(invalid(format!(
                    "lot {index}: pullback_ratio must be in (0, 1)"
                )));
            }
            if rule
                .protective_multiplier
                .is_some_and(|m| m <= Decimal::ZERO)
            {
                return Err(invalid(format!(
                    "lot {index}: protective_multiplier must be > 0"
                )));
            }
        }
        Ok(Self { rules })
    }

    /// Rule for a 0-based lot index.
    #[must_use]
    pub fn rule_for(&self, lot_index: u32) -> &LotStopRule {
        let last = self.rules.len() - 1;
        let index = usize::try_from(lot_index).map_or(last, |i| i.min(last));
        &self.rules[index]
    }

    /// All configured rules.
    #[must_use]
    pub fn rules(&self) -> &[LotStopRule] {
        &self.rules
    }
}

impl Default for StopRules {
    fn default() -> Self {
        Self {
            rules: vec![
                LotStopRule::new(dec!(15), dec!(0.20)),
                LotStopRule::new(dec!(40), dec!(0.20)).with_protective_multiplier(dec!(2.0)),
                LotStopRule::new(dec!(65), dec!(0.20)).with_protective_multiplier(dec!(2.0)),
            ],
        }
    }
}

fn invalid(message: impl Into<String>) -> StopEnforcementError {
    StopEnforcementError::InvalidRules {
        message: message.into(),
    }
}
