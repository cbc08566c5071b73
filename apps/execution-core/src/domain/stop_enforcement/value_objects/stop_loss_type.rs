//! Stop-loss type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which rule currently owns a position's stop price.
///
/// `Initial -> Protective -> Trailing`, with `Initial -> Trailing` allowed
/// directly. Nothing moves back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StopLossType {
    /// Opening-range boundary set at entry.
    Initial,
    /// Derived from a sibling lot's realized profit.
    Protective,
    /// Trailing stop is active.
    Trailing,
}

impl StopLossType {
    /// Whether `self -> next` is a legal transition. Re-applying the same
    /// type is allowed so protective stops can be recomputed.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Initial, _)
                | (Self::Protective, Self::Protective | Self::Trailing)
                | (Self::Trailing, Self::Trailing)
        )
    }
}

impl fmt::Display for StopLossType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Initial => "INITIAL",
            Self::Protective => "PROTECTIVE",
            Self::Trailing => "TRAILING",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(StopLossType::Initial, StopLossType::Protective, true)]
    #[test_case(StopLossType::Initial, StopLossType::Trailing, true)]
    #[test_case(StopLossType::Protective, StopLossType::Trailing, true)]
    #[test_case(StopLossType::Protective, StopLossType::Protective, true)]
    #[test_case(StopLossType::Trailing, StopLossType::Protective, false)]
    #[test_case(StopLossType::Trailing, StopLossType::Initial, false)]
    #[test_case(StopLossType::Protective, StopLossType::Initial, false)]
    fn transitions(from: StopLossType, to: StopLossType, allowed: bool) {
        assert_eq!(from.can_transition_to(to), allowed);
    }
}
