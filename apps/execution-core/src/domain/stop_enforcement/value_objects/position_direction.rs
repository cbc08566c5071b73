//! Position direction.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::Side;

/// Position direction for stop calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionDirection {
    /// Long position (buy to open).
    Long,
    /// Short position (sell to open).
    Short,
}

impl PositionDirection {
    /// Side of the order that opened the position.
    #[must_use]
    pub const fn entry_side(&self) -> Side {
        match self {
            Self::Long => Side::Buy,
            Self::Short => Side::Sell,
        }
    }

    /// Side of the order that closes the position.
    #[must_use]
    pub const fn exit_side(&self) -> Side {
        self.entry_side().opposite()
    }

    /// Direction-signed points from `entry` to `price`.
    #[must_use]
    pub fn profit_points(&self, entry: Decimal, price: Decimal) -> Decimal {
        match self {
            Self::Long => price - entry,
            Self::Short => entry - price,
        }
    }

    /// Whether `price` has crossed `stop`.
    #[must_use]
    pub fn breaches(&self, price: Decimal, stop: Decimal) -> bool {
        match self {
            Self::Long => price <= stop,
            Self::Short => price >= stop,
        }
    }

    /// Whichever of `a` and `b` is more favourable to the position.
    #[must_use]
    pub fn better(&self, a: Decimal, b: Decimal) -> Decimal {
        match self {
            Self::Long => a.max(b),
            Self::Short => a.min(b),
        }
    }
}

impl From<Side> for PositionDirection {
    fn from(side: Side) -> Self {
        match side {
            Side::Buy => Self::Long,
            Side::Sell => Self::Short,
        }
    }
}

impl fmt::Display for PositionDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long => write!(f, "LONG"),
            Self::Short => write!(f, "SHORT"),
        }
    }
}
