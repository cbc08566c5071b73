//! Position snapshot as read from the position store.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{LotStopRule, PositionDirection, StopLossType};
use crate::domain::shared::{GroupId, PositionId, ProductCode, Timestamp};

/// Position lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionStatus {
    /// Open and monitored.
    Active,
    /// Closed.
    Exited,
}

impl fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Exited => write!(f, "EXITED"),
        }
    }
}

/// High/low of the opening range used to place the initial stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningRange {
    /// Range high.
    pub high: Decimal,
    /// Range low.
    pub low: Decimal,
}

impl OpeningRange {
    /// Create a range.
    #[must_use]
    pub const fn new(high: Decimal, low: Decimal) -> Self {
        Self { high, low }
    }

    /// Initial stop: the range low for longs, the range high for shorts.
    #[must_use]
    pub const fn initial_stop(&self, direction: PositionDirection) -> Decimal {
        match direction {
            PositionDirection::Long => self.low,
            PositionDirection::Short => self.high,
        }
    }
}

/// Copy of one position record. Never cached across evaluations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    /// Position ID.
    pub id: PositionId,
    /// Strategy group the lot belongs to.
    pub group_id: GroupId,
    /// 0-based lot index within the group.
    pub lot_index: u32,
    /// Product.
    pub product: ProductCode,
    /// Direction.
    pub direction: PositionDirection,
    /// Contracts held by this lot.
    pub quantity: u32,
    /// Entry price.
    pub entry_price: Decimal,
    /// Current stop price.
    pub stop_loss: Decimal,
    /// Rule owning the stop price.
    pub stop_type: StopLossType,
    /// True until the stop is moved off the opening-range boundary.
    pub is_initial_stop: bool,
    /// Trailing stop armed.
    pub trailing_activated: bool,
    /// Best price since activation.
    pub peak_price: Option<Decimal>,
    /// Profit in points that arms the trailing stop.
    pub trailing_activation_points: Decimal,
    /// Retracement ratio that exits once armed.
    pub trailing_pullback_ratio: Decimal,
    /// Protective multiplier; `None` opts out.
    pub protective_multiplier: Option<Decimal>,
    /// Realized P&L once exited.
    pub realized_pnl: Option<Decimal>,
    /// Exit price once exited.
    pub exit_price: Option<Decimal>,
    /// Status.
    pub status: PositionStatus,
    /// Entry time.
    pub opened_at: Timestamp,
}

impl PositionSnapshot {
    /// A freshly entered lot with its initial stop at the opening-range
    /// boundary.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        id: PositionId,
        group_id: GroupId,
        lot_index: u32,
        product: ProductCode,
        direction: PositionDirection,
        entry_price: Decimal,
        range: OpeningRange,
        rule: &LotStopRule,
    ) -> Self {
        Self {
            id,
            group_id,
            lot_index,
            product,
            direction,
            quantity: 1,
            entry_price,
            stop_loss: range.initial_stop(direction),
            stop_type: StopLossType::Initial,
            is_initial_stop: true,
            trailing_activated: false,
            peak_price: None,
            trailing_activation_points: rule.activation_points,
            trailing_pullback_ratio: rule.pullback_ratio,
            protective_multiplier: rule.protective_multiplier,
            realized_pnl: None,
            exit_price: None,
            status: PositionStatus::Active,
            opened_at: Timestamp::now(),
        }
    }

    /// Set the contract quantity.
    #[must_use]
    pub const fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Whether the position is still open.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == PositionStatus::Active
    }

    /// Direction-signed points at `price`.
    #[must_use]
    pub fn profit_points(&self, price: Decimal) -> Decimal {
        self.direction.profit_points(self.entry_price, price)
    }

    /// Realized P&L in points for an exit at `price`, scaled by quantity.
    #[must_use]
    pub fn realized_pnl_at(&self, price: Decimal) -> Decimal {
        self.profit_points(price) * Decimal::from(self.quantity)
    }
}
