//! Exit triggers produced by stop evaluation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::StopLossType;
use crate::domain::shared::{GroupId, PositionId, Timestamp};

/// Retracement from the peak reached the pullback ratio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawdownTrigger {
    /// Position to exit.
    pub position_id: PositionId,
    /// Strategy group.
    pub group_id: GroupId,
    /// Tick price that triggered.
    pub price: Decimal,
    /// Peak the drawdown is measured from.
    pub peak_price: Decimal,
    /// `|peak - price| / peak`.
    pub drawdown_ratio: Decimal,
    /// When the trigger fired.
    pub triggered_at: Timestamp,
}

/// Price crossed the current stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopLossTrigger {
    /// Position to exit.
    pub position_id: PositionId,
    /// Strategy group.
    pub group_id: GroupId,
    /// Tick price that triggered.
    pub price: Decimal,
    /// Stop price that was crossed.
    pub stop_price: Decimal,
    /// Rule that owned the stop.
    pub stop_type: StopLossType,
    /// When the trigger fired.
    pub triggered_at: Timestamp,
}

/// A single exit request, consumed once by the exit executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    /// Trailing-stop drawdown.
    Drawdown(DrawdownTrigger),
    /// Hard stop breach.
    StopLoss(StopLossTrigger),
}

impl Trigger {
    /// Position to exit.
    #[must_use]
    pub const fn position_id(&self) -> &PositionId {
        match self {
            Self::Drawdown(t) => &t.position_id,
            Self::StopLoss(t) => &t.position_id,
        }
    }

    /// Strategy group.
    #[must_use]
    pub const fn group_id(&self) -> &GroupId {
        match self {
            Self::Drawdown(t) => &t.group_id,
            Self::StopLoss(t) => &t.group_id,
        }
    }

    /// Tick price that triggered.
    #[must_use]
    pub const fn price(&self) -> Decimal {
        match self {
            Self::Drawdown(t) => t.price,
            Self::StopLoss(t) => t.price,
        }
    }

    /// Peak for drawdowns, stop price for stop breaches.
    #[must_use]
    pub const fn reference_price(&self) -> Decimal {
        match self {
            Self::Drawdown(t) => t.peak_price,
            Self::StopLoss(t) => t.stop_price,
        }
    }

    /// Reason tag recorded with the exit.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::Drawdown(_) => "trailing_stop",
            Self::StopLoss(t) => match t.stop_type {
                StopLossType::Initial => "initial_stop",
                StopLossType::Protective => "protective_stop",
                StopLossType::Trailing => "trailing_stop",
            },
        }
    }

    /// Short kind label for logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Drawdown(_) => "drawdown",
            Self::StopLoss(_) => "stop_loss",
        }
    }
}
