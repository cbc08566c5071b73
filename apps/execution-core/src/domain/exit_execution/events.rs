//! Exit events delivered to registered listeners.

use rust_decimal::Decimal;
use serde::Serialize;

use super::value_objects::ExitReason;
use crate::domain::shared::{GroupId, OrderId, PositionId};

/// Event emitted by the exit executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExitEvent {
    /// The position was closed and recorded.
    Succeeded {
        /// Position.
        position_id: PositionId,
        /// Strategy group.
        group_id: GroupId,
        /// Exit reason.
        reason: ExitReason,
        /// Exit order.
        order_id: OrderId,
        /// Exit price.
        exit_price: Decimal,
        /// Realized P&L in points.
        realized_pnl: Decimal,
    },
    /// The exit attempt ended without closing the position.
    Failed {
        /// Position.
        position_id: PositionId,
        /// Exit reason.
        reason: ExitReason,
        /// What went wrong.
        error: String,
    },
}
