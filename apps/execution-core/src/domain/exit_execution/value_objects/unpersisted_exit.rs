//! Record of a confirmed exit the store did not accept.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ExitReason;
use crate::domain::shared::{GroupId, OrderId, PositionId, Timestamp};

/// Enough to replay `mark_exited` by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnpersistedExit {
    /// Position.
    pub position_id: PositionId,
    /// Strategy group.
    pub group_id: GroupId,
    /// Exit order.
    pub order_id: OrderId,
    /// Exit reason.
    pub reason: ExitReason,
    /// Exit price.
    pub exit_price: Decimal,
    /// Realized P&L in points.
    pub realized_pnl: Decimal,
    /// Store error.
    pub error: String,
    /// When the failure was observed.
    pub recorded_at: Timestamp,
}
