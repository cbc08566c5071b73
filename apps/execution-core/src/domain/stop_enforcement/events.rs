//! Stop enforcement events delivered to registered listeners.

use rust_decimal::Decimal;
use serde::Serialize;

use super::value_objects::Trigger;
use crate::domain::shared::{GroupId, PositionId};

/// Event emitted by the position stop service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StopEvent {
    /// Trailing stop armed.
    TrailingActivated {
        /// Position.
        position_id: PositionId,
        /// Strategy group.
        group_id: GroupId,
        /// Price that armed it (also the first peak).
        price: Decimal,
    },
    /// An exit trigger fired. Emitted once per position.
    Triggered(Trigger),
    /// A sibling's stop moved after a profitable exit in its group.
    ProtectiveUpdated {
        /// Updated position.
        position_id: PositionId,
        /// Strategy group.
        group_id: GroupId,
        /// Lot whose exit produced the update.
        source_position_id: PositionId,
        /// Stop before the update.
        previous_stop: Decimal,
        /// Stop after the update.
        new_stop: Decimal,
    },
}
