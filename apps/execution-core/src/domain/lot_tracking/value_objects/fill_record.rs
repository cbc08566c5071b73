//! Per-lot fill record.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{ProductCode, Side, Timestamp, TrackerId};

/// One filled lot, annotated with its position in the entry.
///
/// Lots are numbered 1.. across the tracker. With `lots_per_group = 3`,
/// lot 4 is `group_number = 2`, `position_in_group = 1`, `rule_index = 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillRecord {
    /// Owning tracker.
    pub tracker_id: TrackerId,
    /// Product.
    pub product: ProductCode,
    /// Entry side.
    pub side: Side,
    /// Fill price.
    pub price: Decimal,
    /// Fill time.
    pub filled_at: Timestamp,
    /// 1-based lot number across the tracker.
    pub lot_number: u32,
    /// 0-based index into the per-lot stop rules.
    pub rule_index: u32,
    /// 1-based display group.
    pub group_number: u32,
    /// 1-based position within the display group.
    pub position_in_group: u32,
}

impl FillRecord {
    /// Derive `(rule_index, group_number, position_in_group)` for a lot.
    #[must_use]
    pub const fn layout(lot_number: u32, lots_per_group: u32) -> (u32, u32, u32) {
        let per_group = if lots_per_group == 0 { 1 } else { lots_per_group };
        let zero_based = lot_number.saturating_sub(1);
        let rule_index = zero_based % per_group;
        (rule_index, zero_based / per_group + 1, rule_index + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_wraps_by_group() {
        assert_eq!(FillRecord::layout(1, 3), (0, 1, 1));
        assert_eq!(FillRecord::layout(3, 3), (2, 1, 3));
        assert_eq!(FillRecord::layout(4, 3), (0, 2, 1));
        assert_eq!(FillRecord::layout(7, 3), (0, 3, 1));
    }

    #[test]
    fn layout_treats_zero_group_size_as_one() {
        assert_eq!(FillRecord::layout(2, 0), (0, 2, 1));
    }
}
