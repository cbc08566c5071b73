//! Lot tracking events delivered to registered listeners.

use rust_decimal::Decimal;
use serde::Serialize;

use super::value_objects::{FillRecord, RetryRequest};
use crate::domain::shared::TrackerId;

/// Event emitted by the lot manager after a tracker changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LotEvent {
    /// One lot was filled.
    Filled(FillRecord),
    /// A cancelled remainder should be re-submitted by the caller.
    RetryRequested(RetryRequest),
    /// The tracker reached its target quantity. Fired once per tracker.
    Completed {
        /// Tracker.
        tracker_id: TrackerId,
        /// Filled quantity (equals the target).
        filled_qty: u32,
        /// Volume-weighted average fill price.
        average_price: Decimal,
    },
    /// Retries were exhausted with quantity still unfilled.
    Failed {
        /// Tracker.
        tracker_id: TrackerId,
        /// Filled quantity.
        filled_qty: u32,
        /// Target quantity.
        target_qty: u32,
        /// Retries used.
        retry_count: u32,
    },
}
