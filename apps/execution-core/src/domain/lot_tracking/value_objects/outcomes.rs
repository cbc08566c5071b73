//! Results of applying fills and cancels to a tracker.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::FillRecord;
use crate::domain::shared::{ProductCode, Side, TrackerId};

/// Request to re-submit a cancelled remainder.
///
/// Retries are never sent automatically; the caller submits a new order and
/// reports it back with `update_submitted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryRequest {
    /// Tracker to retry for.
    pub tracker_id: TrackerId,
    /// Product.
    pub product: ProductCode,
    /// Entry side.
    pub side: Side,
    /// Quantity to re-submit.
    pub quantity: u32,
    /// Reference price from the cancel report, when known.
    pub reference_price: Option<Decimal>,
    /// 1-based retry attempt.
    pub attempt: u32,
}

/// Result of [`LotTracker::process_fill`](crate::domain::lot_tracking::LotTracker::process_fill).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillOutcome {
    /// Quantity accepted after clamping to the remainder.
    pub accepted: u32,
    /// Quantity dropped because it exceeded the remainder.
    pub overflow: u32,
    /// One record per accepted lot.
    pub records: Vec<FillRecord>,
    /// True exactly once: on the fill that reached the target.
    pub completed: bool,
}

/// Result of [`LotTracker::process_cancel`](crate::domain::lot_tracking::LotTracker::process_cancel).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CancelOutcome {
    /// Cancelled quantity counted against the target.
    pub accepted: u32,
    /// Retry to submit, if one is due now.
    pub retry: Option<RetryRequest>,
    /// Retry postponed by the cool-down.
    pub deferred: bool,
    /// True when this cancel exhausted the retry budget.
    pub failed: bool,
}
