//! Multi-lot entry tracker.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::lot_tracking::errors::LotError;
use crate::domain::lot_tracking::value_objects::{
    CancelOutcome, FillOutcome, FillRecord, LotTrackerConfig, RetryRequest, TrackerStatus,
};
use crate::domain::shared::{ProductCode, Side, Timestamp, TrackerId};

/// Fill/cancel accounting for one logical entry of `target_qty` lots.
///
/// Invariant: `filled_qty + cancelled_qty <= target_qty`. `cancelled_qty`
/// counts cancelled quantity that has not been handed back out as a retry;
/// the cumulative figure is `total_cancelled`.
#[derive(Debug, Clone, Serialize)]
pub struct LotTracker {
    id: TrackerId,
    product: ProductCode,
    side: Side,
    target_qty: u32,
    lots_per_group: u32,
    submitted_qty: u32,
    filled_qty: u32,
    cancelled_qty: u32,
    total_cancelled: u32,
    deferred_qty: u32,
    retry_count: u32,
    retry_in_flight: bool,
    last_retry_at: Option<Timestamp>,
    last_reference_price: Option<Decimal>,
    failure_reported: bool,
    completion_reported: bool,
    fills: Vec<FillRecord>,
    created_at: Timestamp,
    #[serde(skip)]
    config: LotTrackerConfig,
}

impl LotTracker {
    /// Create a tracker.
    ///
    /// # Errors
    ///
    /// Returns [`LotError::InvalidQuantity`] if `target_qty` or
    /// `lots_per_group` is zero.
    pub fn new(
        id: TrackerId,
        product: ProductCode,
        side: Side,
        target_qty: u32,
        lots_per_group: u32,
        config: LotTrackerConfig,
    ) -> Result<Self, LotError> {
        if target_qty == 0 {
            return Err(LotError::InvalidQuantity {
                field: "target_qty",
                value: target_qty,
            });
        }
        if lots_per_group == 0 {
            return Err(LotError::InvalidQuantity {
                field: "lots_per_group",
                value: lots_per_group,
            });
        }
        Ok(Self {
            id,
            product,
            side,
            target_qty,
            lots_per_group,
            submitted_qty: 0,
            filled_qty: 0,
            cancelled_qty: 0,
            total_cancelled: 0,
            deferred_qty: 0,
            retry_count: 0,
            retry_in_flight: false,
            last_retry_at: None,
            last_reference_price: None,
            failure_reported: false,
            completion_reported: false,
            fills: Vec::new(),
            created_at: Timestamp::now(),
            config,
        })
    }

    /// Override the creation time.
    #[must_use]
    pub const fn created_at_time(mut self, at: Timestamp) -> Self {
        self.created_at = at;
        self
    }

    /// Tracker id.
    #[must_use]
    pub const fn id(&self) -> &TrackerId {
        &self.id
    }

    /// Product.
    #[must_use]
    pub const fn product(&self) -> &ProductCode {
        &self.product
    }

    /// Entry side.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Target quantity.
    #[must_use]
    pub const fn target_qty(&self) -> u32 {
        self.target_qty
    }

    /// Lots per display group.
    #[must_use]
    pub const fn lots_per_group(&self) -> u32 {
        self.lots_per_group
    }

    /// Quantity sent to market so far.
    #[must_use]
    pub const fn submitted_qty(&self) -> u32 {
        self.submitted_qty
    }

    /// Quantity filled.
    #[must_use]
    pub const fn filled_qty(&self) -> u32 {
        self.filled_qty
    }

    /// Cancelled quantity not yet handed out as a retry.
    #[must_use]
    pub const fn cancelled_qty(&self) -> u32 {
        self.cancelled_qty
    }

    /// Cumulative cancelled quantity.
    #[must_use]
    pub const fn total_cancelled(&self) -> u32 {
        self.total_cancelled
    }

    /// Quantity waiting for the cool-down before it can be retried.
    #[must_use]
    pub const fn deferred_qty(&self) -> u32 {
        self.deferred_qty
    }

    /// `target - filled`.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.target_qty.saturating_sub(self.filled_qty)
    }

    /// Retries emitted so far.
    #[must_use]
    pub const fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// True between a retry request and the matching `update_submitted`.
    #[must_use]
    pub const fn retry_in_flight(&self) -> bool {
        self.retry_in_flight
    }

    /// Individual lot fills.
    #[must_use]
    pub fn fills(&self) -> &[FillRecord] {
        &self.fills
    }

    /// Creation time.
    #[must_use]
    pub const fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Whether every permitted retry has been handed out.
    #[must_use]
    pub const fn retries_exhausted(&self) -> bool {
        self.total_cancelled > 0 && self.retry_count >= self.config.max_retries
    }

    /// Derived status.
    ///
    /// FAILED as soon as the retry budget is spent with lots remaining. The
    /// last retry order may still fill, which moves the tracker to COMPLETED.
    #[must_use]
    pub const fn status(&self) -> TrackerStatus {
        if self.filled_qty >= self.target_qty {
            TrackerStatus::Completed
        } else if self.retries_exhausted() {
            TrackerStatus::Failed
        } else if self.filled_qty > 0 {
            TrackerStatus::Partial
        } else {
            TrackerStatus::Pending
        }
    }

    /// Shorthand for `status().is_terminal()`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    /// Volume-weighted average fill price.
    #[must_use]
    pub fn average_price(&self) -> Decimal {
        if self.fills.is_empty() {
            return Decimal::ZERO;
        }
        let total: Decimal = self.fills.iter().map(|f| f.price).sum();
        total / Decimal::from(self.fills.len() as u64)
    }

    /// Record quantity sent to market. Clears the retry-in-flight flag.
    pub fn update_submitted(&mut self, qty: u32) {
        self.submitted_qty = self.submitted_qty.saturating_add(qty);
        self.retry_in_flight = false;
    }

    /// Apply a fill of `qty` lots at `price`.
    ///
    /// The accepted quantity is clamped to the remainder; one [`FillRecord`]
    /// is produced per accepted lot. A FAILED tracker still takes fills from
    /// its outstanding retry order.
    pub fn process_fill(&mut self, price: Decimal, qty: u32, at: Timestamp) -> FillOutcome {
        if self.status() == TrackerStatus::Completed {
            tracing::warn!(tracker_id = %self.id, qty, "Fill for completed lot tracker ignored");
            return FillOutcome {
                overflow: qty,
                ..FillOutcome::default()
            };
        }

        let accepted = qty.min(self.remaining());
        let overflow = qty - accepted;
        if overflow > 0 {
            tracing::warn!(
                tracker_id = %self.id,
                reported = qty,
                accepted,
                "Fill exceeds remaining quantity; clamped"
            );
        }

        let mut records = Vec::with_capacity(accepted as usize);
        for _ in 0..accepted {
            self.filled_qty += 1;
            let (rule_index, group_number, position_in_group) =
                FillRecord::layout(self.filled_qty, self.lots_per_group);
            let record = FillRecord {
                tracker_id: self.id.clone(),
                product: self.product.clone(),
                side: self.side,
                price,
                filled_at: at,
                lot_number: self.filled_qty,
                rule_index,
                group_number,
                position_in_group,
            };
            self.fills.push(record.clone());
            records.push(record);
        }

        // A late fill for quantity already counted as cancelled takes its place.
        self.cancelled_qty = self.cancelled_qty.min(self.remaining());
        self.deferred_qty = self.deferred_qty.min(self.cancelled_qty);

        let completed = self.filled_qty >= self.target_qty && !self.completion_reported;
        if completed {
            self.completion_reported = true;
        }
        debug_assert!(self.verify_invariant());

        FillOutcome {
            accepted,
            overflow,
            records,
            completed,
        }
    }

    /// Apply a cancel of `qty` lots.
    ///
    /// Emits a retry for `min(cancelled, remaining)` when retries remain and
    /// the cool-down has elapsed, otherwise defers it. The cancel that spends
    /// the last retry also reports the tracker as failed.
    pub fn process_cancel(
        &mut self,
        price: Option<Decimal>,
        qty: u32,
        at: Timestamp,
    ) -> CancelOutcome {
        if self.is_terminal() {
            tracing::debug!(tracker_id = %self.id, qty, "Cancel for terminal lot tracker ignored");
            return CancelOutcome::default();
        }

        let open = self
            .target_qty
            .saturating_sub(self.filled_qty + self.cancelled_qty);
        let accepted = qty.min(open);
        self.cancelled_qty += accepted;
        self.total_cancelled += accepted;
        if price.is_some() {
            self.last_reference_price = price;
        }

        let mut outcome = CancelOutcome {
            accepted,
            ..CancelOutcome::default()
        };
        if self.remaining() == 0 || self.cancelled_qty == 0 {
            return outcome;
        }

        if self.retries_exhausted() {
            self.deferred_qty = 0;
            outcome.failed = self.take_failure();
            return outcome;
        }

        if self.cooldown_elapsed(at) {
            outcome.retry = Some(self.emit_retry(at));
            outcome.failed = self.take_failure();
        } else {
            self.deferred_qty = self.cancelled_qty;
            outcome.deferred = true;
            tracing::debug!(
                tracker_id = %self.id,
                deferred = self.deferred_qty,
                "Retry suppressed by cool-down"
            );
        }
        outcome
    }

    /// Emit a deferred retry once the cool-down has elapsed.
    pub fn poll_deferred_retry(&mut self, at: Timestamp) -> Option<RetryRequest> {
        if self.deferred_qty == 0
            || self.is_terminal()
            || self.retry_count >= self.config.max_retries
            || !self.cooldown_elapsed(at)
        {
            return None;
        }
        Some(self.emit_retry(at))
    }

    /// True once, the first time the tracker is seen FAILED.
    pub fn take_failure(&mut self) -> bool {
        if self.failure_reported || self.status() != TrackerStatus::Failed {
            return false;
        }
        self.failure_reported = true;
        tracing::warn!(
            tracker_id = %self.id,
            retries = self.retry_count,
            remaining = self.remaining(),
            "Lot tracker exhausted its retries"
        );
        true
    }

    fn cooldown_elapsed(&self, at: Timestamp) -> bool {
        self.last_retry_at
            .is_none_or(|last| at.duration_since(last) >= self.config.retry_cooldown)
    }

    fn emit_retry(&mut self, at: Timestamp) -> RetryRequest {
        let quantity = self.cancelled_qty.min(self.remaining());
        self.cancelled_qty -= quantity;
        self.deferred_qty = 0;
        self.retry_count += 1;
        self.retry_in_flight = true;
        self.last_retry_at = Some(at);
        tracing::info!(
            tracker_id = %self.id,
            attempt = self.retry_count,
            quantity,
            "Requesting retry for cancelled lots"
        );
        RetryRequest {
            tracker_id: self.id.clone(),
            product: self.product.clone(),
            side: self.side,
            quantity,
            reference_price: self.last_reference_price,
            attempt: self.retry_count,
        }
    }

    /// `filled + cancelled <= target`.
    #[must_use]
    pub const fn verify_invariant(&self) -> bool {
        self.filled_qty + self.cancelled_qty <= self.target_qty
    }
}
