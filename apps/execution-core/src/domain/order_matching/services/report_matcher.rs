//! FIFO report matcher.
//!
//! Resolves each broker report to the oldest compatible pending order.
//! Oldest-first is a correctness rule: nothing else links a report to the
//! order that caused it.

use std::collections::VecDeque;

use chrono::Duration;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::domain::order_matching::value_objects::{
    BrokerReport, MatchMode, MatchOutcome, MatchedBy, MatcherConfig, MatcherStats, OrderOwner,
    PendingOrder, PendingOrderStatus, ReportKind,
};
use crate::domain::shared::{OrderId, ProductAliases, Timestamp};
use crate::observability;

#[derive(Debug, Default)]
struct MatcherState {
    /// Pending orders sorted by `submitted_at`, oldest first.
    queue: VecDeque<PendingOrder>,
    registered: u64,
    matched_by_time_order: u64,
    matched_by_price: u64,
    cancelled: u64,
    expired: u64,
    unmatched: u64,
}

impl MatcherState {
    fn evict_expired(&mut self, window: Duration, now: Timestamp) -> usize {
        let before = self.queue.len();
        self.queue
            .retain(|order| !order.submitted_at.is_older_than(window, now));
        let evicted = before - self.queue.len();
        if evicted > 0 {
            self.expired += evicted as u64;
            tracing::debug!(evicted, "Evicted expired pending orders");
            observability::record_orders_expired(evicted as u64);
        }
        evicted
    }

    fn take(&mut self, index: usize, status: PendingOrderStatus) -> Option<PendingOrder> {
        let mut order = self.queue.remove(index)?;
        order.status = status;
        Some(order)
    }
}

/// Thread-safe FIFO matcher for broker reports.
///
/// The pending-order queue is guarded by a single lock that is held only for
/// the duration of one queue operation.
#[derive(Debug)]
pub struct ReportMatcher {
    config: MatcherConfig,
    state: Mutex<MatcherState>,
}

impl Default for ReportMatcher {
    fn default() -> Self {
        Self::new(MatcherConfig::default())
    }
}

impl ReportMatcher {
    /// Create a matcher.
    #[must_use]
    pub fn new(config: MatcherConfig) -> Self {
        Self {
            config,
            state: Mutex::new(MatcherState::default()),
        }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Enqueue a pending order in submission-time order.
    pub fn register(&self, mut order: PendingOrder) -> OrderId {
        order.status = PendingOrderStatus::Pending;
        let id = order.id.clone();
        let mut state = self.state.lock();
        // Equal timestamps keep registration order.
        let at = state
            .queue
            .partition_point(|o| o.submitted_at <= order.submitted_at);
        tracing::debug!(
            order_id = %order.id,
            product = %order.product,
            side = %order.side,
            quantity = order.quantity,
            "Registered pending order"
        );
        state.queue.insert(at, order);
        state.registered += 1;
        id
    }

    /// Drop a pending order without resolving it (e.g. the submission failed).
    pub fn remove(&self, order_id: &OrderId) -> Option<PendingOrder> {
        let mut state = self.state.lock();
        let index = state.queue.iter().position(|o| &o.id == order_id)?;
        state.queue.remove(index)
    }

    /// Drop every pending order belonging to `owner`; returns how many.
    pub fn remove_owned(&self, owner: &OrderOwner) -> usize {
        let mut state = self.state.lock();
        let before = state.queue.len();
        state.queue.retain(|o| &o.owner != owner);
        before - state.queue.len()
    }

    /// Match a report against the pending queue using the current time.
    pub fn match_report(&self, report: &BrokerReport) -> MatchOutcome {
        self.match_report_at(report, Timestamp::now())
    }

    /// Match a report as of `now`.
    ///
    /// Expired orders are evicted first. `New` and unknown report kinds never
    /// match.
    pub fn match_report_at(&self, report: &BrokerReport, now: Timestamp) -> MatchOutcome {
        let aliases = &self.config.aliases;
        let mut state = self.state.lock();
        state.evict_expired(self.config.window, now);

        let resolved = match report.kind {
            ReportKind::Cancel => find_cancel(&state.queue, report, aliases)
                .and_then(|i| state.take(i, PendingOrderStatus::Cancelled))
                .map(|order| (order, MatchedBy::Product)),
            ReportKind::Fill => {
                find_fill(&state.queue, report, self.config.mode, aliases).and_then(
                    |(i, matched_by)| {
                        state
                            .take(i, PendingOrderStatus::Matched)
                            .map(|order| (order, matched_by))
                    },
                )
            }
            ReportKind::New | ReportKind::Other(_) => return MatchOutcome::NoMatch,
        };

        match resolved {
            Some((order, matched_by)) => {
                match matched_by {
                    MatchedBy::Product => state.cancelled += 1,
                    MatchedBy::TimeOrder => state.matched_by_time_order += 1,
                    MatchedBy::PriceTolerance => state.matched_by_price += 1,
                }
                drop(state);
                tracing::debug!(
                    order_id = %order.id,
                    product = %report.product,
                    matched_by = ?matched_by,
                    "Report matched pending order"
                );
                observability::record_report_matched(matched_by);
                MatchOutcome::Matched { order, matched_by }
            }
            None => {
                state.unmatched += 1;
                let pending = state.queue.len();
                drop(state);
                tracing::warn!(
                    kind = ?report.kind,
                    product = %report.product,
                    price = ?report.price,
                    quantity = ?report.quantity,
                    pending,
                    "No pending order matches broker report; dropping"
                );
                observability::record_report_unmatched();
                MatchOutcome::NoMatch
            }
        }
    }

    /// Evict expired orders as of `now`; returns how many were dropped.
    pub fn evict_expired_at(&self, now: Timestamp) -> usize {
        self.state.lock().evict_expired(self.config.window, now)
    }

    /// Number of orders currently pending.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Copy of the pending queue, oldest first.
    #[must_use]
    pub fn pending_orders(&self) -> Vec<PendingOrder> {
        self.state.lock().queue.iter().cloned().collect()
    }

    /// Snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> MatcherStats {
        let state = self.state.lock();
        MatcherStats {
            registered: state.registered,
            matched: state.matched_by_time_order + state.matched_by_price,
            matched_by_time_order: state.matched_by_time_order,
            matched_by_price: state.matched_by_price,
            cancelled: state.cancelled,
            expired: state.expired,
            unmatched: state.unmatched,
            pending: state.queue.len(),
            mode: self.config.mode,
        }
    }
}

fn side_compatible(order: &PendingOrder, report: &BrokerReport) -> bool {
    report.side.is_none_or(|side| side == order.side)
}

fn find_cancel(
    queue: &VecDeque<PendingOrder>,
    report: &BrokerReport,
    aliases: &ProductAliases,
) -> Option<usize> {
    queue.iter().position(|order| {
        order.product.same_product(&report.product, aliases) && side_compatible(order, report)
    })
}

fn find_fill(
    queue: &VecDeque<PendingOrder>,
    report: &BrokerReport,
    mode: MatchMode,
    aliases: &ProductAliases,
) -> Option<(usize, MatchedBy)> {
    let quantity = report.quantity?;
    let compatible = |order: &PendingOrder| {
        order.quantity == quantity
            && order.product.same_product(&report.product, aliases)
            && side_compatible(order, report)
    };
    let by_time = || {
        queue
            .iter()
            .position(compatible)
            .map(|i| (i, MatchedBy::TimeOrder))
    };

    match mode {
        MatchMode::TimeOrder => by_time(),
        MatchMode::PriceTolerance {
            tolerance,
            fallback_to_time_order,
        } => {
            let price = report.price?;
            queue
                .iter()
                .position(|order| compatible(order) && within(order.price, price, tolerance))
                .map(|i| (i, MatchedBy::PriceTolerance))
                .or_else(|| {
                    if fallback_to_time_order {
                        by_time()
                    } else {
                        None
                    }
                })
        }
    }
}

/// Market orders (price zero) accept any fill price.
fn within(order_price: Decimal, fill_price: Decimal, tolerance: Decimal) -> bool {
    order_price.is_zero() || (order_price - fill_price).abs() <= tolerance
}
