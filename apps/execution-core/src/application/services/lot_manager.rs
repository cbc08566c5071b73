//! Lot Manager
//!
//! Owns every active [`LotTracker`] and routes broker reports to them. A
//! report first goes through the shared [`ReportMatcher`]; the matched
//! order's owner decides the destination. Reports the matcher cannot place
//! fall back to the earliest-created active tracker for the product; a
//! report for a known owner never goes anywhere else.

use chrono::Duration;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

use crate::application::listeners::Listeners;
use crate::domain::lot_tracking::{
    LotError, LotEvent, LotTracker, LotTrackerConfig, RetryRequest, TrackerStatus,
};
use crate::domain::order_matching::{
    BrokerReport, MatchOutcome, MatcherStats, MatchingError, OrderOwner, PendingOrder,
    ReportKind, ReportMatcher,
};
use crate::domain::shared::{OrderId, PositionId, ProductCode, Side, Timestamp, TrackerId};
use crate::observability;

/// Lot manager settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LotManagerConfig {
    /// Retry policy for each tracker.
    pub tracker: LotTrackerConfig,
    /// Trackers older than this are not eligible for fallback routing.
    pub routing_window: Duration,
    /// Default age after which terminal trackers are dropped.
    pub cleanup_age: Duration,
}

impl LotManagerConfig {
    /// Default fallback routing window in seconds.
    pub const DEFAULT_ROUTING_WINDOW_SECS: i64 = 30;
    /// Default cleanup age in seconds.
    pub const DEFAULT_CLEANUP_AGE_SECS: i64 = 3_600;
}

impl Default for LotManagerConfig {
    fn default() -> Self {
        Self {
            tracker: LotTrackerConfig::default(),
            routing_window: Duration::seconds(Self::DEFAULT_ROUTING_WINDOW_SECS),
            cleanup_age: Duration::seconds(Self::DEFAULT_CLEANUP_AGE_SECS),
        }
    }
}

/// Where a broker report ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Applied to a lot tracker.
    Tracker {
        /// Receiving tracker.
        tracker_id: TrackerId,
        /// Pending order the matcher resolved, if any.
        order_id: Option<OrderId>,
        /// Tracker status after applying the report.
        status: TrackerStatus,
    },
    /// Resolved an exit order; the exit executor finalizes it.
    Exit {
        /// Exiting position.
        position_id: PositionId,
        /// Resolved exit order.
        order: PendingOrder,
        /// The report.
        report: BrokerReport,
    },
    /// A `New` acknowledgement; nothing to apply.
    Acknowledged,
    /// Unknown report kind.
    Ignored,
    /// Neither a pending order nor an eligible tracker matched.
    Unmatched,
}

/// Counters and status breakdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LotManagerStats {
    /// Trackers held.
    pub trackers: usize,
    /// Trackers with nothing filled.
    pub pending: usize,
    /// Partially filled trackers.
    pub partial: usize,
    /// Completed trackers still held.
    pub completed: usize,
    /// Failed trackers still held.
    pub failed: usize,
    /// Fill reports applied.
    pub fills_routed: u64,
    /// Cancel reports applied.
    pub cancels_routed: u64,
    /// Reports resolved to exit orders.
    pub exits_routed: u64,
    /// `New` acknowledgements seen.
    pub acknowledgements: u64,
    /// Reports that reached no tracker.
    pub unmatched: u64,
    /// Retry requests emitted.
    pub retries_requested: u64,
    /// Trackers removed by cleanup.
    pub cleaned_up: u64,
    /// Matcher counters.
    pub matcher: MatcherStats,
}

#[derive(Debug, Default)]
struct ManagerState {
    // Creation order; the FIFO key for fallback routing.
    trackers: Vec<LotTracker>,
    fills_routed: u64,
    cancels_routed: u64,
    exits_routed: u64,
    acknowledgements: u64,
    unmatched: u64,
    retries_requested: u64,
    cleaned_up: u64,
}

impl ManagerState {
    fn find_mut(&mut self, id: &TrackerId) -> Option<&mut LotTracker> {
        self.trackers.iter_mut().find(|t| t.id() == id)
    }
}

/// Registry and router for lot trackers.
#[derive(Debug)]
pub struct LotManager {
    matcher: Arc<ReportMatcher>,
    config: LotManagerConfig,
    state: Mutex<ManagerState>,
    listeners: Listeners<LotEvent>,
}

impl LotManager {
    /// Create a manager sharing `matcher` with the exit executor.
    #[must_use]
    pub fn new(matcher: Arc<ReportMatcher>, config: LotManagerConfig) -> Self {
        Self {
            matcher,
            config,
            state: Mutex::new(ManagerState::default()),
            listeners: Listeners::new(),
        }
    }

    /// Register a listener for fill, retry, completion and failure events.
    pub fn subscribe(&self, listener: impl Fn(&LotEvent) + Send + Sync + 'static) {
        self.listeners.subscribe(listener);
    }

    /// The shared matcher.
    #[must_use]
    pub fn matcher(&self) -> &Arc<ReportMatcher> {
        &self.matcher
    }

    /// Create a tracker for a new multi-lot entry.
    ///
    /// # Errors
    ///
    /// Returns [`LotError::DuplicateTracker`] if `id` is already held, or
    /// [`LotError::InvalidQuantity`] for a zero quantity.
    pub fn create_tracker(
        &self,
        id: TrackerId,
        target_qty: u32,
        lots_per_group: u32,
        side: Side,
        product: ProductCode,
    ) -> Result<TrackerId, LotError> {
        self.create_tracker_at(id, target_qty, lots_per_group, side, product, Timestamp::now())
    }

    /// [`create_tracker`](Self::create_tracker) with an explicit creation time.
    ///
    /// # Errors
    ///
    /// Same as [`create_tracker`](Self::create_tracker).
    pub fn create_tracker_at(
        &self,
        id: TrackerId,
        target_qty: u32,
        lots_per_group: u32,
        side: Side,
        product: ProductCode,
        at: Timestamp,
    ) -> Result<TrackerId, LotError> {
        let tracker = LotTracker::new(
            id.clone(),
            product,
            side,
            target_qty,
            lots_per_group,
            self.config.tracker,
        )?
        .created_at_time(at);

        let mut state = self.state.lock();
        if state.trackers.iter().any(|t| t.id() == &id) {
            return Err(LotError::DuplicateTracker(id));
        }
        state.trackers.push(tracker);
        drop(state);

        tracing::info!(tracker_id = %id, target_qty, side = %side, "Created lot tracker");
        Ok(id)
    }

    /// Record an order sent for `tracker_id` and register it with the
    /// matcher.
    ///
    /// # Errors
    ///
    /// Returns [`LotError::TrackerNotFound`] for an unknown tracker.
    pub fn record_submission(
        &self,
        tracker_id: &TrackerId,
        mut order: PendingOrder,
    ) -> Result<OrderId, LotError> {
        {
            let mut state = self.state.lock();
            let tracker = state
                .find_mut(tracker_id)
                .ok_or_else(|| LotError::TrackerNotFound(tracker_id.clone()))?;
            tracker.update_submitted(order.quantity);
        }
        order.owner = OrderOwner::Lot(tracker_id.clone());
        Ok(self.matcher.register(order))
    }

    /// Parse a wire report and route it.
    ///
    /// # Errors
    ///
    /// Returns [`MatchingError::MalformedReport`] if the text cannot be
    /// decoded.
    pub fn route_report(&self, raw: &str) -> Result<RouteOutcome, MatchingError> {
        let report = BrokerReport::parse(raw)?;
        Ok(self.route_parsed_at(&report, Timestamp::now()))
    }

    /// Route an already decoded report.
    pub fn route_parsed(&self, report: &BrokerReport) -> RouteOutcome {
        self.route_parsed_at(report, Timestamp::now())
    }

    /// Route a decoded report as of `now`.
    pub fn route_parsed_at(&self, report: &BrokerReport, now: Timestamp) -> RouteOutcome {
        match report.kind {
            ReportKind::New => {
                self.state.lock().acknowledgements += 1;
                tracing::debug!(product = %report.product, "Order acknowledged by exchange");
                return RouteOutcome::Acknowledged;
            }
            ReportKind::Other(ref code) => {
                tracing::debug!(code = %code, "Ignoring report kind");
                return RouteOutcome::Ignored;
            }
            ReportKind::Fill | ReportKind::Cancel => {}
        }

        let matched = match self.matcher.match_report_at(report, now) {
            MatchOutcome::Matched { order, .. } => Some(order),
            MatchOutcome::NoMatch => None,
        };

        if let Some(order) = &matched
            && let OrderOwner::Exit(position_id) = &order.owner
        {
            self.state.lock().exits_routed += 1;
            return RouteOutcome::Exit {
                position_id: position_id.clone(),
                order: order.clone(),
                report: report.clone(),
            };
        }

        let mut events = Vec::new();
        let outcome = {
            let mut state = self.state.lock();
            let owner = matched.as_ref().and_then(|o| match &o.owner {
                OrderOwner::Lot(id) => Some(id.clone()),
                _ => None,
            });
            let target = match owner {
                Some(id) => state
                    .trackers
                    .iter()
                    .find(|t| t.id() == &id && Self::owner_accepts(t, &report.kind))
                    .map(|t| t.id().clone()),
                None => self.select_fallback(&state.trackers, report, now),
            };

            match target {
                Some(tracker_id) => {
                    let status = Self::apply(
                        &mut state,
                        &tracker_id,
                        report,
                        matched.as_ref(),
                        now,
                        &mut events,
                    );
                    RouteOutcome::Tracker {
                        tracker_id,
                        order_id: matched.as_ref().map(|o| o.id.clone()),
                        status,
                    }
                }
                None => {
                    state.unmatched += 1;
                    RouteOutcome::Unmatched
                }
            }
        };

        // Leftover orders of a completed entry must not absorb later reports.
        if let RouteOutcome::Tracker {
            tracker_id,
            status: TrackerStatus::Completed,
            ..
        } = &outcome
        {
            let purged = self.matcher.remove_owned(&OrderOwner::Lot(tracker_id.clone()));
            if purged > 0 {
                tracing::debug!(tracker_id = %tracker_id, purged, "Dropped orders of completed tracker");
            }
        }
        if outcome == RouteOutcome::Unmatched {
            tracing::warn!(
                kind = ?report.kind,
                product = %report.product,
                order_id = ?matched.as_ref().map(|o| &o.id),
                "No lot tracker eligible for broker report; dropping"
            );
        }
        self.publish(&events);
        outcome
    }

    /// Whether the owner of a matched order still takes this report. A
    /// FAILED tracker keeps taking fills for its last retry order.
    fn owner_accepts(tracker: &LotTracker, kind: &ReportKind) -> bool {
        match kind {
            ReportKind::Fill => tracker.status() != TrackerStatus::Completed,
            _ => !tracker.is_terminal(),
        }
    }

    /// Earliest-created active tracker for the report's product within the
    /// routing window.
    fn select_fallback(
        &self,
        trackers: &[LotTracker],
        report: &BrokerReport,
        now: Timestamp,
    ) -> Option<TrackerId> {
        let aliases = &self.matcher.config().aliases;
        trackers
            .iter()
            .filter(|t| !t.is_terminal())
            .filter(|t| !t.created_at().is_older_than(self.config.routing_window, now))
            .filter(|t| t.product().same_product(&report.product, aliases))
            .find(|t| report.side.is_none_or(|side| side == t.side()))
            .map(|t| t.id().clone())
    }

    fn apply(
        state: &mut ManagerState,
        tracker_id: &TrackerId,
        report: &BrokerReport,
        order: Option<&PendingOrder>,
        now: Timestamp,
        events: &mut Vec<LotEvent>,
    ) -> TrackerStatus {
        let is_fill = report.kind == ReportKind::Fill;
        let Some(tracker) = state.find_mut(tracker_id) else {
            return TrackerStatus::Failed;
        };

        let mut retried = false;
        if is_fill {
            let qty = report.quantity.unwrap_or(0);
            let price = report.price.unwrap_or_default();
            let outcome = tracker.process_fill(price, qty, now);
            observability::record_lot_fills(u64::from(outcome.accepted));
            events.extend(outcome.records.into_iter().map(LotEvent::Filled));
            if outcome.completed {
                observability::record_tracker_completed();
                tracing::info!(
                    tracker_id = %tracker.id(),
                    filled = tracker.filled_qty(),
                    average_price = %tracker.average_price(),
                    "Lot tracker completed"
                );
                events.push(LotEvent::Completed {
                    tracker_id: tracker.id().clone(),
                    filled_qty: tracker.filled_qty(),
                    average_price: tracker.average_price(),
                });
            }
        } else {
            let qty = report
                .quantity
                .or_else(|| order.map(|o| o.quantity))
                .unwrap_or_else(|| tracker.remaining());
            let price = report.price.or_else(|| order.map(|o| o.price));
            let outcome = tracker.process_cancel(price, qty, now);
            if let Some(retry) = outcome.retry {
                retried = true;
                observability::record_retry_requested();
                events.push(LotEvent::RetryRequested(retry));
            }
            if outcome.failed {
                observability::record_tracker_failed();
                events.push(Self::failed_event(tracker));
            }
        }

        let status = tracker.status();
        if is_fill {
            state.fills_routed += 1;
        } else {
            state.cancels_routed += 1;
        }
        if retried {
            state.retries_requested += 1;
        }
        status
    }

    fn failed_event(tracker: &LotTracker) -> LotEvent {
        LotEvent::Failed {
            tracker_id: tracker.id().clone(),
            filled_qty: tracker.filled_qty(),
            target_qty: tracker.target_qty(),
            retry_count: tracker.retry_count(),
        }
    }

    /// Emit retries deferred by the cool-down that are now due.
    pub fn poll_deferred_retries(&self) -> Vec<RetryRequest> {
        self.poll_deferred_retries_at(Timestamp::now())
    }

    /// [`poll_deferred_retries`](Self::poll_deferred_retries) as of `now`.
    pub fn poll_deferred_retries_at(&self, now: Timestamp) -> Vec<RetryRequest> {
        let mut retries = Vec::new();
        let mut events = Vec::new();
        {
            let mut state = self.state.lock();
            for tracker in &mut state.trackers {
                let Some(retry) = tracker.poll_deferred_retry(now) else {
                    continue;
                };
                observability::record_retry_requested();
                events.push(LotEvent::RetryRequested(retry.clone()));
                retries.push(retry);
                if tracker.take_failure() {
                    observability::record_tracker_failed();
                    events.push(Self::failed_event(tracker));
                }
            }
            state.retries_requested += retries.len() as u64;
        }
        self.publish(&events);
        retries
    }

    /// Drop terminal trackers older than `max_age`; returns how many.
    pub fn cleanup(&self, max_age: Duration) -> usize {
        self.cleanup_at(max_age, Timestamp::now())
    }

    /// Drop terminal trackers older than the configured cleanup age.
    pub fn cleanup_default(&self) -> usize {
        self.cleanup(self.config.cleanup_age)
    }

    /// [`cleanup`](Self::cleanup) as of `now`.
    pub fn cleanup_at(&self, max_age: Duration, now: Timestamp) -> usize {
        let mut state = self.state.lock();
        let before = state.trackers.len();
        state
            .trackers
            .retain(|t| !(t.is_terminal() && t.created_at().is_older_than(max_age, now)));
        let removed = before - state.trackers.len();
        state.cleaned_up += removed as u64;
        drop(state);
        if removed > 0 {
            tracing::debug!(removed, "Cleaned up terminal lot trackers");
        }
        removed
    }

    /// Copy of one tracker.
    #[must_use]
    pub fn tracker(&self, id: &TrackerId) -> Option<LotTracker> {
        self.state.lock().trackers.iter().find(|t| t.id() == id).cloned()
    }

    /// Status of one tracker.
    #[must_use]
    pub fn status(&self, id: &TrackerId) -> Option<TrackerStatus> {
        self.state
            .lock()
            .trackers
            .iter()
            .find(|t| t.id() == id)
            .map(LotTracker::status)
    }

    /// Number of trackers not yet terminal.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.state
            .lock()
            .trackers
            .iter()
            .filter(|t| !t.is_terminal())
            .count()
    }

    /// Aggregate statistics.
    #[must_use]
    pub fn stats(&self) -> LotManagerStats {
        let state = self.state.lock();
        let mut stats = LotManagerStats {
            trackers: state.trackers.len(),
            fills_routed: state.fills_routed,
            cancels_routed: state.cancels_routed,
            exits_routed: state.exits_routed,
            acknowledgements: state.acknowledgements,
            unmatched: state.unmatched,
            retries_requested: state.retries_requested,
            cleaned_up: state.cleaned_up,
            ..LotManagerStats::default()
        };
        for tracker in &state.trackers {
            match tracker.status() {
                TrackerStatus::Pending => stats.pending += 1,
                TrackerStatus::Partial => stats.partial += 1,
                TrackerStatus::Completed => stats.completed += 1,
                TrackerStatus::Failed => stats.failed += 1,
            }
        }
        drop(state);
        stats.matcher = self.matcher.stats();
        stats
    }

    fn publish(&self, events: &[LotEvent]) {
        self.listeners.emit_all(events);
    }
}
