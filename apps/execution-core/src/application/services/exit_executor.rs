//! Exit Executor
//!
//! Single entry point for every exit path. One exit per position may be in
//! flight; concurrent attempts are rejected, not queued. No lock is held
//! across a broker or store call.

use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

use crate::application::listeners::Listeners;
use crate::application::ports::{
    BrokerError, BrokerPort, ExitJournalPort, PositionStorePort, SubmitOrderRequest,
};
use crate::application::services::PositionStopService;
use crate::domain::exit_execution::{
    ExitConfig, ExitConfirmation, ExitError, ExitEvent, ExitFill, ExitGuard, ExitOutcome,
    ExitPermit, ExitReason, ExitRejection, PendingExit, UnpersistedExit,
};
use crate::domain::order_matching::{
    BrokerReport, OrderOwner, PendingOrder, ReportKind, ReportMatcher,
};
use crate::domain::shared::{OrderId, PositionId, Timestamp};
use crate::domain::stop_enforcement::{PositionDirection, PositionSnapshot, Trigger};
use crate::observability;

// Exit submitted under `OnFill`, waiting for its report. Owns the permit.
#[derive(Debug)]
struct InFlightExit {
    permit: ExitPermit,
    snapshot: PositionSnapshot,
    pending: PendingExit,
}

/// Single-flight exit executor.
pub struct ExitExecutor<B, S> {
    broker: Arc<B>,
    store: Arc<S>,
    journal: Arc<dyn ExitJournalPort>,
    matcher: Arc<ReportMatcher>,
    stops: Arc<PositionStopService<S>>,
    config: ExitConfig,
    guard: ExitGuard,
    in_flight: Mutex<HashMap<PositionId, InFlightExit>>,
    // Broker-confirmed exits the store rejected, with whether the journal
    // took them. Blocks further exits for the position.
    unpersisted: Mutex<HashMap<PositionId, (UnpersistedExit, bool)>>,
    listeners: Listeners<ExitEvent>,
}

impl<B: BrokerPort, S: PositionStorePort> ExitExecutor<B, S> {
    /// Create an executor.
    #[must_use]
    pub fn new(
        broker: Arc<B>,
        store: Arc<S>,
        journal: Arc<dyn ExitJournalPort>,
        matcher: Arc<ReportMatcher>,
        stops: Arc<PositionStopService<S>>,
        config: ExitConfig,
    ) -> Self {
        Self {
            broker,
            store,
            journal,
            matcher,
            stops,
            config,
            guard: ExitGuard::new(),
            in_flight: Mutex::new(HashMap::new()),
            unpersisted: Mutex::new(HashMap::new()),
            listeners: Listeners::new(),
        }
    }

    /// Register a listener for success and failure events.
    pub fn subscribe(&self, listener: impl Fn(&ExitEvent) + Send + Sync + 'static) {
        self.listeners.subscribe(listener);
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &ExitConfig {
        &self.config
    }

    /// Whether an exit for `position_id` is in flight.
    #[must_use]
    pub fn is_exiting(&self, position_id: &PositionId) -> bool {
        self.guard.is_exiting(position_id)
    }

    /// Exits waiting for their fill report.
    #[must_use]
    pub fn pending_exits(&self) -> Vec<PendingExit> {
        self.in_flight
            .lock()
            .values()
            .map(|e| e.pending.clone())
            .collect()
    }

    /// Confirmed exits the store has not recorded yet.
    #[must_use]
    pub fn unpersisted_exits(&self) -> Vec<UnpersistedExit> {
        self.unpersisted
            .lock()
            .values()
            .map(|(entry, _)| entry.clone())
            .collect()
    }

    /// Exit the position for a stop trigger.
    ///
    /// # Errors
    ///
    /// Same as [`trigger_exit`](Self::trigger_exit).
    pub async fn handle_trigger(&self, trigger: &Trigger) -> Result<ExitOutcome, ExitError> {
        let reason = match trigger {
            Trigger::Drawdown(_) => ExitReason::TrailingStop,
            Trigger::StopLoss(_) => ExitReason::classify(trigger.reason()),
        };
        self.trigger_exit(trigger.position_id(), reason, None).await
    }

    /// Close `position_id`.
    ///
    /// Loads a fresh snapshot, resolves the price (best bid for long exits,
    /// best ask for short exits) unless given, registers and submits one
    /// opposite-side closing order, then finalizes per the confirmation
    /// policy.
    ///
    /// # Errors
    ///
    /// Returns [`ExitError::PositionLookupFailed`] if the snapshot cannot be
    /// read and [`ExitError::StoreUpdateFailed`] if the broker confirmed the
    /// exit but the store rejected it. Everything else is an
    /// [`ExitOutcome::Rejected`]. After a store failure the position is
    /// refused until [`reconcile_unpersisted`](Self::reconcile_unpersisted)
    /// records the exit.
    pub async fn trigger_exit(
        &self,
        position_id: &PositionId,
        reason: ExitReason,
        price: Option<Decimal>,
    ) -> Result<ExitOutcome, ExitError> {
        let Some(permit) = self.guard.try_acquire(position_id) else {
            tracing::debug!(position_id = %position_id, reason = %reason, "Exit already in flight");
            observability::record_exit("already_exiting");
            return Ok(ExitOutcome::Rejected(ExitRejection::AlreadyExiting));
        };
        if self.unpersisted.lock().contains_key(position_id) {
            tracing::warn!(
                position_id = %position_id,
                reason = %reason,
                "Exit already confirmed but not persisted; refusing another"
            );
            observability::record_exit("unpersisted");
            return Ok(ExitOutcome::Rejected(ExitRejection::Unpersisted));
        }

        let snapshot = match self.store.get_position(position_id).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return Ok(self.reject(position_id, &reason, ExitRejection::NotFound)),
            Err(e) => {
                self.emit_failure(position_id, &reason, e.to_string());
                self.stops.release_trigger(position_id);
                return Err(ExitError::PositionLookupFailed {
                    position_id: position_id.to_string(),
                    message: e.to_string(),
                });
            }
        };
        if !snapshot.is_active() {
            let rejection = ExitRejection::NotActive {
                status: snapshot.status,
            };
            return Ok(self.reject(position_id, &reason, rejection));
        }

        let price = match price {
            Some(price) => price,
            None => match self.quote(&snapshot).await {
                Ok(price) => price,
                Err(e) => {
                    let rejection = ExitRejection::QuoteUnavailable {
                        message: e.to_string(),
                    };
                    return Ok(self.reject(position_id, &reason, rejection));
                }
            },
        };

        let order_id = OrderId::generate();
        let side = snapshot.direction.exit_side();
        // Registered before submitting so an early fill report resolves to
        // this exit rather than to an entry tracker.
        self.matcher.register(
            PendingOrder::new(
                OrderOwner::Exit(position_id.clone()),
                snapshot.product.clone(),
                side,
                snapshot.quantity,
                price,
            )
            .with_id(order_id.clone()),
        );

        tracing::info!(
            position_id = %position_id,
            product = %snapshot.product,
            side = %side,
            price = %price,
            reason = %reason,
            "Submitting exit order"
        );
        let request = SubmitOrderRequest::close(
            order_id.clone(),
            snapshot.product.clone(),
            side,
            price,
            snapshot.quantity,
        );
        if let Err(e) = self.broker.submit_order(request).await {
            self.matcher.remove(&order_id);
            let rejection = ExitRejection::BrokerRejected {
                message: e.to_string(),
            };
            return Ok(self.reject(position_id, &reason, rejection));
        }

        match self.config.confirmation {
            ExitConfirmation::OnAck => self
                .finalize(permit, &snapshot, order_id, reason, price)
                .await
                .map(ExitOutcome::Completed),
            ExitConfirmation::OnFill => {
                let pending = PendingExit {
                    position_id: position_id.clone(),
                    group_id: snapshot.group_id.clone(),
                    order_id,
                    reason,
                    price,
                    submitted_at: Timestamp::now(),
                };
                tracing::debug!(position_id = %position_id, "Exit awaiting fill report");
                observability::record_exit("pending");
                self.in_flight.lock().insert(
                    position_id.clone(),
                    InFlightExit {
                        permit,
                        snapshot,
                        pending: pending.clone(),
                    },
                );
                Ok(ExitOutcome::Pending(pending))
            }
        }
    }

    /// Apply a broker report that the matcher resolved to an exit order.
    ///
    /// A fill finalizes a pending `OnFill` exit at the fill price; a cancel
    /// abandons it. Reports for exits already finalized on acknowledgement
    /// are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ExitError::StoreUpdateFailed`] if the store rejects the
    /// exit.
    pub async fn on_exit_report(
        &self,
        position_id: &PositionId,
        order: &PendingOrder,
        report: &BrokerReport,
    ) -> Result<Option<ExitOutcome>, ExitError> {
        let in_flight = {
            let mut map = self.in_flight.lock();
            match map.get(position_id) {
                Some(e) if e.pending.order_id == order.id => map.remove(position_id),
                _ => None,
            }
        };
        let Some(in_flight) = in_flight else {
            tracing::debug!(
                position_id = %position_id,
                order_id = %order.id,
                "Report for an exit that is not pending"
            );
            return Ok(None);
        };

        match report.kind {
            ReportKind::Fill => {
                let price = report.price.unwrap_or(in_flight.pending.price);
                let InFlightExit {
                    permit,
                    snapshot,
                    pending,
                } = in_flight;
                self.finalize(permit, &snapshot, pending.order_id, pending.reason, price)
                    .await
                    .map(|fill| Some(ExitOutcome::Completed(fill)))
            }
            ReportKind::Cancel => {
                let rejection = ExitRejection::Abandoned {
                    message: "exit order cancelled".to_string(),
                };
                let outcome = self.reject(position_id, &in_flight.pending.reason, rejection);
                drop(in_flight);
                Ok(Some(outcome))
            }
            ReportKind::New | ReportKind::Other(_) => {
                self.in_flight.lock().insert(position_id.clone(), in_flight);
                Ok(None)
            }
        }
    }

    /// Retry the store update for a confirmed exit that was not persisted.
    ///
    /// Returns `Ok(None)` when nothing is outstanding for `position_id` or an
    /// exit for it is in flight, and the recorded fill once the store accepts
    /// it.
    ///
    /// # Errors
    ///
    /// Returns [`ExitError::StoreUpdateFailed`] if the store still rejects
    /// the update; the record stays outstanding.
    pub async fn reconcile_unpersisted(
        &self,
        position_id: &PositionId,
    ) -> Result<Option<ExitFill>, ExitError> {
        let Some(permit) = self.guard.try_acquire(position_id) else {
            return Ok(None);
        };
        let Some((entry, journaled)) = self.unpersisted.lock().get(position_id).cloned() else {
            return Ok(None);
        };

        if let Err(e) = self
            .store
            .mark_exited(position_id, entry.exit_price, entry.realized_pnl, &entry.reason)
            .await
        {
            tracing::warn!(
                position_id = %position_id,
                error = %e,
                "Store still rejects confirmed exit"
            );
            return Err(ExitError::StoreUpdateFailed {
                position_id: position_id.to_string(),
                message: e.to_string(),
                journaled,
            });
        }
        self.unpersisted.lock().remove(position_id);
        tracing::info!(position_id = %position_id, "Reconciled unpersisted exit");

        let fill = ExitFill {
            position_id: entry.position_id,
            group_id: entry.group_id,
            order_id: entry.order_id,
            reason: entry.reason,
            exit_price: entry.exit_price,
            realized_pnl: entry.realized_pnl,
        };
        self.complete(&fill).await;
        drop(permit);
        Ok(Some(fill))
    }

    /// Abandon `OnFill` exits older than the pending timeout.
    pub fn expire_pending_exits(&self) -> Vec<PositionId> {
        self.expire_pending_exits_at(Timestamp::now())
    }

    /// [`expire_pending_exits`](Self::expire_pending_exits) as of `now`.
    pub fn expire_pending_exits_at(&self, now: Timestamp) -> Vec<PositionId> {
        let expired: Vec<InFlightExit> = {
            let mut map = self.in_flight.lock();
            let ids: Vec<PositionId> = map
                .iter()
                .filter(|(_, e)| {
                    e.pending
                        .submitted_at
                        .is_older_than(self.config.pending_timeout, now)
                })
                .map(|(id, _)| id.clone())
                .collect();
            ids.iter().filter_map(|id| map.remove(id)).collect()
        };

        expired
            .into_iter()
            .map(|e| {
                self.matcher.remove(&e.pending.order_id);
                let rejection = ExitRejection::Abandoned {
                    message: "no fill before timeout".to_string(),
                };
                self.reject(&e.pending.position_id, &e.pending.reason, rejection);
                e.pending.position_id
            })
            .collect()
    }

    async fn quote(&self, snapshot: &PositionSnapshot) -> Result<Decimal, BrokerError> {
        match snapshot.direction {
            PositionDirection::Long => self.broker.get_best_bid(&snapshot.product).await,
            PositionDirection::Short => self.broker.get_best_ask(&snapshot.product).await,
        }
    }

    async fn finalize(
        &self,
        permit: ExitPermit,
        snapshot: &PositionSnapshot,
        order_id: OrderId,
        reason: ExitReason,
        exit_price: Decimal,
    ) -> Result<ExitFill, ExitError> {
        let position_id = &snapshot.id;
        let realized_pnl = snapshot.realized_pnl_at(exit_price);

        if let Err(e) = self
            .store
            .mark_exited(position_id, exit_price, realized_pnl, &reason)
            .await
        {
            tracing::error!(
                position_id = %position_id,
                exit_price = %exit_price,
                realized_pnl = %realized_pnl,
                error = %e,
                "Exit confirmed by broker but not persisted"
            );
            let entry = UnpersistedExit {
                position_id: position_id.clone(),
                group_id: snapshot.group_id.clone(),
                order_id: order_id.clone(),
                reason: reason.clone(),
                exit_price,
                realized_pnl,
                error: e.to_string(),
                recorded_at: Timestamp::now(),
            };
            let journaled = match self.journal.record(&entry).await {
                Ok(()) => true,
                Err(journal_error) => {
                    tracing::error!(
                        position_id = %position_id,
                        error = %journal_error,
                        "Failed to journal unpersisted exit"
                    );
                    false
                }
            };
            observability::record_exit_journaled(journaled);
            self.emit_failure(position_id, &reason, e.to_string());
            // The position still reads ACTIVE; recorded before the permit is
            // released so no other exit can slip in.
            self.unpersisted
                .lock()
                .insert(position_id.clone(), (entry, journaled));
            drop(permit);
            return Err(ExitError::StoreUpdateFailed {
                position_id: position_id.to_string(),
                message: e.to_string(),
                journaled,
            });
        }

        let fill = ExitFill {
            position_id: position_id.clone(),
            group_id: snapshot.group_id.clone(),
            order_id,
            reason,
            exit_price,
            realized_pnl,
        };
        self.complete(&fill).await;
        drop(permit);
        Ok(fill)
    }

    // Runs once the store has recorded the exit. Callers hold the permit.
    async fn complete(&self, fill: &ExitFill) {
        let position_id = &fill.position_id;
        tracing::info!(
            position_id = %position_id,
            exit_price = %fill.exit_price,
            realized_pnl = %fill.realized_pnl,
            reason = %fill.reason,
            "Position exited"
        );
        observability::record_exit("completed");
        self.listeners.emit(&ExitEvent::Succeeded {
            position_id: fill.position_id.clone(),
            group_id: fill.group_id.clone(),
            reason: fill.reason.clone(),
            order_id: fill.order_id.clone(),
            exit_price: fill.exit_price,
            realized_pnl: fill.realized_pnl,
        });

        if fill.realized_pnl > Decimal::ZERO {
            match self
                .stops
                .propagate_protective_stops(position_id, &fill.group_id, fill.realized_pnl)
                .await
            {
                Ok(report) if !report.is_complete() => tracing::warn!(
                    position_id = %position_id,
                    failures = report.failures.len(),
                    "Protective stop propagation partially failed"
                ),
                Ok(_) => {}
                Err(e) => tracing::warn!(
                    position_id = %position_id,
                    error = %e,
                    "Protective stop propagation failed"
                ),
            }
        }
    }

    fn reject(
        &self,
        position_id: &PositionId,
        reason: &ExitReason,
        rejection: ExitRejection,
    ) -> ExitOutcome {
        tracing::warn!(
            position_id = %position_id,
            reason = %reason,
            rejection = %rejection,
            "Exit rejected"
        );
        observability::record_exit("rejected");
        self.emit_failure(position_id, reason, rejection.to_string());
        self.stops.release_trigger(position_id);
        ExitOutcome::Rejected(rejection)
    }

    fn emit_failure(&self, position_id: &PositionId, reason: &ExitReason, error: String) {
        self.listeners.emit(&ExitEvent::Failed {
            position_id: position_id.clone(),
            reason: reason.clone(),
            error,
        });
    }
}

impl<B, S> std::fmt::Debug for ExitExecutor<B, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExitExecutor")
            .field("config", &self.config)
            .field("in_flight", &self.guard.in_flight())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order_matching::{MatchOutcome, MatcherConfig};
    use crate::domain::shared::{GroupId, ProductAliases, ProductCode, Side};
    use crate::domain::stop_enforcement::{LotStopRule, OpeningRange, PositionStatus};
    use crate::infrastructure::broker::SimulatedGateway;
    use crate::infrastructure::journal::InMemoryExitJournal;
    use crate::infrastructure::persistence::InMemoryPositionStore;
    use crate::testing::wire;
    use rust_decimal_macros::dec;

    struct Fixture {
        broker: Arc<SimulatedGateway>,
        store: Arc<InMemoryPositionStore>,
        journal: Arc<InMemoryExitJournal>,
        matcher: Arc<ReportMatcher>,
        executor: ExitExecutor<SimulatedGateway, InMemoryPositionStore>,
    }

    fn long(id: &str) -> PositionSnapshot {
        PositionSnapshot::open(
            PositionId::new(id),
            GroupId::new("g-1"),
            0,
            ProductCode::new("MXF"),
            PositionDirection::Long,
            dec!(20000),
            OpeningRange::new(dec!(20050), dec!(19950)),
            &LotStopRule::new(dec!(15), dec!(0.02)),
        )
    }

    fn fixture(positions: Vec<PositionSnapshot>, confirmation: ExitConfirmation) -> Fixture {
        let broker = Arc::new(SimulatedGateway::new());
        broker.set_quote("MXF", dec!(20010), dec!(20011));
        let store = Arc::new(InMemoryPositionStore::with_positions(positions));
        let journal = Arc::new(InMemoryExitJournal::new());
        let matcher = Arc::new(ReportMatcher::new(MatcherConfig::default()));
        let stops = Arc::new(PositionStopService::new(
            Arc::clone(&store),
            ProductAliases::default(),
        ));
        let executor = ExitExecutor::new(
            Arc::clone(&broker),
            Arc::clone(&store),
            Arc::clone(&journal) as Arc<dyn ExitJournalPort>,
            Arc::clone(&matcher),
            stops,
            ExitConfig::default().with_confirmation(confirmation),
        );
        Fixture {
            broker,
            store,
            journal,
            matcher,
            executor,
        }
    }

    #[tokio::test]
    async fn on_ack_exit_uses_best_bid_for_long() {
        let f = fixture(vec![long("p-1")], ExitConfirmation::OnAck);
        let outcome = f
            .executor
            .trigger_exit(&PositionId::new("p-1"), ExitReason::Manual, None)
            .await
            .unwrap();

        let ExitOutcome::Completed(fill) = outcome else {
            panic!("expected completed exit, got {outcome:?}");
        };
        assert_eq!(fill.exit_price, dec!(20010));
        assert_eq!(fill.realized_pnl, dec!(10));

        let submissions = f.broker.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].side, Side::Sell);
        assert!(submissions[0].close_position);

        let stored = f.store.snapshot(&PositionId::new("p-1")).unwrap();
        assert_eq!(stored.status, PositionStatus::Exited);
        assert!(!f.executor.is_exiting(&PositionId::new("p-1")));
    }

    #[tokio::test]
    async fn exited_position_is_not_active() {
        let f = fixture(vec![long("p-1")], ExitConfirmation::OnAck);
        let id = PositionId::new("p-1");
        f.executor
            .trigger_exit(&id, ExitReason::Manual, None)
            .await
            .unwrap();

        let outcome = f
            .executor
            .trigger_exit(&id, ExitReason::Manual, None)
            .await
            .unwrap();
        assert_eq!(
            outcome.rejection(),
            Some(&ExitRejection::NotActive {
                status: PositionStatus::Exited
            })
        );
        assert_eq!(f.broker.submission_count(), 1);
    }

    #[tokio::test]
    async fn unknown_position_is_rejected() {
        let f = fixture(vec![], ExitConfirmation::OnAck);
        let outcome = f
            .executor
            .trigger_exit(&PositionId::new("ghost"), ExitReason::Manual, None)
            .await
            .unwrap();
        assert_eq!(outcome.rejection(), Some(&ExitRejection::NotFound));
        assert_eq!(f.broker.submission_count(), 0);
    }

    #[tokio::test]
    async fn broker_rejection_releases_permit_and_order() {
        let f = fixture(vec![long("p-1")], ExitConfirmation::OnAck);
        f.broker.reject_submissions("market closed");
        let id = PositionId::new("p-1");

        let outcome = f
            .executor
            .trigger_exit(&id, ExitReason::Manual, Some(dec!(20005)))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            ExitOutcome::Rejected(ExitRejection::BrokerRejected { .. })
        ));
        assert!(!f.executor.is_exiting(&id));
        assert_eq!(f.matcher.stats().pending, 0);

        f.broker.accept_submissions();
        let retry = f
            .executor
            .trigger_exit(&id, ExitReason::Manual, Some(dec!(20005)))
            .await
            .unwrap();
        assert!(retry.is_completed());
    }

    #[tokio::test]
    async fn store_failure_after_fill_is_journaled() {
        let f = fixture(vec![long("p-1")], ExitConfirmation::OnAck);
        let id = PositionId::new("p-1");
        f.store.fail_writes_for(&id);

        let err = f
            .executor
            .trigger_exit(&id, ExitReason::InitialStop, Some(dec!(19950)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExitError::StoreUpdateFailed {
                journaled: true,
                ..
            }
        ));

        let entries = f.journal.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].position_id, id);
        assert_eq!(entries[0].exit_price, dec!(19950));
        assert_eq!(entries[0].realized_pnl, dec!(-50));
        assert!(!f.executor.is_exiting(&id));
    }

    #[tokio::test]
    async fn unpersisted_exit_blocks_another_exit_until_reconciled() {
        let f = fixture(vec![long("p-1")], ExitConfirmation::OnAck);
        let id = PositionId::new("p-1");
        f.store.fail_writes_for(&id);
        f.executor
            .trigger_exit(&id, ExitReason::InitialStop, Some(dec!(19950)))
            .await
            .unwrap_err();
        assert_eq!(f.executor.unpersisted_exits().len(), 1);

        // The store still reads ACTIVE, but the position is already flat.
        let again = f
            .executor
            .trigger_exit(&id, ExitReason::EndOfDay, None)
            .await
            .unwrap();
        assert_eq!(again.rejection(), Some(&ExitRejection::Unpersisted));
        assert_eq!(f.broker.submission_count(), 1);

        let err = f.executor.reconcile_unpersisted(&id).await.unwrap_err();
        assert!(matches!(err, ExitError::StoreUpdateFailed { journaled: true, .. }));

        f.store.clear_failures();
        let fill = f.executor.reconcile_unpersisted(&id).await.unwrap().unwrap();
        assert_eq!(fill.exit_price, dec!(19950));
        assert_eq!(fill.realized_pnl, dec!(-50));
        assert!(f.executor.unpersisted_exits().is_empty());
        assert_eq!(
            f.store.snapshot(&id).unwrap().status,
            PositionStatus::Exited
        );
        assert!(f.executor.reconcile_unpersisted(&id).await.unwrap().is_none());

        let after = f
            .executor
            .trigger_exit(&id, ExitReason::Manual, None)
            .await
            .unwrap();
        assert!(matches!(
            after,
            ExitOutcome::Rejected(ExitRejection::NotActive { .. })
        ));
        assert_eq!(f.broker.submission_count(), 1);
    }

    #[tokio::test]
    async fn journal_failure_is_reported() {
        let f = fixture(vec![long("p-1")], ExitConfirmation::OnAck);
        let id = PositionId::new("p-1");
        f.store.fail_writes_for(&id);
        f.journal.set_failing(true);

        let err = f
            .executor
            .trigger_exit(&id, ExitReason::Manual, Some(dec!(20000)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExitError::StoreUpdateFailed {
                journaled: false,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn on_fill_exit_completes_at_fill_price() {
        let f = fixture(vec![long("p-1")], ExitConfirmation::OnFill);
        let id = PositionId::new("p-1");

        let outcome = f
            .executor
            .trigger_exit(&id, ExitReason::Manual, Some(dec!(20005)))
            .await
            .unwrap();
        assert!(matches!(outcome, ExitOutcome::Pending(_)));
        assert!(f.executor.is_exiting(&id));
        assert_eq!(f.executor.pending_exits().len(), 1);

        let report = BrokerReport::parse(&wire("D", "S", "MXFK4", "20007", "1")).unwrap();
        let MatchOutcome::Matched { order, .. } = f.matcher.match_report(&report) else {
            panic!("exit order should be pending in the matcher");
        };
        let finished = f
            .executor
            .on_exit_report(&id, &order, &report)
            .await
            .unwrap()
            .unwrap();

        let ExitOutcome::Completed(fill) = finished else {
            panic!("expected completed exit");
        };
        assert_eq!(fill.exit_price, dec!(20007));
        assert!(!f.executor.is_exiting(&id));
        assert!(f.executor.pending_exits().is_empty());
    }

    #[tokio::test]
    async fn pending_exit_expires() {
        let f = fixture(vec![long("p-1")], ExitConfirmation::OnFill);
        let id = PositionId::new("p-1");
        f.executor
            .trigger_exit(&id, ExitReason::Manual, Some(dec!(20005)))
            .await
            .unwrap();

        assert!(f.executor.expire_pending_exits().is_empty());
        let later = Timestamp::now().plus(chrono::Duration::seconds(31));
        assert_eq!(f.executor.expire_pending_exits_at(later), vec![id.clone()]);
        assert!(!f.executor.is_exiting(&id));
        assert_eq!(f.matcher.stats().pending, 0);
    }

    #[tokio::test]
    async fn success_event_is_emitted() {
        let f = fixture(vec![long("p-1")], ExitConfirmation::OnAck);
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        f.executor.subscribe(move |e| sink.lock().push(e.clone()));

        f.executor
            .trigger_exit(&PositionId::new("p-1"), ExitReason::EndOfDay, None)
            .await
            .unwrap();

        let events = events.lock();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            ExitEvent::Succeeded { reason: ExitReason::EndOfDay, .. }
        ));
    }
}
