//! Position Stop Service
//!
//! Runs the stop state machine over fresh position snapshots on every price
//! tick, persists trailing changes, hands out each position's trigger once,
//! and propagates protective stops after profitable exits.

use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;

use crate::application::listeners::Listeners;
use crate::application::ports::{PositionStorePort, StoreError};
use crate::domain::shared::{GroupId, PositionId, ProductAliases, ProductCode, Timestamp};
use crate::domain::stop_enforcement::{
    PositionSnapshot, StopEnforcementError, StopEvent, StopLossType, StopStateMachine,
    TrailingUpdate, Trigger, TriggerLedger,
};
use crate::observability;

/// Result of one protective-stop propagation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtectiveReport {
    /// Siblings whose stop moved.
    pub updated: Vec<PositionId>,
    /// Siblings left alone (trailing, no multiplier).
    pub skipped: Vec<PositionId>,
    /// Siblings whose update failed; the others are unaffected.
    pub failures: Vec<(PositionId, StopEnforcementError)>,
}

impl ProtectiveReport {
    /// Whether every eligible sibling was updated.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Stop enforcement over the position store.
#[derive(Debug)]
pub struct PositionStopService<S> {
    store: Arc<S>,
    aliases: ProductAliases,
    ledger: TriggerLedger,
    listeners: Listeners<StopEvent>,
}

impl<S: PositionStorePort> PositionStopService<S> {
    /// Create a service over `store`.
    #[must_use]
    pub fn new(store: Arc<S>, aliases: ProductAliases) -> Self {
        Self {
            store,
            aliases,
            ledger: TriggerLedger::new(),
            listeners: Listeners::new(),
        }
    }

    /// Register a listener for activation, trigger and protective events.
    pub fn subscribe(&self, listener: impl Fn(&StopEvent) + Send + Sync + 'static) {
        self.listeners.subscribe(listener);
    }

    /// Evaluate a tick for every active position in `product`.
    ///
    /// Returns the triggers produced by this tick that had not fired before.
    ///
    /// # Errors
    ///
    /// Returns [`StopEnforcementError::Store`] if the active positions cannot
    /// be read. Per-position write failures are logged and skipped.
    pub async fn on_price_tick(
        &self,
        product: &ProductCode,
        price: Decimal,
    ) -> Result<Vec<Trigger>, StopEnforcementError> {
        self.on_price_tick_at(product, price, Timestamp::now()).await
    }

    /// [`on_price_tick`](Self::on_price_tick) as of `at`.
    ///
    /// # Errors
    ///
    /// Same as [`on_price_tick`](Self::on_price_tick).
    pub async fn on_price_tick_at(
        &self,
        product: &ProductCode,
        price: Decimal,
        at: Timestamp,
    ) -> Result<Vec<Trigger>, StopEnforcementError> {
        let positions = self
            .store
            .get_all_active_positions()
            .await
            .map_err(|e| store_error("", &e))?;

        let mut triggers = Vec::new();
        for position in positions
            .into_iter()
            .filter(|p| p.product.same_product(product, &self.aliases))
        {
            if self.ledger.contains(&position.id) {
                continue;
            }
            let evaluation = StopStateMachine::evaluate(&position, price, at);
            if let Some(update) = evaluation.trailing {
                self.persist_trailing(&position, update, price).await;
            }
            if let Some(trigger) = evaluation.trigger {
                if self.ledger.try_mark(trigger.position_id()) {
                    tracing::info!(
                        position_id = %trigger.position_id(),
                        kind = trigger.kind(),
                        price = %price,
                        reference = %trigger.reference_price(),
                        "Exit trigger fired"
                    );
                    observability::record_trigger(trigger.kind());
                    self.listeners.emit(&StopEvent::Triggered(trigger.clone()));
                    triggers.push(trigger);
                } else {
                    tracing::debug!(position_id = %position.id, "Trigger already handed out");
                }
            }
        }
        Ok(triggers)
    }

    async fn persist_trailing(
        &self,
        position: &PositionSnapshot,
        update: TrailingUpdate,
        price: Decimal,
    ) {
        let id = &position.id;
        // The store ratchets the peak, so a tick that read an older snapshot
        // cannot move it back.
        let switched_on = match self
            .store
            .update_trailing(id, true, Some(update.peak()))
            .await
        {
            Ok(switched_on) => switched_on,
            Err(e) => {
                tracing::warn!(position_id = %id, error = %e, "Failed to persist trailing peak");
                return;
            }
        };

        if switched_on {
            let peak = update.peak();
            if position.stop_type.can_transition_to(StopLossType::Trailing)
                && let Err(e) = self
                    .store
                    .update_stop_type(id, StopLossType::Trailing)
                    .await
            {
                tracing::warn!(
                    position_id = %id,
                    error = %e,
                    "Failed to persist trailing stop type"
                );
            }
            tracing::info!(
                position_id = %id,
                entry = %position.entry_price,
                price = %price,
                peak = %peak,
                "Trailing stop activated"
            );
            observability::record_trailing_activated();
            self.listeners.emit(&StopEvent::TrailingActivated {
                position_id: id.clone(),
                group_id: position.group_id.clone(),
                price,
            });
        }
    }

    /// Move the stops of `group_id`'s remaining lots after `source` exited
    /// with `realized_profit`.
    ///
    /// Each sibling is an independent single-record update; one failure does
    /// not stop the rest.
    ///
    /// # Errors
    ///
    /// Returns [`StopEnforcementError::Store`] if the group cannot be read.
    pub async fn propagate_protective_stops(
        &self,
        source: &PositionId,
        group_id: &GroupId,
        realized_profit: Decimal,
    ) -> Result<ProtectiveReport, StopEnforcementError> {
        let mut report = ProtectiveReport::default();
        if realized_profit <= Decimal::ZERO {
            return Ok(report);
        }

        let siblings = self
            .store
            .get_active_positions(group_id)
            .await
            .map_err(|e| store_error(group_id.as_str(), &e))?;

        for sibling in siblings.into_iter().filter(|s| &s.id != source) {
            let Some(new_stop) = StopStateMachine::protective_stop(&sibling, realized_profit) else {
                report.skipped.push(sibling.id);
                continue;
            };
            if !sibling.stop_type.can_transition_to(StopLossType::Protective) {
                report.failures.push((
                    sibling.id.clone(),
                    StopEnforcementError::InvalidTransition {
                        position_id: sibling.id.to_string(),
                        from: sibling.stop_type,
                        to: StopLossType::Protective,
                    },
                ));
                continue;
            }

            match self
                .store
                .update_stop_loss(&sibling.id, new_stop, StopLossType::Protective)
                .await
            {
                Ok(()) => {
                    tracing::info!(
                        position_id = %sibling.id,
                        source = %source,
                        previous_stop = %sibling.stop_loss,
                        new_stop = %new_stop,
                        "Protective stop updated"
                    );
                    observability::record_protective_update(true);
                    self.listeners.emit(&StopEvent::ProtectiveUpdated {
                        position_id: sibling.id.clone(),
                        group_id: group_id.clone(),
                        source_position_id: source.clone(),
                        previous_stop: sibling.stop_loss,
                        new_stop,
                    });
                    report.updated.push(sibling.id);
                }
                Err(e) => {
                    tracing::warn!(
                        position_id = %sibling.id,
                        error = %e,
                        "Protective stop update failed"
                    );
                    observability::record_protective_update(false);
                    report
                        .failures
                        .push((sibling.id.clone(), store_error(sibling.id.as_str(), &e)));
                }
            }
        }
        Ok(report)
    }

    /// Allow `position_id` to trigger again after its exit failed.
    pub fn release_trigger(&self, position_id: &PositionId) -> bool {
        let released = self.ledger.release(position_id);
        if released {
            tracing::debug!(position_id = %position_id, "Trigger released");
        }
        released
    }

    /// Whether `position_id` has an outstanding trigger.
    #[must_use]
    pub fn is_triggered(&self, position_id: &PositionId) -> bool {
        self.ledger.contains(position_id)
    }

    /// Forget triggers of positions that are no longer active.
    ///
    /// # Errors
    ///
    /// Returns [`StopEnforcementError::Store`] if the active positions cannot
    /// be read.
    pub async fn prune_triggered(&self) -> Result<usize, StopEnforcementError> {
        let active: HashSet<PositionId> = self
            .store
            .get_all_active_positions()
            .await
            .map_err(|e| store_error("", &e))?
            .into_iter()
            .map(|p| p.id)
            .collect();
        let before = self.ledger.len();
        self.ledger.retain(|id| active.contains(id));
        Ok(before - self.ledger.len())
    }
}

fn store_error(position_id: &str, error: &StoreError) -> StopEnforcementError {
    match error {
        StoreError::NotFound { position_id } => StopEnforcementError::PositionNotFound {
            position_id: position_id.clone(),
        },
        other => StopEnforcementError::Store {
            position_id: position_id.to_string(),
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::stop_enforcement::{LotStopRule, OpeningRange, PositionDirection};
    use crate::infrastructure::persistence::InMemoryPositionStore;
    use crate::domain::exit_execution::ExitReason;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn lot(id: &str, index: u32, entry: Decimal, rule: &LotStopRule) -> PositionSnapshot {
        PositionSnapshot::open(
            PositionId::new(id),
            GroupId::new("g-1"),
            index,
            ProductCode::new("MXF"),
            PositionDirection::Long,
            entry,
            OpeningRange::new(entry + dec!(30), entry - dec!(50)),
            rule,
        )
    }

    fn service(
        positions: Vec<PositionSnapshot>,
    ) -> (
        Arc<InMemoryPositionStore>,
        PositionStopService<InMemoryPositionStore>,
    ) {
        let store = Arc::new(InMemoryPositionStore::with_positions(positions));
        let service = PositionStopService::new(Arc::clone(&store), ProductAliases::default());
        (store, service)
    }

    #[tokio::test]
    async fn drawdown_triggers_once_per_position() {
        let rule = LotStopRule::new(dec!(15), dec!(0.02));
        let (store, service) = service(vec![lot("p-1", 0, dec!(22450), &rule)]);
        let product = ProductCode::new("MXFK4");

        for price in [dec!(22470), dec!(22540), dec!(22432)] {
            assert!(service.on_price_tick(&product, price).await.unwrap().is_empty());
        }
        let stored = store.snapshot(&PositionId::new("p-1")).unwrap();
        assert!(stored.trailing_activated);
        assert_eq!(stored.peak_price, Some(dec!(22540)));
        assert_eq!(stored.stop_type, StopLossType::Trailing);

        let triggers = service.on_price_tick(&product, dec!(22032)).await.unwrap();
        assert_eq!(triggers.len(), 1);
        assert!(matches!(triggers[0], Trigger::Drawdown(_)));
        assert!(service.on_price_tick(&product, dec!(22032)).await.unwrap().is_empty());

        assert!(service.release_trigger(&PositionId::new("p-1")));
        assert_eq!(service.on_price_tick(&product, dec!(22032)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn ticks_for_other_products_are_ignored() {
        let rule = LotStopRule::new(dec!(15), dec!(0.2));
        let (_store, service) = service(vec![lot("p-1", 0, dec!(100), &rule)]);
        let triggers = service
            .on_price_tick(&ProductCode::new("TXF"), dec!(1))
            .await
            .unwrap();
        assert!(triggers.is_empty());
    }

    #[tokio::test]
    async fn events_reach_listeners() {
        let rule = LotStopRule::new(dec!(15), dec!(0.2));
        let (_store, service) = service(vec![lot("p-1", 0, dec!(100), &rule)]);
        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = Arc::clone(&seen);
            service.subscribe(move |event| seen.lock().unwrap().push(event.clone()));
        }
        let product = ProductCode::new("MXF");
        service.on_price_tick(&product, dec!(120)).await.unwrap();
        service.on_price_tick(&product, dec!(90)).await.unwrap();

        let seen = seen.lock().unwrap();
        assert!(matches!(seen[0], StopEvent::TrailingActivated { .. }));
        assert!(matches!(seen[1], StopEvent::Triggered(Trigger::Drawdown(_))));
    }

    #[tokio::test]
    async fn protective_stop_moves_sibling() {
        let first = LotStopRule::new(dec!(15), dec!(0.2));
        let later = LotStopRule::new(dec!(40), dec!(0.2)).with_protective_multiplier(dec!(2));
        let (store, service) = service(vec![
            lot("a", 0, dec!(22450), &first),
            lot("b", 1, dec!(22450), &later),
        ]);

        let report = service
            .propagate_protective_stops(&PositionId::new("a"), &GroupId::new("g-1"), dec!(30))
            .await
            .unwrap();

        assert_eq!(report.updated, vec![PositionId::new("b")]);
        assert!(report.skipped.is_empty());
        let b = store.snapshot(&PositionId::new("b")).unwrap();
        assert_eq!(b.stop_loss, dec!(22510));
        assert_eq!(b.stop_type, StopLossType::Protective);
        assert!(!b.is_initial_stop);
    }

    #[tokio::test]
    async fn protective_skips_trailing_and_tolerates_failures() {
        let later = LotStopRule::new(dec!(40), dec!(0.2)).with_protective_multiplier(dec!(2));
        let mut trailing = lot("b", 1, dec!(100), &later);
        trailing.trailing_activated = true;
        trailing.stop_type = StopLossType::Trailing;
        let (store, service) = service(vec![
            trailing,
            lot("c", 2, dec!(100), &later),
            lot("d", 3, dec!(100), &later),
        ]);
        store.fail_writes_for(&PositionId::new("c"));

        let report = service
            .propagate_protective_stops(&PositionId::new("a"), &GroupId::new("g-1"), dec!(10))
            .await
            .unwrap();

        assert_eq!(report.skipped, vec![PositionId::new("b")]);
        assert_eq!(report.updated, vec![PositionId::new("d")]);
        assert_eq!(report.failures.len(), 1);
        assert!(!report.is_complete());
        assert_eq!(store.snapshot(&PositionId::new("d")).unwrap().stop_loss, dec!(120));
    }

    #[tokio::test]
    async fn losing_exit_does_not_propagate() {
        let later = LotStopRule::new(dec!(40), dec!(0.2)).with_protective_multiplier(dec!(2));
        let (_store, service) = service(vec![lot("b", 1, dec!(100), &later)]);
        let report = service
            .propagate_protective_stops(&PositionId::new("a"), &GroupId::new("g-1"), dec!(-5))
            .await
            .unwrap();
        assert_eq!(report, ProtectiveReport::default());
    }

    #[tokio::test]
    async fn prune_drops_exited_positions() {
        let rule = LotStopRule::new(dec!(15), dec!(0.2));
        let (store, service) = service(vec![lot("p-1", 0, dec!(100), &rule)]);
        let product = ProductCode::new("MXF");
        assert_eq!(service.on_price_tick(&product, dec!(40)).await.unwrap().len(), 1);
        store
            .mark_exited(&PositionId::new("p-1"), dec!(40), dec!(-60), &"initial_stop".into())
            .await
            .unwrap();
        assert_eq!(service.prune_triggered().await.unwrap(), 1);
        assert!(!service.is_triggered(&PositionId::new("p-1")));
    }

    /// Store whose next bulk read returns its snapshot late.
    struct LaggingStore {
        inner: Arc<InMemoryPositionStore>,
        lag_next_read: AtomicBool,
    }

    #[async_trait]
    impl PositionStorePort for LaggingStore {
        async fn get_position(
            &self,
            id: &PositionId,
        ) -> Result<Option<PositionSnapshot>, StoreError> {
            self.inner.get_position(id).await
        }

        async fn get_active_positions(
            &self,
            group_id: &GroupId,
        ) -> Result<Vec<PositionSnapshot>, StoreError> {
            self.inner.get_active_positions(group_id).await
        }

        async fn get_all_active_positions(&self) -> Result<Vec<PositionSnapshot>, StoreError> {
            let positions = self.inner.get_all_active_positions().await?;
            if self.lag_next_read.swap(false, Ordering::SeqCst) {
                tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            }
            Ok(positions)
        }

        async fn update_stop_loss(
            &self,
            id: &PositionId,
            price: Decimal,
            stop_type: StopLossType,
        ) -> Result<(), StoreError> {
            self.inner.update_stop_loss(id, price, stop_type).await
        }

        async fn update_stop_type(
            &self,
            id: &PositionId,
            stop_type: StopLossType,
        ) -> Result<(), StoreError> {
            self.inner.update_stop_type(id, stop_type).await
        }

        async fn update_trailing(
            &self,
            id: &PositionId,
            activated: bool,
            peak: Option<Decimal>,
        ) -> Result<bool, StoreError> {
            self.inner.update_trailing(id, activated, peak).await
        }

        async fn mark_exited(
            &self,
            id: &PositionId,
            exit_price: Decimal,
            realized_pnl: Decimal,
            reason: &ExitReason,
        ) -> Result<(), StoreError> {
            self.inner
                .mark_exited(id, exit_price, realized_pnl, reason)
                .await
        }
    }

    fn lagging(
        positions: Vec<PositionSnapshot>,
    ) -> (
        Arc<InMemoryPositionStore>,
        Arc<LaggingStore>,
        PositionStopService<LaggingStore>,
    ) {
        let inner = Arc::new(InMemoryPositionStore::with_positions(positions));
        let store = Arc::new(LaggingStore {
            inner: Arc::clone(&inner),
            lag_next_read: AtomicBool::new(false),
        });
        let service = PositionStopService::new(Arc::clone(&store), ProductAliases::default());
        (inner, store, service)
    }

    #[tokio::test]
    async fn late_tick_from_older_snapshot_keeps_the_peak() {
        let rule = LotStopRule::new(dec!(15), dec!(0.02));
        let (inner, store, service) = lagging(vec![lot("p-1", 0, dec!(22450), &rule)]);
        let product = ProductCode::new("MXF");
        service.on_price_tick(&product, dec!(22470)).await.unwrap();

        store.lag_next_read.store(true, Ordering::SeqCst);
        let slow = service.on_price_tick(&product, dec!(22500));
        let fast = async {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            let triggers = service.on_price_tick(&product, dec!(22540)).await;
            let peak = inner.snapshot(&PositionId::new("p-1")).unwrap().peak_price;
            (triggers, peak)
        };
        let (slow, (fast, peak_after_fast)) = tokio::join!(slow, fast);
        assert!(slow.unwrap().is_empty());
        assert!(fast.unwrap().is_empty());

        assert_eq!(peak_after_fast, Some(dec!(22540)));
        let stored = inner.snapshot(&PositionId::new("p-1")).unwrap();
        assert_eq!(stored.peak_price, Some(dec!(22540)));
    }

    #[tokio::test]
    async fn late_activation_keeps_a_newer_stop_price() {
        let rule = LotStopRule::new(dec!(15), dec!(0.02));
        let (inner, store, service) = lagging(vec![lot("p-1", 0, dec!(22450), &rule)]);
        let activations = Arc::new(Mutex::new(0));
        {
            let activations = Arc::clone(&activations);
            service.subscribe(move |event| {
                if matches!(event, StopEvent::TrailingActivated { .. }) {
                    *activations.lock().unwrap() += 1;
                }
            });
        }
        let product = ProductCode::new("MXF");
        let id = PositionId::new("p-1");

        store.lag_next_read.store(true, Ordering::SeqCst);
        let slow = service.on_price_tick(&product, dec!(22470));
        let fast = async {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            inner
                .update_stop_loss(&id, dec!(22460), StopLossType::Protective)
                .await
                .unwrap();
            service.on_price_tick(&product, dec!(22475)).await
        };
        let (slow, fast) = tokio::join!(slow, fast);
        assert!(slow.unwrap().is_empty());
        assert!(fast.unwrap().is_empty());

        let stored = inner.snapshot(&id).unwrap();
        assert!(stored.trailing_activated);
        assert_eq!(stored.peak_price, Some(dec!(22475)));
        assert_eq!(stored.stop_loss, dec!(22460));
        assert_eq!(stored.stop_type, StopLossType::Trailing);
        assert_eq!(*activations.lock().unwrap(), 1);
    }
}
