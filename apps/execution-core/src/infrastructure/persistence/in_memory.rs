//! In-memory position store.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::RwLock;
use rust_decimal::Decimal;

use crate::application::ports::{PositionStorePort, StoreError};
use crate::domain::exit_execution::ExitReason;
use crate::domain::shared::{GroupId, PositionId};
use crate::domain::stop_enforcement::{PositionSnapshot, PositionStatus, StopLossType};

/// In-memory implementation of `PositionStorePort`.
///
/// Every call works on a copy, so callers always see a fresh snapshot.
/// Writes can be made to fail per position for exercising error paths.
#[derive(Debug, Default)]
pub struct InMemoryPositionStore {
    positions: RwLock<HashMap<PositionId, PositionSnapshot>>,
    failing_writes: RwLock<HashSet<PositionId>>,
}

impl InMemoryPositionStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `positions`.
    #[must_use]
    pub fn with_positions(positions: impl IntoIterator<Item = PositionSnapshot>) -> Self {
        let store = Self::new();
        for position in positions {
            store.insert(position);
        }
        store
    }

    /// Add or replace a position.
    pub fn insert(&self, position: PositionSnapshot) {
        self.positions.write().insert(position.id.clone(), position);
    }

    /// Copy of one position regardless of status.
    #[must_use]
    pub fn snapshot(&self, id: &PositionId) -> Option<PositionSnapshot> {
        self.positions.read().get(id).cloned()
    }

    /// Number of stored positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.read().len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.read().is_empty()
    }

    /// Make every write to `id` fail.
    pub fn fail_writes_for(&self, id: &PositionId) {
        self.failing_writes.write().insert(id.clone());
    }

    /// Let writes succeed again.
    pub fn clear_failures(&self) {
        self.failing_writes.write().clear();
    }

    fn write<T>(
        &self,
        id: &PositionId,
        apply: impl FnOnce(&mut PositionSnapshot) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        if self.failing_writes.read().contains(id) {
            return Err(StoreError::WriteRejected {
                message: format!("injected failure for {id}"),
            });
        }
        let mut positions = self.positions.write();
        let position = positions.get_mut(id).ok_or_else(|| StoreError::NotFound {
            position_id: id.to_string(),
        })?;
        apply(position)
    }

    fn active(&self, filter: impl Fn(&PositionSnapshot) -> bool) -> Vec<PositionSnapshot> {
        let mut active: Vec<PositionSnapshot> = self
            .positions
            .read()
            .values()
            .filter(|p| p.is_active() && filter(p))
            .cloned()
            .collect();
        active.sort_by(|a, b| {
            (a.group_id.as_str(), a.lot_index).cmp(&(b.group_id.as_str(), b.lot_index))
        });
        active
    }
}

#[async_trait]
impl PositionStorePort for InMemoryPositionStore {
    async fn get_position(&self, id: &PositionId) -> Result<Option<PositionSnapshot>, StoreError> {
        Ok(self.snapshot(id))
    }

    async fn get_active_positions(
        &self,
        group_id: &GroupId,
    ) -> Result<Vec<PositionSnapshot>, StoreError> {
        Ok(self.active(|p| &p.group_id == group_id))
    }

    async fn get_all_active_positions(&self) -> Result<Vec<PositionSnapshot>, StoreError> {
        Ok(self.active(|_| true))
    }

    async fn update_stop_loss(
        &self,
        id: &PositionId,
        price: Decimal,
        stop_type: StopLossType,
    ) -> Result<(), StoreError> {
        self.write(id, |p| {
            p.stop_loss = price;
            p.stop_type = stop_type;
            p.is_initial_stop = stop_type == StopLossType::Initial;
            Ok(())
        })
    }

    async fn update_stop_type(
        &self,
        id: &PositionId,
        stop_type: StopLossType,
    ) -> Result<(), StoreError> {
        self.write(id, |p| {
            p.stop_type = stop_type;
            p.is_initial_stop = stop_type == StopLossType::Initial;
            Ok(())
        })
    }

    async fn update_trailing(
        &self,
        id: &PositionId,
        activated: bool,
        peak: Option<Decimal>,
    ) -> Result<bool, StoreError> {
        self.write(id, |p| {
            let switched_on = activated && !p.trailing_activated;
            let direction = p.direction;
            p.peak_price = match (activated, p.peak_price, peak) {
                (true, Some(stored), Some(new)) => Some(direction.better(stored, new)),
                (true, stored, None) => stored,
                (_, _, new) => new,
            };
            p.trailing_activated = activated;
            if activated {
                p.is_initial_stop = false;
            }
            Ok(switched_on)
        })
    }

    async fn mark_exited(
        &self,
        id: &PositionId,
        exit_price: Decimal,
        realized_pnl: Decimal,
        _reason: &ExitReason,
    ) -> Result<(), StoreError> {
        self.write(id, |p| {
            if p.status == PositionStatus::Exited {
                return Err(StoreError::WriteRejected {
                    message: format!("{id} already exited"),
                });
            }
            p.status = PositionStatus::Exited;
            p.exit_price = Some(exit_price);
            p.realized_pnl = Some(realized_pnl);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::ProductCode;
    use crate::domain::stop_enforcement::{LotStopRule, OpeningRange, PositionDirection};
    use rust_decimal_macros::dec;

    fn position(id: &str, group: &str, index: u32) -> PositionSnapshot {
        PositionSnapshot::open(
            PositionId::new(id),
            GroupId::new(group),
            index,
            ProductCode::new("MXF"),
            PositionDirection::Long,
            dec!(100),
            OpeningRange::new(dec!(110), dec!(90)),
            &LotStopRule::new(dec!(15), dec!(0.2)),
        )
    }

    #[tokio::test]
    async fn active_reads_exclude_exited() {
        let store = InMemoryPositionStore::with_positions([
            position("b", "g-1", 1),
            position("a", "g-1", 0),
            position("c", "g-2", 0),
        ]);
        store
            .mark_exited(&PositionId::new("c"), dec!(95), dec!(-5), &ExitReason::Manual)
            .await
            .unwrap();

        let group = store.get_active_positions(&GroupId::new("g-1")).await.unwrap();
        assert_eq!(group.len(), 2);
        assert_eq!(group[0].id.as_str(), "a");
        assert_eq!(store.get_all_active_positions().await.unwrap().len(), 2);

        let exited = store.get_position(&PositionId::new("c")).await.unwrap().unwrap();
        assert_eq!(exited.status, PositionStatus::Exited);
        assert_eq!(exited.realized_pnl, Some(dec!(-5)));
    }

    #[tokio::test]
    async fn second_exit_is_rejected() {
        let store = InMemoryPositionStore::with_positions([position("a", "g-1", 0)]);
        let id = PositionId::new("a");
        store.mark_exited(&id, dec!(110), dec!(10), &ExitReason::Manual).await.unwrap();
        assert!(store.mark_exited(&id, dec!(110), dec!(10), &ExitReason::Manual).await.is_err());
    }

    #[tokio::test]
    async fn injected_failures_and_missing_positions() {
        let store = InMemoryPositionStore::with_positions([position("a", "g-1", 0)]);
        let id = PositionId::new("a");
        store.fail_writes_for(&id);
        assert!(matches!(
            store.update_stop_loss(&id, dec!(1), StopLossType::Protective).await,
            Err(StoreError::WriteRejected { .. })
        ));
        store.clear_failures();
        store
            .update_stop_loss(&id, dec!(120), StopLossType::Protective)
            .await
            .unwrap();
        let a = store.snapshot(&id).unwrap();
        assert_eq!(a.stop_loss, dec!(120));
        assert!(!a.is_initial_stop);

        assert!(matches!(
            store.update_trailing(&PositionId::new("zz"), true, None).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn trailing_peak_only_ratchets_forward() {
        let store = InMemoryPositionStore::with_positions([position("a", "g-1", 0)]);
        let id = PositionId::new("a");

        assert!(store.update_trailing(&id, true, Some(dec!(120))).await.unwrap());
        assert!(!store.update_trailing(&id, true, Some(dec!(130))).await.unwrap());
        // A write computed from an older snapshot lands late.
        assert!(!store.update_trailing(&id, true, Some(dec!(125))).await.unwrap());

        let a = store.snapshot(&id).unwrap();
        assert!(a.trailing_activated);
        assert_eq!(a.peak_price, Some(dec!(130)));
        assert!(!a.is_initial_stop);
    }

    #[tokio::test]
    async fn stop_type_update_keeps_the_stop_price() {
        let store = InMemoryPositionStore::with_positions([position("a", "g-1", 0)]);
        let id = PositionId::new("a");
        store
            .update_stop_loss(&id, dec!(104), StopLossType::Protective)
            .await
            .unwrap();
        store
            .update_stop_type(&id, StopLossType::Trailing)
            .await
            .unwrap();

        let a = store.snapshot(&id).unwrap();
        assert_eq!(a.stop_loss, dec!(104));
        assert_eq!(a.stop_type, StopLossType::Trailing);
    }
}
