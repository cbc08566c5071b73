//! Positions that already produced a trigger.

use parking_lot::Mutex;
use std::collections::HashSet;

use crate::domain::shared::PositionId;

/// Set of position IDs whose trigger has been handed out.
///
/// Drawdown and stop-loss triggers share one entry per position, so a tick
/// that satisfies both yields a single trigger.
#[derive(Debug, Default)]
pub struct TriggerLedger {
    triggered: Mutex<HashSet<PositionId>>,
}

impl TriggerLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `position_id`. Returns `false` if it was already recorded.
    pub fn try_mark(&self, position_id: &PositionId) -> bool {
        self.triggered.lock().insert(position_id.clone())
    }

    /// Forget `position_id` so a later tick may trigger it again.
    pub fn release(&self, position_id: &PositionId) -> bool {
        self.triggered.lock().remove(position_id)
    }

    /// Whether `position_id` has triggered.
    #[must_use]
    pub fn contains(&self, position_id: &PositionId) -> bool {
        self.triggered.lock().contains(position_id)
    }

    /// Number of recorded positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.triggered.lock().len()
    }

    /// Whether the ledger is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triggered.lock().is_empty()
    }

    /// Drop entries for positions no longer being evaluated.
    pub fn retain(&self, keep: impl Fn(&PositionId) -> bool) {
        self.triggered.lock().retain(|id| keep(id));
    }
}
